use crate::collision::geometry::{ConvexBrush, CONTENTS_SKY};
use crate::collision::TraceOutcome;
use crate::math::{dot, sub, Vec3, AABB};
use log::trace;

const EPSILON: f32 = 0.001;

/// Traces the segment `start -> end` against every brush whose contents match `mask`
/// and reports what the closest hit was made of.
pub fn trace_line(start: Vec3, end: Vec3, mask: u32, brushes: &[ConvexBrush]) -> TraceOutcome {
    let diff = sub(end, start);
    let dist = dot(diff, diff).sqrt();

    // Degenerate segment, nothing in between
    if dist < EPSILON {
        return TraceOutcome::Clear;
    }

    let dir = [diff[0] / dist, diff[1] / dist, diff[2] / dist];
    let mut closest: Option<(f32, &ConvexBrush)> = None;

    for brush in brushes.iter() {
        if brush.contents & mask == 0 {
            continue;
        }
        let max_t = closest.map(|(t, _)| t).unwrap_or(dist);
        if !ray_aabb_intersect(start, dir, max_t, &brush.bounds) {
            continue;
        }
        if brush.planes.iter().any(|p| p.material.to_lowercase().contains("glass")) {
            continue;
        }
        if let Some(t) = intersect_brush(start, dir, max_t, brush) {
            trace!("ray {:?} -> {:?} hits brush #{} at t={:.3}", start, end, brush.id, t);
            closest = Some((t, brush));
        }
    }

    match closest {
        None => TraceOutcome::Clear,
        Some((_, brush)) if brush.contents & CONTENTS_SKY != 0 => TraceOutcome::Sky,
        Some(_) => TraceOutcome::Solid,
    }
}

fn ray_aabb_intersect(origin: Vec3, dir: Vec3, max_dist: f32, aabb: &AABB) -> bool {
    let mut tmin = 0.0_f32;
    let mut tmax = max_dist;
    for i in 0..3 {
        if dir[i].abs() < 1e-6 {
            if origin[i] < aabb.min[i] - EPSILON || origin[i] > aabb.max[i] + EPSILON { return false; }
        } else {
            let ood = 1.0 / dir[i];
            let mut t1 = (aabb.min[i] - origin[i]) * ood;
            let mut t2 = (aabb.max[i] - origin[i]) * ood;
            if t1 > t2 { std::mem::swap(&mut t1, &mut t2); }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax { return false; }
        }
    }
    true
}

/// Slab test against the brush planes. Returns the entry distance along the ray.
fn intersect_brush(origin: Vec3, dir: Vec3, max_dist: f32, brush: &ConvexBrush) -> Option<f32> {
    let mut t_near = f32::MIN;
    let mut t_far = max_dist;

    for plane in brush.planes.iter() {
        let numer = -(dot(plane.normal, origin) + plane.dist);
        let denom = dot(plane.normal, dir);

        if denom.abs() < 1e-6 {
            if numer < 0.0 { return None; }
        } else {
            let t = numer / denom;
            if denom < 0.0 {
                if t > t_near { t_near = t; }
            } else if t < t_far { t_far = t; }
            if t_near > t_far || t_far < 0.0 { return None; }
        }
    }

    // The exit point must be in front of the ray start
    if t_near < t_far - EPSILON && t_far > EPSILON && t_near < max_dist {
        return Some(t_near.max(0.0));
    }
    None
}
