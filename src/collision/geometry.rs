use crate::collision::utils;
use crate::math::{dot, mul, Vec3, AABB};
use log::{debug, warn};
use vmf_forge::prelude::Solid;

pub const CONTENTS_SOLID: u32 = 0x1;
pub const CONTENTS_SKY: u32 = 0x2;
pub const MASK_ALL: u32 = CONTENTS_SOLID | CONTENTS_SKY;

const SKY_MATERIAL: &str = "toolsskybox";

#[derive(Debug, Clone)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
    pub material: String,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f32) -> Self {
        Self {
            normal,
            dist,
            material: String::from("default"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConvexBrush {
    pub id: u64,
    pub planes: Vec<Plane>,
    pub bounds: AABB,
    pub contents: u32,
}

impl ConvexBrush {
    /// Converts a VMF Solid into a ConvexBrush scaled into world units.
    /// Brushes with any skybox face are sky, everything else is solid.
    pub fn from_vmf_solid(solid: &Solid, unit_scale: f32) -> Option<Self> {
        let mut planes = Vec::with_capacity(solid.sides.len());
        let mut aabb = AABB::new();
        let mut contents = CONTENTS_SOLID;

        // Displacements are rendered geometry, not collision volumes
        if solid.sides.iter().any(|s| s.dispinfo.is_some()) {
            return None;
        }

        for side in &solid.sides {
            let points = match utils::parse_plane_points(&side.plane) {
                Some(pts) => pts.map(|p| mul(p, unit_scale)),
                None => {
                    warn!("Solid ID {}: malformed plane '{}'", solid.id, side.plane);
                    continue;
                }
            };

            // Plane points sit on brush corners in VMF, close enough for bounds
            for p in points {
                aabb.extend(p);
            }

            let n = mul(utils::calc_face_normal(points), -1.0);
            let d = -dot(n, points[0]);

            if side.material.to_lowercase().contains(SKY_MATERIAL) {
                contents = CONTENTS_SKY;
            }

            planes.push(Plane {
                normal: n,
                dist: d,
                material: side.material.clone(),
            });
        }

        if planes.is_empty() {
            warn!("Solid ID {} was skipped because it contains no valid planes.", solid.id);
            return None;
        }

        debug!("Created ConvexBrush for solid ID {} with {} planes (contents {:#x})", solid.id, planes.len(), contents);
        Some(ConvexBrush {
            id: solid.id,
            planes,
            bounds: aabb,
            contents,
        })
    }

    /// Axis-aligned box brush, outward normals.
    pub fn from_box(id: u64, min: Vec3, max: Vec3, contents: u32) -> Self {
        let planes = vec![
            Plane::new([1.0, 0.0, 0.0], -max[0]),
            Plane::new([-1.0, 0.0, 0.0], min[0]),
            Plane::new([0.0, 1.0, 0.0], -max[1]),
            Plane::new([0.0, -1.0, 0.0], min[1]),
            Plane::new([0.0, 0.0, 1.0], -max[2]),
            Plane::new([0.0, 0.0, -1.0], min[2]),
        ];
        ConvexBrush {
            id,
            planes,
            bounds: AABB::from_min_max(min, max),
            contents,
        }
    }
}
