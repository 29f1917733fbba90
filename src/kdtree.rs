use crate::math::{dist_sq, Vec3};

const NO_CHILD: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct KdNode {
    point: Vec3,
    /// Index of the point in the build order
    index: u32,
    axis: u8,
    left: u32,
    right: u32,
}

/// Balanced 3-D k-d tree over a fixed point set.
/// Built once, queried for the nearest stored point. There is no insert/remove:
/// rebuild when the source catalog changes.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: Option<u32>,
}

impl KdTree {
    /// Builds the tree with median splits on the widest axis of each subset.
    pub fn build(points: &[Vec3]) -> Self {
        let mut order: Vec<u32> = (0..points.len() as u32).collect();
        let mut tree = KdTree {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        tree.root = tree.build_recursive(points, &mut order);
        tree
    }

    fn build_recursive(&mut self, points: &[Vec3], subset: &mut [u32]) -> Option<u32> {
        if subset.is_empty() {
            return None;
        }

        let axis = widest_axis(points, subset);
        let mid = subset.len() / 2;
        subset.select_nth_unstable_by(mid, |&a, &b| {
            points[a as usize][axis].total_cmp(&points[b as usize][axis])
        });

        let index = subset[mid];
        let node_id = self.nodes.len() as u32;
        self.nodes.push(KdNode {
            point: points[index as usize],
            index,
            axis: axis as u8,
            left: NO_CHILD,
            right: NO_CHILD,
        });

        let (lower, rest) = subset.split_at_mut(mid);
        let upper = &mut rest[1..];
        let left = self.build_recursive(points, lower);
        let right = self.build_recursive(points, upper);

        let node = &mut self.nodes[node_id as usize];
        node.left = left.unwrap_or(NO_CHILD);
        node.right = right.unwrap_or(NO_CHILD);
        Some(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index (in build order) of the stored point closest to `target`.
    /// Ties resolve to whichever equidistant point is reached first.
    pub fn nearest(&self, target: Vec3) -> Option<usize> {
        let root = self.root?;
        let mut best = (u32::MAX, f32::INFINITY);
        self.nearest_recursive(root, target, &mut best);
        Some(best.0 as usize)
    }

    fn nearest_recursive(&self, node_id: u32, target: Vec3, best: &mut (u32, f32)) {
        let node = &self.nodes[node_id as usize];

        let d = dist_sq(node.point, target);
        if d < best.1 {
            *best = (node.index, d);
        }

        let axis = node.axis as usize;
        let diff = target[axis] - node.point[axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if near != NO_CHILD {
            self.nearest_recursive(near, target, best);
        }
        // Only cross the splitting plane if it is closer than the current best
        if far != NO_CHILD && diff * diff < best.1 {
            self.nearest_recursive(far, target, best);
        }
    }
}

fn widest_axis(points: &[Vec3], subset: &[u32]) -> usize {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for &i in subset {
        let p = points[i as usize];
        for a in 0..3 {
            min[a] = min[a].min(p[a]);
            max[a] = max[a].max(p[a]);
        }
    }

    let extent = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    if extent[0] >= extent[1] && extent[0] >= extent[2] {
        0
    } else if extent[1] >= extent[2] {
        1
    } else {
        2
    }
}
