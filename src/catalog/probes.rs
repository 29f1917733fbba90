use crate::error::LevelError;
use crate::kdtree::KdTree;
use crate::level::LevelData;
use crate::math::{mul, remap_val_clamped, Vec3};
use crate::types::AmbientProbe;
use log::info;
use std::sync::Arc;

/// Baked ambient cubes, grouped per leaf and flattened in one global order.
#[derive(Debug, Default)]
pub struct ProbeCatalog {
    /// Global sequence; the k-d tree indexes into this
    pub all: Vec<Arc<AmbientProbe>>,
    /// leaf -> indices into `all`, for per-leaf listings
    pub by_leaf: Vec<Vec<usize>>,
    tree: KdTree,
}

impl ProbeCatalog {
    pub fn build(level: &dyn LevelData) -> Result<Self, LevelError> {
        let index = level.leaf_ambient_index();
        let samples = level.ambient_samples();
        let scale = level.unit_scale();

        if index.len() > level.leaf_count() {
            return Err(LevelError::AmbientIndexLength {
                index_len: index.len(),
                leaf_count: level.leaf_count(),
            });
        }

        let mut catalog = ProbeCatalog {
            by_leaf: vec![Vec::new(); level.leaf_count()],
            ..Default::default()
        };

        for (leaf, amb) in index.iter().enumerate() {
            let first = amb.first_ambient_sample as usize;
            let end = first + amb.num_ambient_samples as usize;
            if end > samples.len() {
                return Err(LevelError::AmbientRange {
                    leaf,
                    first,
                    end,
                    available: samples.len(),
                });
            }
            let Some(bounds) = level.leaf_bounds(leaf) else {
                continue;
            };

            for rec in &samples[first..end] {
                let q = [rec.x, rec.y, rec.z];
                let mut pos = [0.0; 3];
                for axis in 0..3 {
                    pos[axis] = remap_val_clamped(
                        q[axis] as f32,
                        0.0,
                        255.0,
                        bounds.min[axis],
                        bounds.max[axis],
                    );
                }

                let probe = AmbientProbe {
                    leaf,
                    pos: mul(pos, scale),
                    cube: rec.cube.map(|c| c.to_linear()),
                };
                catalog.by_leaf[leaf].push(catalog.all.len());
                catalog.all.push(Arc::new(probe));
            }
        }

        let points: Vec<Vec3> = catalog.all.iter().map(|p| p.pos).collect();
        catalog.tree = KdTree::build(&points);

        info!("Ambient probe catalog: {} probes in {} leaves", catalog.all.len(), index.len());
        Ok(catalog)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn nearest(&self, pos: Vec3) -> Option<&Arc<AmbientProbe>> {
        self.tree.nearest(pos).map(|i| &self.all[i])
    }

    pub fn in_leaf(&self, leaf: usize) -> impl Iterator<Item = &Arc<AmbientProbe>> {
        self.by_leaf
            .get(leaf)
            .into_iter()
            .flatten()
            .map(|&i| &self.all[i])
    }
}
