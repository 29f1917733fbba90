use crate::collision::CollisionWorld;
use crate::kdtree::KdTree;
use crate::level::LevelData;
use crate::math::Vec3;
use crate::parser;
use crate::types::{Light, LightType};
use log::{info, warn};
use std::sync::Arc;

/// Every light of a level, the sun kept aside, plus the per-leaf PVS lists.
#[derive(Debug, Default)]
pub struct LightCatalog {
    /// All lights in entity order, the sun included
    pub all: Vec<Arc<Light>>,
    /// Index of the sun in `all`
    pub sun: Option<usize>,
    /// Indices into `all` for every non-sun light, in tree build order
    indexed: Vec<usize>,
    tree: KdTree,
    /// leaf -> indices into `all` of lights potentially visible from that leaf
    pvs: Vec<Vec<usize>>,
}

impl LightCatalog {
    pub fn build(level: &dyn LevelData, collision: &dyn CollisionWorld) -> Self {
        let parsed = parser::extract_lights(level.entities(), level.unit_scale());

        let mut catalog = LightCatalog::default();
        let mut points = Vec::new();

        for p in parsed {
            let leaf = collision.find_leaf(p.pos);
            let light = Light::new(p.id, p.light_type, p.pos, p.direction, p.color, p.falloff, leaf);
            let idx = catalog.all.len();

            if light.light_type == LightType::Directional {
                if let Some(prev) = catalog.sun {
                    warn!("Multiple light_environment entities, #{} replaces #{}", light.id, catalog.all[prev].id);
                }
                // Never in the k-d tree or the PVS lists
                catalog.sun = Some(idx);
            } else {
                points.push(light.pos);
                catalog.indexed.push(idx);
            }
            catalog.all.push(Arc::new(light));
        }

        catalog.tree = KdTree::build(&points);
        catalog.build_pvs(level);

        info!(
            "Light catalog: {} lights ({} local, sun: {})",
            catalog.all.len(),
            catalog.indexed.len(),
            catalog.sun.is_some()
        );
        catalog
    }

    /// For every leaf, collects the lights whose own leaf is visible from it.
    fn build_pvs(&mut self, level: &dyn LevelData) {
        let leaf_count = level.leaf_count();
        self.pvs = vec![Vec::new(); leaf_count];

        for (leaf, list) in self.pvs.iter_mut().enumerate() {
            for &idx in &self.indexed {
                if level.is_leaf_visible(self.all[idx].leaf, leaf) {
                    list.push(idx);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn sun(&self) -> Option<&Arc<Light>> {
        self.sun.map(|i| &self.all[i])
    }

    /// Lights potentially visible from `leaf`. Unknown leaves see nothing.
    pub fn pvs(&self, leaf: usize) -> &[usize] {
        self.pvs.get(leaf).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Closest non-sun light to `pos`, as an index into `all`.
    pub fn nearest_light(&self, pos: Vec3) -> Option<usize> {
        self.tree.nearest(pos).map(|i| self.indexed[i])
    }
}
