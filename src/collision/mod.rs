use geometry::ConvexBrush;
use log::{debug, info};
use vmf_forge::prelude::VmfFile;
use crate::level::LevelData;
use crate::math::{Vec3, AABB};

pub mod geometry;
pub mod tracer;
pub mod utils;

pub use geometry::{CONTENTS_SKY, CONTENTS_SOLID, MASK_ALL};

/// What stopped a traced segment, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    Clear,
    Solid,
    Sky,
}

/// Ray and point queries against the level's collision data. World units throughout.
pub trait CollisionWorld: Send + Sync {
    /// Traces `start -> end`, only considering contents in `mask`.
    fn trace_line(&self, start: Vec3, end: Vec3, mask: u32) -> TraceOutcome;
    /// Visibility leaf containing `pos`; 0 when outside every leaf.
    fn find_leaf(&self, pos: Vec3) -> usize;
}

/// Collision world made of convex brushes, with leaves looked up by their bounds.
#[derive(Debug, Clone, Default)]
pub struct BrushWorld {
    pub brushes: Vec<ConvexBrush>,
    /// World-space leaf bounds, indexed by leaf number
    pub leaf_bounds: Vec<AABB>,
}

impl BrushWorld {
    pub fn new(brushes: Vec<ConvexBrush>, leaf_bounds: Vec<AABB>) -> Self {
        Self { brushes, leaf_bounds }
    }

    /// Builds the world from VMF worldspawn solids and func_detail,
    /// with leaf bounds taken from the compiled level.
    pub fn from_vmf(vmf: &VmfFile, level: &dyn LevelData) -> Self {
        debug!("Building collision world...");
        let scale = level.unit_scale();
        let mut brushes = Vec::new();

        for solid in &vmf.world.solids {
            if let Some(brush) = ConvexBrush::from_vmf_solid(solid, scale) {
                brushes.push(brush);
            }
        }

        for ent in vmf.entities.iter() {
            if ent.classname().unwrap_or("") != "func_detail" {
                continue;
            }
            if let Some(solids) = &ent.solids {
                for solid in solids {
                    if let Some(brush) = ConvexBrush::from_vmf_solid(solid, scale) {
                        brushes.push(brush);
                    }
                }
            }
        }

        let leaf_bounds = (0..level.leaf_count())
            .map(|leaf| {
                level
                    .leaf_bounds(leaf)
                    .map(|b| b.scaled(scale))
                    .unwrap_or_default()
            })
            .collect();

        info!("Built collision world with {} brushes.", brushes.len());
        Self::new(brushes, leaf_bounds)
    }
}

impl CollisionWorld for BrushWorld {
    fn trace_line(&self, start: Vec3, end: Vec3, mask: u32) -> TraceOutcome {
        tracer::trace_line(start, end, mask, &self.brushes)
    }

    fn find_leaf(&self, pos: Vec3) -> usize {
        // Leaf 0 is the outside leaf and never claims a point
        self.leaf_bounds
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, b)| b.contains(pos))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}
