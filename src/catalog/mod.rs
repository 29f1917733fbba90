use crate::collision::CollisionWorld;
use crate::error::LevelError;
use crate::level::LevelData;
use log::info;
use std::sync::Arc;

pub mod cubemaps;
pub mod lights;
pub mod probes;

pub use cubemaps::CubemapCatalog;
pub use lights::LightCatalog;
pub use probes::ProbeCatalog;

/// Everything built from one loaded level. Torn down as a unit.
pub struct LevelCatalog {
    pub lights: LightCatalog,
    pub probes: ProbeCatalog,
    pub cubemaps: CubemapCatalog,
    pub collision: Arc<dyn CollisionWorld>,
    /// World units per level unit
    pub unit_scale: f32,
}

impl LevelCatalog {
    pub fn build(level: &dyn LevelData, collision: Arc<dyn CollisionWorld>) -> Result<Self, LevelError> {
        let lights = LightCatalog::build(level, collision.as_ref());
        let probes = ProbeCatalog::build(level)?;
        let cubemaps = CubemapCatalog::build(level, collision.as_ref());

        info!(
            "Level catalog ready: {} lights, {} probes, {} cubemaps, {} leaves",
            lights.all.len(),
            probes.all.len(),
            cubemaps.all.len(),
            level.leaf_count()
        );

        Ok(Self {
            lights,
            probes,
            cubemaps,
            collision,
            unit_scale: level.unit_scale(),
        })
    }
}
