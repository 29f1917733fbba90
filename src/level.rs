use crate::codec::{
    self, AmbientSampleRecord, ColorRgbExp32, CubemapRecord, LeafAmbientIndex,
};
use crate::error::LevelError;
use crate::math::AABB;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vmf_forge::prelude::Entity;

/// Level units per world unit is 16; positions are multiplied by this on load.
pub const DEFAULT_UNIT_SCALE: f32 = 1.0 / 16.0;

/// What the lighting subsystem needs from a loaded level.
/// Leaf bounds and baked positions are in level units.
pub trait LevelData {
    fn entities(&self) -> &[Entity];
    fn unit_scale(&self) -> f32;
    /// Number of visibility leaves + 1 (leaf 0 is the outside/solid leaf).
    fn leaf_count(&self) -> usize;
    fn leaf_bounds(&self, leaf: usize) -> Option<AABB>;
    /// Whether leaf `to` is in the potentially visible set of leaf `from`.
    fn is_leaf_visible(&self, from: usize, to: usize) -> bool;
    fn leaf_ambient_index(&self) -> &[LeafAmbientIndex];
    fn ambient_samples(&self) -> &[AmbientSampleRecord];
    fn cubemaps(&self) -> &[CubemapRecord];
    fn cubemap_data(&self) -> &[ColorRgbExp32];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BakedLeaf {
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    /// -1 for leaves outside the visibility system
    pub cluster: i32,
}

/// Compiled level data held in memory. Entities come from the map source,
/// everything else is the baked sidecar (JSON) or raw lumps.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BakedLevel {
    #[serde(skip)]
    pub entities: Vec<Entity>,
    #[serde(default = "default_unit_scale")]
    pub unit_scale: f32,
    pub leaves: Vec<BakedLeaf>,
    /// Uncompressed PVS: one bit row per cluster. Empty means "everything visible".
    #[serde(default)]
    pub visibility: Vec<Vec<u8>>,
    #[serde(default)]
    pub leaf_ambient_index: Vec<LeafAmbientIndex>,
    #[serde(default)]
    pub ambient_samples: Vec<AmbientSampleRecord>,
    #[serde(default)]
    pub cubemaps: Vec<CubemapRecord>,
    #[serde(default)]
    pub cubemap_data: Vec<ColorRgbExp32>,
}

fn default_unit_scale() -> f32 {
    DEFAULT_UNIT_SCALE
}

impl BakedLevel {
    pub fn new(leaves: Vec<BakedLeaf>) -> Self {
        Self {
            unit_scale: DEFAULT_UNIT_SCALE,
            leaves,
            ..Default::default()
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.leaves
            .iter()
            .map(|l| if l.cluster >= 0 { (l.cluster + 1) as usize } else { 0 })
            .max()
            .unwrap_or(0)
    }

    /// Marks cluster `to` visible from cluster `from`, growing the PVS rows as needed.
    pub fn set_cluster_visible(&mut self, from: usize, to: usize) {
        let row_bytes = self.num_clusters().div_ceil(8).max(to / 8 + 1);
        if self.visibility.len() <= from {
            self.visibility.resize(from + 1, Vec::new());
        }
        for row in self.visibility.iter_mut() {
            if row.len() < row_bytes {
                row.resize(row_bytes, 0);
            }
        }
        self.visibility[from][to >> 3] |= 1 << (to & 7);
    }

    fn is_cluster_visible(&self, from: i32, to: i32) -> bool {
        if from < 0 || to < 0 {
            return false;
        }
        if self.visibility.is_empty() {
            // no vis info, everything is visible
            return true;
        }
        let (from, to) = (from as usize, to as usize);
        self.visibility
            .get(from)
            .and_then(|row| row.get(to >> 3))
            .is_some_and(|byte| byte & (1 << (to & 7)) != 0)
    }

    /// Replaces the baked arrays with the contents of raw lump files found in `dir`.
    /// Missing files leave the corresponding array untouched.
    pub fn load_lumps(&mut self, dir: &Path) -> Result<(), LevelError> {
        let read = |name: &str| -> Result<Option<Vec<u8>>, LevelError> {
            let path = dir.join(name);
            if !path.exists() {
                return Ok(None);
            }
            Ok(Some(std::fs::read(path)?))
        };

        if let Some(bytes) = read("leaf_ambient_index.lmp")? {
            self.leaf_ambient_index = codec::decode_leaf_ambient_index_lump(&bytes)?;
        }
        if let Some(bytes) = read("leaf_ambient_lighting.lmp")? {
            self.ambient_samples = codec::decode_ambient_lighting_lump(&bytes)?;
        }
        if let Some(bytes) = read("cubemaps.lmp")? {
            self.cubemaps = codec::decode_cubemap_lump(&bytes)?;
        }
        if let Some(bytes) = read("cubemap_data.lmp")? {
            self.cubemap_data = codec::decode_rgbexp32_lump(&bytes)?;
        }
        Ok(())
    }
}

impl LevelData for BakedLevel {
    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    fn leaf_bounds(&self, leaf: usize) -> Option<AABB> {
        self.leaves
            .get(leaf)
            .map(|l| AABB::from_min_max(l.mins, l.maxs))
    }

    fn is_leaf_visible(&self, from: usize, to: usize) -> bool {
        match (self.leaves.get(from), self.leaves.get(to)) {
            (Some(a), Some(b)) => self.is_cluster_visible(a.cluster, b.cluster),
            _ => false,
        }
    }

    fn leaf_ambient_index(&self) -> &[LeafAmbientIndex] {
        &self.leaf_ambient_index
    }

    fn ambient_samples(&self) -> &[AmbientSampleRecord] {
        &self.ambient_samples
    }

    fn cubemaps(&self) -> &[CubemapRecord] {
        &self.cubemaps
    }

    fn cubemap_data(&self) -> &[ColorRgbExp32] {
        &self.cubemap_data
    }
}
