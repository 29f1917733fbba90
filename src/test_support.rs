//! Shared fixtures for unit tests.

use crate::codec::{AmbientSampleRecord, ColorRgbExp32, CubemapRecord};
use crate::collision::BrushWorld;
use crate::level::{BakedLeaf, BakedLevel, LevelData};
use std::sync::atomic::{AtomicU64, Ordering};
use vmf_forge::prelude::Entity;

/// Two closed rooms side by side along X, each its own cluster, neither seeing the other.
///
/// Leaf 1 spans 0..320 (world 0..20), leaf 2 spans 330..650 (world 20.625..40.625).
/// Both are 320 units tall and deep. Leaf 0 is the solid outside.
pub(crate) fn two_room_level() -> (BakedLevel, BrushWorld) {
    let mut level = BakedLevel::new(vec![
        BakedLeaf { mins: [-16384.0; 3], maxs: [16384.0; 3], cluster: -1 },
        BakedLeaf { mins: [0.0, 0.0, 0.0], maxs: [320.0, 320.0, 320.0], cluster: 0 },
        BakedLeaf { mins: [330.0, 0.0, 0.0], maxs: [650.0, 320.0, 320.0], cluster: 1 },
    ]);
    level.set_cluster_visible(0, 0);
    level.set_cluster_visible(1, 1);

    let scale = level.unit_scale();
    let leaf_bounds = (0..level.leaf_count())
        .filter_map(|leaf| level.leaf_bounds(leaf))
        .map(|b| b.scaled(scale))
        .collect();

    (level, BrushWorld::new(Vec::new(), leaf_bounds))
}

pub(crate) fn light_entity(classname: &str, keys: &[(&str, &str)]) -> Entity {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    let mut ent = Entity::new(classname, NEXT_ID.fetch_add(1, Ordering::Relaxed));
    for (k, v) in keys {
        ent.set(k.to_string(), v.to_string());
    }
    ent
}

/// Ambient sample with the same gray on every face, quantised at the leaf's min corner.
pub(crate) fn uniform_sample(mantissa: u8, exponent: i8) -> AmbientSampleRecord {
    AmbientSampleRecord {
        cube: [ColorRgbExp32::new(mantissa, mantissa, mantissa, exponent); 6],
        x: 0,
        y: 0,
        z: 0,
    }
}

/// Cubemap anchor whose faces are laid out back to back from `base`.
/// `None` leaves every face unbaked.
pub(crate) fn cubemap_record(pos: [i32; 3], size: i32, base: Option<i32>) -> CubemapRecord {
    let mut imgofs = [-1; 6];
    if let Some(base) = base {
        for (face, ofs) in imgofs.iter_mut().enumerate() {
            *ofs = base + face as i32 * size * size;
        }
    }
    CubemapRecord { pos, size, imgofs }
}
