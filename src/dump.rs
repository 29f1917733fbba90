//! Debug output for the CLI: light tables, lighting states and cubemap faces.

use crate::catalog::LevelCatalog;
use crate::manager::LightingHandle;
use crate::types::{ObjectId, CUBE_FACES};
use anyhow::Context;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

const FACE_FILE_SUFFIX: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

#[derive(Serialize)]
struct ObjectDump {
    object: ObjectId,
    state: serde_json::Value,
}

/// Prints every light of the catalog the same way `--dump-data` always did.
pub fn print_lights(catalog: &LevelCatalog) {
    warn!("Dumping all extracted light data:");
    for (idx, light) in catalog.lights.all.iter().enumerate() {
        let sun = if catalog.lights.sun == Some(idx) { " (sun)" } else { "" };
        println!(
            "#{:<4} {:<11}{} leaf {:<4} pos {:?} color {:?}",
            light.id,
            light.light_type.name(),
            sun,
            light.leaf,
            light.pos,
            light.color
        );
        println!("      {:?}", light.falloff);
    }
    println!("----------------------------------------------");
}

/// Prints the number of ambient probes baked into each leaf that has any.
pub fn print_probes(catalog: &LevelCatalog) {
    warn!("Dumping ambient probes per leaf:");
    for leaf in 0..catalog.probes.by_leaf.len() {
        let probes: Vec<_> = catalog.probes.in_leaf(leaf).collect();
        if probes.is_empty() {
            continue;
        }
        println!("leaf {:<5} {} probes, first at {:?}", leaf, probes.len(), probes[0].pos);
    }
    println!("----------------------------------------------");
}

/// Serialises the current state behind each handle into a pretty JSON array.
pub fn states_to_json(handles: &[(ObjectId, LightingHandle)]) -> anyhow::Result<String> {
    let mut dumps = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let state = serde_json::to_value(&*handle.read())?;
        dumps.push(ObjectDump { object: *id, state });
    }
    Ok(serde_json::to_string_pretty(&dumps)?)
}

pub fn write_states_json(path: &Path, handles: &[(ObjectId, LightingHandle)]) -> anyhow::Result<()> {
    let json = states_to_json(handles)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {} lighting states to {:?}", handles.len(), path);
    Ok(())
}

/// Writes every decoded cubemap face as a linear EXR. Missing faces are skipped.
/// Returns the written paths.
pub fn write_cubemap_faces(catalog: &LevelCatalog, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for (index, cubemap) in catalog.cubemaps.all.iter().enumerate() {
        for (face_idx, face) in cubemap.faces.iter().enumerate() {
            let Some(face) = face else {
                warn!("Cubemap {}: face {} not baked, skipped", index, CUBE_FACES[face_idx]);
                continue;
            };
            if face.size == 0 {
                continue;
            }

            let path = dir.join(format!("cubemap_{}_{}.exr", index, FACE_FILE_SUFFIX[face_idx]));
            let size = face.size;
            exr::prelude::write_rgb_file(&path, size, size, |x, y| {
                let c = face.texels[y * size + x];
                (c[0], c[1], c[2])
            })
            .with_context(|| format!("Failed to write {:?}", path))?;
            written.push(path);
        }
    }

    info!("Wrote {} cubemap faces to {:?}", written.len(), dir);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;
    use crate::manager::AmbientLightingManager;
    use crate::test_support::{light_entity, two_room_level};
    use std::sync::Arc;

    #[test]
    fn states_json_lists_slots() {
        let (mut level, world) = two_room_level();
        level.entities = vec![light_entity("light", &[("origin", "16 16 16")])];
        let mgr = AmbientLightingManager::new(LightingConfig::default());
        mgr.load_level(&level, Arc::new(world)).unwrap();

        let handle = mgr.update(ObjectId(3), &crate::types::Transform::from_pos([1.0; 3]), 0.0).unwrap();
        let json = states_to_json(&[(ObjectId(3), handle)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["object"], 3);
        assert_eq!(value[0]["state"]["active_lights"], 1);
        assert_eq!(value[0]["state"]["slots"]["slots"][0]["light_type"], "Point");
    }
}
