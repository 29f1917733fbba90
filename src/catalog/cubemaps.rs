use crate::codec::{ColorRgbExp32, CubemapRecord};
use crate::collision::CollisionWorld;
use crate::error::LevelError;
use crate::kdtree::KdTree;
use crate::level::LevelData;
use crate::math::{mul, Vec3};
use crate::types::{CubeFace, CubeTexture, Cubemap};
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct CubemapCatalog {
    pub all: Vec<Arc<Cubemap>>,
    tree: KdTree,
}

impl CubemapCatalog {
    pub fn build(level: &dyn LevelData, collision: &dyn CollisionWorld) -> Self {
        let records = level.cubemaps();
        let texels = level.cubemap_data();
        let scale = level.unit_scale();
        info!("{} cubemaps", records.len());

        let all: Vec<Arc<Cubemap>> = records
            .iter()
            .enumerate()
            .map(|(i, rec)| Arc::new(decode_cubemap(i, rec, texels, scale, collision)))
            .collect();

        let points: Vec<Vec3> = all.iter().map(|c| c.pos).collect();
        CubemapCatalog {
            tree: KdTree::build(&points),
            all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn nearest(&self, pos: Vec3) -> Option<&Arc<Cubemap>> {
        self.tree.nearest(pos).map(|i| &self.all[i])
    }
}

fn decode_cubemap(
    index: usize,
    rec: &CubemapRecord,
    texels: &[ColorRgbExp32],
    unit_scale: f32,
    collision: &dyn CollisionWorld,
) -> Cubemap {
    let pos = mul(rec.pos.map(|v| v as f32), unit_scale);
    let mut faces: [Option<CubeFace>; 6] = Default::default();
    let size = rec.size.max(0) as usize;
    let fits = size.checked_mul(size).is_some_and(|n| n <= texels.len());
    if !fits {
        warn!(
            "{}",
            LevelError::CubemapSize { cubemap: index, size: rec.size, available: texels.len() }
        );
        return Cubemap {
            pos,
            leaf: collision.find_leaf(pos),
            size: 0,
            has_full_cubemap: false,
            faces,
            texture: CubeTexture::default(),
        };
    }
    let mut has_full_cubemap = true;

    for (face, slot) in faces.iter_mut().enumerate() {
        if rec.imgofs[face] == -1 {
            warn!("Cubemap {}: no image on side {}", index, face);
            has_full_cubemap = false;
            continue;
        }
        match decode_face(index, face, rec.imgofs[face], size, texels) {
            Ok(decoded) => *slot = Some(decoded),
            Err(e) => {
                warn!("{}", e);
                has_full_cubemap = false;
            }
        }
    }

    let texture = build_cube_texture(size, &faces);
    Cubemap {
        pos,
        leaf: collision.find_leaf(pos),
        size,
        has_full_cubemap,
        faces,
        texture,
    }
}

fn decode_face(
    cubemap: usize,
    face: usize,
    offset: i32,
    size: usize,
    texels: &[ColorRgbExp32],
) -> Result<CubeFace, LevelError> {
    let start = offset.max(0) as usize;
    let end = size
        .checked_mul(size)
        .and_then(|n| start.checked_add(n))
        .unwrap_or(usize::MAX);
    if offset < 0 || end > texels.len() {
        return Err(LevelError::CubemapFace {
            cubemap,
            face,
            offset: start,
            end,
            available: texels.len(),
        });
    }

    Ok(CubeFace {
        size,
        texels: texels[start..end].iter().map(|c| c.to_linear()).collect(),
    })
}

/// Packs the decoded faces into one RGB8 image per face; missing faces stay black.
fn build_cube_texture(size: usize, faces: &[Option<CubeFace>; 6]) -> CubeTexture {
    let face_bytes = size * size * 3;
    let mut ram_image = vec![0u8; face_bytes * 6];

    for (i, face) in faces.iter().enumerate() {
        let Some(face) = face else { continue };
        let dst = &mut ram_image[i * face_bytes..(i + 1) * face_bytes];
        for (px, texel) in dst.chunks_exact_mut(3).zip(&face.texels) {
            for c in 0..3 {
                px[c] = (texel[c].clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }

    CubeTexture { size, ram_image }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::BrushWorld;
    use crate::test_support::{cubemap_record, two_room_level};

    #[test]
    fn full_cubemap_decodes_every_face() {
        let (mut level, world) = two_room_level();
        level.cubemap_data = vec![ColorRgbExp32::new(255, 0, 0, 0); 6 * 4];
        level.cubemaps = vec![cubemap_record([32, 32, 32], 2, Some(0))];

        let catalog = CubemapCatalog::build(&level, &world);
        let cm = &catalog.all[0];
        assert!(cm.has_full_cubemap);
        assert_eq!(cm.pos, [2.0, 2.0, 2.0]);
        assert_eq!(cm.leaf, 1);
        assert_eq!(cm.texture.ram_image.len(), 2 * 2 * 3 * 6);
        assert_eq!(&cm.texture.face(5)[..3], &[255, 0, 0]);
        assert_eq!(cm.faces[2].as_ref().unwrap().texels[3], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_face_marks_incomplete() {
        let (mut level, world) = two_room_level();
        level.cubemap_data = vec![ColorRgbExp32::new(10, 10, 10, 0); 6 * 4];
        let mut rec = cubemap_record([0, 0, 0], 2, Some(0));
        rec.imgofs[4] = -1;
        level.cubemaps = vec![rec];

        let catalog = CubemapCatalog::build(&level, &world);
        assert!(!catalog.all[0].has_full_cubemap);
        assert!(catalog.all[0].faces[4].is_none());
        assert!(catalog.all[0].texture.face(4).iter().all(|&b| b == 0));
    }

    #[test]
    fn out_of_range_face_marks_incomplete() {
        let (mut level, _) = two_room_level();
        level.cubemap_data = vec![ColorRgbExp32::default(); 4];
        level.cubemaps = vec![cubemap_record([0, 0, 0], 2, Some(0))];

        let catalog = CubemapCatalog::build(&level, &BrushWorld::default());
        assert!(!catalog.all[0].has_full_cubemap);
        assert!(catalog.all[0].faces[0].is_some());
        assert!(catalog.all[0].faces[1].is_none());
    }

    #[test]
    fn oversized_record_is_incomplete_not_fatal() {
        let (mut level, world) = two_room_level();
        level.cubemap_data = vec![ColorRgbExp32::default(); 6 * 4];
        level.cubemaps = vec![
            cubemap_record([0, 0, 0], 1 << 20, None),
            cubemap_record([0, 0, 0], 5, Some(0)),
            cubemap_record([16, 0, 0], 2, Some(0)),
        ];

        let catalog = CubemapCatalog::build(&level, &world);
        assert_eq!(catalog.all.len(), 3);
        for cm in &catalog.all[..2] {
            assert!(!cm.has_full_cubemap);
            assert_eq!(cm.size, 0);
            assert!(cm.faces.iter().all(Option::is_none));
            assert!(cm.texture.ram_image.is_empty());
        }
        assert!(catalog.all[2].has_full_cubemap);
    }

    #[test]
    fn face_offset_near_the_limit_is_rejected() {
        let texels = vec![ColorRgbExp32::default(); 4];
        let err = decode_face(0, 1, i32::MAX, 2, &texels).unwrap_err();
        assert!(matches!(err, LevelError::CubemapFace { face: 1, available: 4, .. }));
    }

    #[test]
    fn nearest_anchor() {
        let (mut level, world) = two_room_level();
        level.cubemap_data = vec![ColorRgbExp32::default(); 6];
        level.cubemaps = vec![
            cubemap_record([0, 0, 0], 1, Some(0)),
            cubemap_record([160, 0, 0], 1, Some(0)),
        ];
        let catalog = CubemapCatalog::build(&level, &world);
        assert!(Arc::ptr_eq(catalog.nearest([1.0, 0.0, 0.0]).unwrap(), &catalog.all[0]));
        assert!(Arc::ptr_eq(catalog.nearest([9.0, 0.0, 0.0]).unwrap(), &catalog.all[1]));
        assert!(CubemapCatalog::default().nearest([0.0; 3]).is_none());
    }
}
