use crate::error::LevelError;
use crate::math::Vec3;
use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Exposure-encoded color: 8-bit mantissas with a shared signed exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorRgbExp32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub exponent: i8,
}

impl ColorRgbExp32 {
    pub const RECORD_SIZE: usize = 4;

    pub fn new(r: u8, g: u8, b: u8, exponent: i8) -> Self {
        Self { r, g, b, exponent }
    }

    /// Linear RGB: `c / 255 * 2^exponent`
    pub fn to_linear(self) -> Vec3 {
        let scale = (self.exponent as f32).exp2();
        [
            self.r as f32 / 255.0 * scale,
            self.g as f32 / 255.0 * scale,
            self.b as f32 / 255.0 * scale,
        ]
    }

    fn read(cur: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self {
            r: cur.read_u8()?,
            g: cur.read_u8()?,
            b: cur.read_u8()?,
            exponent: cur.read_i8()?,
        })
    }
}

/// Per-leaf ambient sample range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeafAmbientIndex {
    pub num_ambient_samples: u16,
    pub first_ambient_sample: u16,
}

impl LeafAmbientIndex {
    pub const RECORD_SIZE: usize = 4;
}

/// One baked ambient sample: six cube colors and a position quantised
/// to 0..=255 inside the owning leaf's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmbientSampleRecord {
    pub cube: [ColorRgbExp32; 6],
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl AmbientSampleRecord {
    /// 6 colors + xyz + 1 pad byte
    pub const RECORD_SIZE: usize = 6 * ColorRgbExp32::RECORD_SIZE + 4;
}

/// Baked reflection probe anchor. Position is in level units,
/// `imgofs` indexes the cubemap texel array, -1 marks a missing face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CubemapRecord {
    pub pos: [i32; 3],
    pub size: i32,
    pub imgofs: [i32; 6],
}

impl CubemapRecord {
    pub const RECORD_SIZE: usize = 10 * 4;
}

fn check_len(lump: &'static str, bytes: &[u8], record_size: usize) -> Result<usize, LevelError> {
    if bytes.len() % record_size != 0 {
        return Err(LevelError::LumpSize {
            lump,
            len: bytes.len(),
            record_size,
        });
    }
    Ok(bytes.len() / record_size)
}

pub fn decode_rgbexp32_lump(bytes: &[u8]) -> Result<Vec<ColorRgbExp32>, LevelError> {
    let count = check_len("cubemap data", bytes, ColorRgbExp32::RECORD_SIZE)?;
    let mut cur = Cursor::new(bytes);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(ColorRgbExp32::read(&mut cur)?);
    }
    Ok(out)
}

pub fn decode_leaf_ambient_index_lump(bytes: &[u8]) -> Result<Vec<LeafAmbientIndex>, LevelError> {
    let count = check_len("leaf ambient index", bytes, LeafAmbientIndex::RECORD_SIZE)?;
    let mut cur = Cursor::new(bytes);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(LeafAmbientIndex {
            num_ambient_samples: cur.read_u16::<LittleEndian>()?,
            first_ambient_sample: cur.read_u16::<LittleEndian>()?,
        });
    }
    Ok(out)
}

pub fn decode_ambient_lighting_lump(bytes: &[u8]) -> Result<Vec<AmbientSampleRecord>, LevelError> {
    let count = check_len("leaf ambient lighting", bytes, AmbientSampleRecord::RECORD_SIZE)?;
    let mut cur = Cursor::new(bytes);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let mut cube = [ColorRgbExp32::default(); 6];
        for c in cube.iter_mut() {
            *c = ColorRgbExp32::read(&mut cur)?;
        }
        let x = cur.read_u8()?;
        let y = cur.read_u8()?;
        let z = cur.read_u8()?;
        let _pad = cur.read_u8()?;
        out.push(AmbientSampleRecord { cube, x, y, z });
    }
    Ok(out)
}

pub fn decode_cubemap_lump(bytes: &[u8]) -> Result<Vec<CubemapRecord>, LevelError> {
    let count = check_len("cubemaps", bytes, CubemapRecord::RECORD_SIZE)?;
    let mut cur = Cursor::new(bytes);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let mut rec = CubemapRecord::default();
        for p in rec.pos.iter_mut() {
            *p = cur.read_i32::<LittleEndian>()?;
        }
        rec.size = cur.read_i32::<LittleEndian>()?;
        for o in rec.imgofs.iter_mut() {
            *o = cur.read_i32::<LittleEndian>()?;
        }
        out.push(rec);
    }
    Ok(out)
}
