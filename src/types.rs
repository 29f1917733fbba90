use crate::math::{Vec3, Vec4};
use parking_lot::RwLock;
use serde::Serialize;

/// Upper bound of simultaneously lit sources per object.
pub const MAX_ACTIVE_LIGHTS: usize = 2;
/// Capacity of the slot buffer: active lights plus lights fading out.
pub const MAX_TOTAL_LIGHTS: usize = 4;

const _: () = assert!(MAX_TOTAL_LIGHTS >= MAX_ACTIVE_LIGHTS);

/// Identity of a scene object tracked by the lighting cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(pub u64);

/// World-space transform of a tracked object, as handed over by the scene graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub pos: Vec3,
}

impl Transform {
    pub fn from_pos(pos: Vec3) -> Self {
        Self { pos }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LightType {
    /// The sun. At most one per level.
    Directional,
    Spot,
    Point,
}

impl LightType {
    pub fn name(&self) -> &'static str {
        match self {
            LightType::Directional => "Directional",
            LightType::Spot => "Spot",
            LightType::Point => "Point",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LightFalloff {
    pub constant_atten: f32,
    pub linear_atten: f32,
    pub quadratic_atten: f32,
    pub start_fade_distance: f32,
    pub end_fade_distance: f32,
    /// 0 means no hard cap
    pub cap_distance: f32,
    /// Cosine of the inner cone angle (spot lights only)
    pub inner_cos: f32,
    /// Cosine of the outer cone angle (spot lights only)
    pub outer_cos: f32,
    pub exponent: f32,
}

/// Per-frame eye-space copy of a light's position and direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSpace {
    pub pos: Vec4,
    pub direction: Vec4,
}

#[derive(Debug)]
pub struct Light {
    /// Entity index in the level; stable for the life of the level.
    pub id: u32,
    pub light_type: LightType,
    pub pos: Vec3,
    /// Spot: where the cone points. Directional: points back toward the sky.
    pub direction: Vec3,
    pub color: Vec3,
    pub falloff: LightFalloff,
    pub leaf: usize,
    pub(crate) eye: RwLock<EyeSpace>,
}

impl Light {
    pub fn new(
        id: u32,
        light_type: LightType,
        pos: Vec3,
        direction: Vec3,
        color: Vec3,
        falloff: LightFalloff,
        leaf: usize,
    ) -> Self {
        Self {
            id,
            light_type,
            pos,
            direction,
            color,
            falloff,
            leaf,
            eye: RwLock::new(EyeSpace {
                pos: [pos[0], pos[1], pos[2], 1.0],
                direction: [direction[0], direction[1], direction[2], 0.0],
            }),
        }
    }

    pub fn eye_space(&self) -> EyeSpace {
        *self.eye.read()
    }

    /// Packs the light the way shading consumes it: eye pos, eye direction,
    /// falloff and color rows, plus fade/cap and exponent rows.
    pub fn pack(&self) -> LightSlot {
        let eye = self.eye_space();
        let f = &self.falloff;
        LightSlot {
            id: self.id,
            light_type: self.light_type,
            data: [
                eye.pos,
                eye.direction,
                [f.constant_atten, f.linear_atten, f.quadratic_atten, f.inner_cos],
                [self.color[0], self.color[1], self.color[2], 0.0],
            ],
            data2: [
                [f.start_fade_distance, f.end_fade_distance, f.cap_distance, f.outer_cos],
                [f.exponent, 0.0, 0.0, 0.0],
            ],
        }
    }
}

/// One packed light in an object's slot buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightSlot {
    pub id: u32,
    pub light_type: LightType,
    pub data: [Vec4; 4],
    pub data2: [Vec4; 2],
}

impl LightSlot {
    pub fn color(&self) -> Vec3 {
        let row = self.data[3];
        [row[0], row[1], row[2]]
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.data[3] = [color[0], color[1], color[2], 0.0];
    }
}

/// Ambient cube face order.
pub const CUBE_FACES: [&str; 6] = ["+X", "-X", "+Y", "-Y", "+Z", "-Z"];

#[derive(Debug, Clone, PartialEq)]
pub struct AmbientProbe {
    pub leaf: usize,
    pub pos: Vec3,
    pub cube: [Vec3; 6],
}

/// One decoded cubemap face, `size * size` linear RGB texels, row-major.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CubeFace {
    pub size: usize,
    pub texels: Vec<Vec3>,
}

/// RGB8 cube texture ready for upload: six faces back to back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CubeTexture {
    pub size: usize,
    pub ram_image: Vec<u8>,
}

impl CubeTexture {
    pub fn face_bytes(&self) -> usize {
        self.size * self.size * 3
    }

    pub fn face(&self, face: usize) -> &[u8] {
        let n = self.face_bytes();
        &self.ram_image[face * n..(face + 1) * n]
    }
}

#[derive(Debug, Clone)]
pub struct Cubemap {
    pub pos: Vec3,
    pub leaf: usize,
    pub size: usize,
    pub has_full_cubemap: bool,
    /// `None` for faces with no baked imagery
    pub faces: [Option<CubeFace>; 6],
    pub texture: CubeTexture,
}
