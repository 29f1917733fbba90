pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];

/// Row-major 4x4 matrix, applied to row vectors (`v * M`).
pub type Mat4 = [[f32; 4]; 4];

pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::new()
    }
}

impl AABB {
    pub fn new() -> Self {
        Self {
            min: [f32::MAX, f32::MAX, f32::MAX],
            max: [f32::MIN, f32::MIN, f32::MIN],
            center: [0.0; 3],
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let mut aabb = Self::new();
        aabb.extend(min);
        aabb.extend(max);
        aabb
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.min[2] = self.min[2].min(p[2]);

        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
        self.max[2] = self.max[2].max(p[2]);

        self.center = [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ];
    }

    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn scaled(&self, s: f32) -> AABB {
        AABB::from_min_max(mul(self.min, s), mul(self.max, s))
    }
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn mul(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn normalize(a: Vec3) -> Vec3 {
    let len = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    if len == 0.0 {
        [0.0, 0.0, 0.0]
    } else {
        [a[0] / len, a[1] / len, a[2] / len]
    }
}

pub fn length_sq(a: Vec3) -> f32 {
    dot(a, a)
}

pub fn dist_sq(a: Vec3, b: Vec3) -> f32 {
    length_sq(sub(a, b))
}

pub fn is_finite(a: Vec3) -> bool {
    a.iter().all(|v| v.is_finite())
}

pub fn parse_vector(s: &str) -> Vec3 {
    let parts: Vec<f32> = s.split_whitespace().filter_map(|v| v.parse().ok()).collect();
    if parts.len() >= 3 {
        [parts[0], parts[1], parts[2]]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// Maps `val` from `[a, b]` onto `[c, d]`, clamping to the target range.
pub fn remap_val_clamped(val: f32, a: f32, b: f32, c: f32, d: f32) -> f32 {
    if a == b {
        return if val >= b { d } else { c };
    }
    let t = ((val - a) / (b - a)).clamp(0.0, 1.0);
    c + (d - c) * t
}

pub fn xform_vec4(m: &Mat4, v: Vec4) -> Vec4 {
    let mut out = [0.0; 4];
    for (j, o) in out.iter_mut().enumerate() {
        *o = v[0] * m[0][j] + v[1] * m[1][j] + v[2] * m[2][j] + v[3] * m[3][j];
    }
    out
}

/// Translation row of a row-vector transform.
pub fn mat_translation(m: &Mat4) -> Vec3 {
    [m[3][0], m[3][1], m[3][2]]
}

pub fn translation_mat(t: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3] = [t[0], t[1], t[2], 1.0];
    m
}
