//! Math type aliases, output element types, and coordinate conversions.
//!
//! glTF is right-handed with +Y up. The conversions here mirror the X axis to
//! produce left-handed data and apply the caller's uniform scale. They run
//! after decoding so that the raw accessor values can be checked on their own.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Linear RGBA color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from its components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Four signed integers, used for joint indices.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct IntVec4 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

impl IntVec4 {
    /// Creates a vector from its components.
    pub const fn new(x: i32, y: i32, z: i32, w: i32) -> Self {
        Self { x, y, z, w }
    }
}

// ===== Handedness conversion =====

/// Mirrors a position or direction across the YZ plane.
#[inline]
pub fn convert_vec3(v: Vec3, convert_handedness: bool) -> Vec3 {
    if convert_handedness {
        Vec3::new(-v.x, v.y, v.z)
    } else {
        v
    }
}

/// Mirrors a tangent. The bitangent sign in `w` flips with the basis.
#[inline]
pub fn convert_tangent(v: Vec4, convert_handedness: bool) -> Vec4 {
    if convert_handedness {
        Vec4::new(-v.x, v.y, v.z, -v.w)
    } else {
        v
    }
}

/// Mirrors a rotation quaternion stored as `(x, y, z, w)`.
#[inline]
pub fn convert_rotation(q: Vec4, convert_handedness: bool) -> Vec4 {
    if convert_handedness {
        Vec4::new(q.x, -q.y, -q.z, q.w)
    } else {
        q
    }
}

/// Mirrors a transform matrix: `S * M * S` with `S = diag(-1, 1, 1, 1)`.
pub fn convert_mat4(m: Mat4, convert_handedness: bool) -> Mat4 {
    if !convert_handedness {
        return m;
    }
    let mut out = m;
    for i in 1..4 {
        out[(0, i)] = -m[(0, i)];
        out[(i, 0)] = -m[(i, 0)];
    }
    out
}

/// Flips a texture coordinate vertically.
#[inline]
pub fn flip_uv(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}
