use glam::{Affine2, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingModel {
    Flat,
    Gouraud,
    Phong,
    Blinn,
    CookTorrance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Opacity,
    Emissive,
    Ambient,
    Height,
    Shininess,
}

/// Scale, rotation and offset applied to texture coordinates before sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub scale: Vec2,
    pub offset: Vec2,
    /// Radians.
    pub rotation: f32,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl UvTransform {
    pub const IDENTITY: Self = Self {
        scale: Vec2::ONE,
        offset: Vec2::ZERO,
        rotation: 0.0,
    };

    const EPSILON: f32 = 1e-6;

    pub fn approx_eq(&self, other: &Self) -> bool {
        self.scale.abs_diff_eq(other.scale, Self::EPSILON)
            && self.offset.abs_diff_eq(other.offset, Self::EPSILON)
            && (self.rotation - other.rotation).abs() <= Self::EPSILON
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::IDENTITY)
    }

    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.offset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    pub kind: TextureKind,
    pub path: String,
    pub blend: Option<f32>,
    /// Texture coordinate channel this slot samples from.
    pub uv_channel: u32,
    /// Identity once the transform was baked into the texture coordinates.
    pub transform: UvTransform,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,

    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,

    pub shading: ShadingModel,
    pub shininess: Option<f32>,
    pub shininess_strength: Option<f32>,
    pub opacity: f32,
    pub wireframe: bool,

    pub textures: Vec<TextureSlot>,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            name: String::new(),
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            shading: ShadingModel::Gouraud,
            shininess: None,
            shininess_strength: None,
            opacity: 1.0,
            wireframe: false,
            textures: Vec::new(),
        }
    }
}

impl Material {
    pub fn texture(&self, kind: TextureKind) -> Option<&TextureSlot> {
        self.textures.iter().find(|texture| texture.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv_transform_scales_rotates_then_offsets() {
        let transform = UvTransform {
            scale: Vec2::new(2.0, 1.0),
            offset: Vec2::new(0.5, 0.0),
            rotation: std::f32::consts::FRAC_PI_2,
        };

        let uv = transform.to_affine().transform_point2(Vec2::new(1.0, 0.0));
        assert!(uv.abs_diff_eq(Vec2::new(0.5, 2.0), 1e-6));
        assert!(!transform.is_identity());
        assert!(UvTransform::default().is_identity());
    }
}
