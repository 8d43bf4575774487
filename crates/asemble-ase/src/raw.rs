//! Intermediate records handed over by an ASE parser.
//!
//! Everything here mirrors the structure of the source file: vertex pools are
//! shared and indexed per face, materials reference sub materials by index and
//! objects find their parent by name only.

use asemble_model::{
    animation::{QuatKey, VectorKey},
    MAX_UV_CHANNELS,
};
use glam::{Mat4, Vec2, Vec3, Vec4};

#[derive(Debug, Clone, PartialEq)]
pub struct RawFace {
    pub indices: [u32; 3],
    pub uv_indices: [[u32; 3]; MAX_UV_CHANNELS],
    pub color_indices: [u32; 3],
    /// Sub material of the mesh material, `None` if the face never set one.
    pub sub_material: Option<u32>,
    /// Smoothing group bit mask.
    pub smoothing_group: u32,
}

impl RawFace {
    /// Face whose UV and color indices equal its position indices.
    pub fn new(indices: [u32; 3]) -> Self {
        Self {
            indices,
            uv_indices: [indices; MAX_UV_CHANNELS],
            color_indices: indices,
            sub_material: None,
            smoothing_group: 0,
        }
    }

    pub fn with_smoothing_group(mut self, smoothing_group: u32) -> Self {
        self.smoothing_group = smoothing_group;
        self
    }

    pub fn with_sub_material(mut self, sub_material: u32) -> Self {
        self.sub_material = Some(sub_material);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneVertex {
    /// `(bone index, weight)` pairs.
    pub weights: Vec<(u32, f32)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBone {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnimation {
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
}

#[derive(Debug, Clone)]
pub struct RawMesh {
    pub name: String,
    pub parent_name: String,

    /// Node matrix as stored in the file: one array per `*TM_ROW`, the
    /// translation being the last row.
    pub node_tm: [[f32; 4]; 4],

    pub positions: Vec<Vec3>,
    pub faces: Vec<RawFace>,
    pub tex_coords: [Vec<Vec3>; MAX_UV_CHANNELS],
    pub num_uv_components: [u32; MAX_UV_CHANNELS],
    pub vertex_colors: Vec<Vec4>,
    pub normals: Vec<Vec3>,

    pub bone_vertices: Vec<BoneVertex>,
    pub bones: Vec<RawBone>,

    pub material_index: Option<u32>,
    pub animation: RawAnimation,

    /// Helper objects without geometry.
    pub skip: bool,
}

impl Default for RawMesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent_name: String::new(),
            node_tm: Mat4::IDENTITY.to_cols_array_2d(),
            positions: Vec::new(),
            faces: Vec::new(),
            tex_coords: Default::default(),
            num_uv_components: [2; MAX_UV_CHANNELS],
            vertex_colors: Vec::new(),
            normals: Vec::new(),
            bone_vertices: Vec::new(),
            bones: Vec::new(),
            material_index: None,
            animation: RawAnimation::default(),
            skip: false,
        }
    }
}

impl RawMesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Node matrix in glam's column-vector convention.
    ///
    /// The file stores rows with the translation in the last row, so reading
    /// them as columns is the required transpose.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.node_tm)
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.node_tm = transform.to_cols_array_2d();
    }

    pub fn has_animation(&self) -> bool {
        self.animation.position_keys.len() > 1 || self.animation.rotation_keys.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    Flat,
    Gouraud,
    Phong,
    Blinn,
    Metal,
    Wire,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTexture {
    pub map_name: String,
    /// `NaN` when the file did not specify an amount.
    pub blend: f32,
    pub scale: Vec2,
    pub offset: Vec2,
    /// Rotation around the W axis, in radians.
    pub rotation: f32,
}

impl Default for RawTexture {
    fn default() -> Self {
        Self {
            map_name: String::new(),
            blend: f32::NAN,
            scale: Vec2::ONE,
            offset: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl RawTexture {
    pub fn new(map_name: &str) -> Self {
        Self {
            map_name: map_name.to_owned(),
            ..Default::default()
        }
    }

    pub fn is_set(&self) -> bool {
        !self.map_name.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RawMaterial {
    pub name: String,

    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,

    pub shading: ShadingMode,
    pub specular_exponent: f32,
    pub shininess_strength: f32,
    pub transparency: f32,

    pub diffuse_map: RawTexture,
    pub specular_map: RawTexture,
    pub opacity_map: RawTexture,
    pub emissive_map: RawTexture,
    pub ambient_map: RawTexture,
    pub bump_map: RawTexture,
    pub shininess_map: RawTexture,

    pub sub_materials: Vec<RawMaterial>,
}

impl Default for RawMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            shading: ShadingMode::Gouraud,
            specular_exponent: 0.0,
            shininess_strength: 0.0,
            transparency: 0.0,
            diffuse_map: RawTexture::default(),
            specular_map: RawTexture::default(),
            opacity_map: RawTexture::default(),
            emissive_map: RawTexture::default(),
            ambient_map: RawTexture::default(),
            bump_map: RawTexture::default(),
            shininess_map: RawTexture::default(),
            sub_materials: Vec::new(),
        }
    }
}

impl RawMaterial {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }
}

/// Everything the parser extracted from one file.
#[derive(Debug, Clone)]
pub struct ParsedScene {
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
    /// `*SCENE_AMBIENT_STATIC`, added to every material's ambient color.
    pub ambient_color: Vec3,
    pub frame_speed: u32,
    pub ticks_per_frame: u32,
}

impl Default for ParsedScene {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            materials: Vec::new(),
            ambient_color: Vec3::ZERO,
            frame_speed: 30,
            ticks_per_frame: 160,
        }
    }
}
