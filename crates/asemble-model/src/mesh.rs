use glam::{Vec3, Vec4};

use crate::MAX_UV_CHANNELS;

#[derive(Debug, Clone, PartialEq)]
pub struct TexCoordChannel {
    /// Number of meaningful components per coordinate, 2 or 3.
    pub components: u32,
    pub coords: Vec<Vec3>,
}

impl TexCoordChannel {
    pub fn new(components: u32, coords: Vec<Vec3>) -> Self {
        debug_assert!(components == 2 || components == 3);

        Self { components, coords }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub weights: Vec<VertexWeight>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertex_positions: Vec<Vec3>,
    pub vertex_normals: Vec<Vec3>,
    pub vertex_tex_coords: [Option<TexCoordChannel>; MAX_UV_CHANNELS],
    pub vertex_colors: Vec<Vec4>,
    pub bones: Vec<Bone>,
    pub indices: Vec<u32>,
    pub material_index: u32,
}

impl Mesh {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        vertex_positions: Vec<Vec3>,
        vertex_normals: Vec<Vec3>,
        vertex_tex_coords: [Option<TexCoordChannel>; MAX_UV_CHANNELS],
        vertex_colors: Vec<Vec4>,
        bones: Vec<Bone>,
        indices: Vec<u32>,
        material_index: u32,
    ) -> Self {
        debug_assert_eq!(indices.len() % 3, 0);
        debug_assert!(vertex_normals.is_empty() || vertex_normals.len() == vertex_positions.len());
        debug_assert!(vertex_colors.is_empty() || vertex_colors.len() == vertex_positions.len());

        Mesh {
            name,
            vertex_positions,
            vertex_normals,
            vertex_tex_coords,
            vertex_colors,
            bones,
            indices,
            material_index,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_positions.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.vertex_normals.is_empty()
    }

    pub fn has_vertex_colors(&self) -> bool {
        !self.vertex_colors.is_empty()
    }

    pub fn tex_coords(&self, channel: usize) -> Option<&TexCoordChannel> {
        self.vertex_tex_coords.get(channel).and_then(Option::as_ref)
    }

    pub fn num_uv_channels(&self) -> usize {
        self.vertex_tex_coords
            .iter()
            .filter(|channel| channel.is_some())
            .count()
    }

    pub fn triangle(&self, face: usize) -> [u32; 3] {
        [
            self.indices[face * 3],
            self.indices[face * 3 + 1],
            self.indices[face * 3 + 2],
        ]
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }
}
