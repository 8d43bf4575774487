use asemble_model::{
    mesh::{Bone, Mesh, TexCoordChannel},
    MAX_UV_CHANNELS,
};
use glam::{Vec3, Vec4};

/// Material reference before the material list is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialSlot {
    pub material: u32,
    pub sub_material: Option<u32>,
}

impl MaterialSlot {
    pub fn new(material: u32, sub_material: Option<u32>) -> Self {
        Self {
            material,
            sub_material,
        }
    }
}

/// Output mesh still linked to the raw mesh it came from and to its
/// unflattened material. Turned into a [`Mesh`] by [`PendingMesh::finish`].
#[derive(Debug, Clone)]
pub struct PendingMesh {
    /// Index of the originating raw mesh.
    pub source: usize,
    pub slot: MaterialSlot,

    pub name: String,
    pub vertex_positions: Vec<Vec3>,
    pub vertex_normals: Vec<Vec3>,
    pub vertex_tex_coords: [Option<TexCoordChannel>; MAX_UV_CHANNELS],
    pub vertex_colors: Vec<Vec4>,
    pub bones: Vec<Bone>,
    pub indices: Vec<u32>,
}

impl PendingMesh {
    pub fn new(source: usize, slot: MaterialSlot, name: &str) -> Self {
        Self {
            source,
            slot,
            name: name.to_owned(),
            vertex_positions: Vec::new(),
            vertex_normals: Vec::new(),
            vertex_tex_coords: Default::default(),
            vertex_colors: Vec::new(),
            bones: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn num_faces(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn finish(self, material_index: u32) -> Mesh {
        Mesh::new(
            self.name,
            self.vertex_positions,
            self.vertex_normals,
            self.vertex_tex_coords,
            self.vertex_colors,
            self.bones,
            self.indices,
            material_index,
        )
    }
}
