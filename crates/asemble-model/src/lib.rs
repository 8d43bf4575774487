use animation::Animation;
use glam::Mat4;
use material::Material;
use mesh::Mesh;
use uuid::Uuid;

pub mod animation;
pub mod material;
pub mod mesh;

/// Maximum number of texture coordinate channels a mesh can carry.
pub const MAX_UV_CHANNELS: usize = 4;

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,

    /// Local-to-parent transform.
    pub transform: Mat4,
    pub parent: Option<u32>,
    pub children: Vec<u32>,

    pub meshes: Vec<u32>,
}

impl ModelNode {
    pub fn new(name: &str, transform: Mat4, parent: Option<u32>) -> Self {
        Self {
            name: name.to_owned(),
            transform,
            parent,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub uuid: Uuid,
    pub root_node: u32,
    pub nodes: Vec<ModelNode>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub animations: Vec<Animation>,
}

impl Model {
    pub fn root(&self) -> &ModelNode {
        &self.nodes[self.root_node as usize]
    }

    /// Accumulated local-to-model transform of a node.
    pub fn global_transform(&self, node: u32) -> Mat4 {
        let mut transform = self.nodes[node as usize].transform;
        let mut parent = self.nodes[node as usize].parent;
        while let Some(idx) = parent {
            transform = self.nodes[idx as usize].transform * transform;
            parent = self.nodes[idx as usize].parent;
        }
        transform
    }

    pub fn find_node(&self, name: &str) -> Option<u32> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(|idx| idx as u32)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn node(name: &str, translation: Vec3, parent: Option<u32>) -> ModelNode {
        ModelNode::new(name, Mat4::from_translation(translation), parent)
    }

    #[test]
    fn global_transform_accumulates_parents() {
        let mut root = node("root", Vec3::new(1.0, 0.0, 0.0), None);
        root.children.push(1);
        let mut child = node("child", Vec3::new(0.0, 2.0, 0.0), Some(0));
        child.children.push(2);
        let leaf = node("leaf", Vec3::new(0.0, 0.0, 3.0), Some(1));

        let model = Model {
            uuid: Uuid::new_v4(),
            root_node: 0,
            nodes: vec![root, child, leaf],
            meshes: vec![],
            materials: vec![],
            animations: vec![],
        };

        let p = model.global_transform(2).transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(model.find_node("leaf"), Some(2));
        assert_eq!(model.root().name, "root");
    }
}
