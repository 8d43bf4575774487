use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use anyhow::Result;
use asemble_model::ModelNode;
use glam::{Mat3, Mat4};

use crate::{
    error::{Diagnostic, Diagnostics, ImportError},
    pending::PendingMesh,
    raw::RawMesh,
};

pub const ROOT_NODE_NAME: &str = "<root>";

fn name_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Relative determinant below which a node matrix counts as singular.
const SINGULAR_TOLERANCE: f32 = 1e-6;

/// Inverts `matrix` unless its basis is degenerate. The determinant is
/// compared against the volume spanned by the basis lengths, so uniformly
/// tiny or huge scales stay invertible.
fn try_inverse(matrix: Mat4) -> Option<Mat4> {
    let basis = Mat3::from_mat4(matrix);
    let volume = basis.x_axis.length() * basis.y_axis.length() * basis.z_axis.length();
    if matrix.determinant().abs() <= volume * SINGULAR_TOLERANCE {
        return None;
    }

    let inverse = matrix.inverse();
    inverse.is_finite().then_some(inverse)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Root,
    Object,
    Unknown,
}

struct HierarchyBuilder<'a> {
    raw_meshes: &'a [RawMesh],
    meshes: &'a mut [PendingMesh],
    diagnostics: &'a mut Diagnostics,

    /// Output meshes per source object, in output order.
    objects: BTreeMap<usize, Vec<u32>>,
    children: HashMap<usize, Vec<usize>>,
    attached: HashSet<usize>,
    nodes: Vec<ModelNode>,
}

impl<'a> HierarchyBuilder<'a> {
    fn new(
        raw_meshes: &'a [RawMesh],
        meshes: &'a mut [PendingMesh],
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        let mut objects: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for (mesh_idx, mesh) in meshes.iter().enumerate() {
            objects.entry(mesh.source).or_default().push(mesh_idx as u32);
        }

        Self {
            raw_meshes,
            meshes,
            diagnostics,
            objects,
            children: HashMap::new(),
            attached: HashSet::new(),
            nodes: vec![ModelNode::new(ROOT_NODE_NAME, Mat4::IDENTITY, None)],
        }
    }

    /// Resolves every object's parent by name. The first object carrying a
    /// name wins when names repeat.
    fn resolve_parents(&mut self) -> Vec<(usize, Parent)> {
        let raw_meshes = self.raw_meshes;

        let mut by_name: HashMap<String, usize> = HashMap::new();
        for &object in self.objects.keys() {
            by_name
                .entry(name_key(&raw_meshes[object].name))
                .or_insert(object);
        }

        let mut parents = Vec::with_capacity(self.objects.len());
        for &object in self.objects.keys() {
            let parent_name = &raw_meshes[object].parent_name;
            let parent = if parent_name.is_empty() {
                Parent::Root
            } else {
                match by_name.get(&name_key(parent_name)) {
                    Some(&parent) if parent != object => {
                        self.children.entry(parent).or_default().push(object);
                        Parent::Object
                    }
                    _ => Parent::Unknown,
                }
            };
            parents.push((object, parent));
        }
        parents
    }

    /// Attaches `object` and all of its not yet attached descendants.
    fn attach_subtree(&mut self, object: usize, parent_node: u32, parent_transform: Mat4) {
        let raw_meshes = self.raw_meshes;
        let mut queue = VecDeque::from([(object, parent_node, parent_transform)]);

        while let Some((object, parent_node, parent_transform)) = queue.pop_front() {
            if !self.attached.insert(object) {
                continue;
            }

            let raw = &raw_meshes[object];
            let transform = raw.transform();
            let local = match try_inverse(parent_transform) {
                Some(inverse) => inverse * transform,
                None => transform,
            };

            let node_idx = self.nodes.len() as u32;
            let mut node = ModelNode::new(&raw.name, local, Some(parent_node));
            node.meshes = self.objects.get(&object).cloned().unwrap_or_default();

            self.to_local_space(object, transform, &node.meshes);

            self.nodes[parent_node as usize].children.push(node_idx);
            self.nodes.push(node);

            if let Some(children) = self.children.get(&object) {
                for &child in children {
                    queue.push_back((child, node_idx, transform));
                }
            }
        }
    }

    /// Moves the vertices of an object from model space into its node space.
    fn to_local_space(&mut self, object: usize, transform: Mat4, mesh_indices: &[u32]) {
        let Some(inverse) = try_inverse(transform) else {
            self.diagnostics.push(Diagnostic::SingularTransform {
                mesh: self.raw_meshes[object].name.clone(),
            });
            return;
        };
        let normal_matrix = Mat3::from_mat4(transform).transpose();

        for &mesh_idx in mesh_indices {
            let mesh = &mut self.meshes[mesh_idx as usize];
            for position in &mut mesh.vertex_positions {
                *position = inverse.transform_point3(*position);
            }
            for normal in &mut mesh.vertex_normals {
                *normal = (normal_matrix * *normal).normalize_or_zero();
            }
        }
    }

    fn build(mut self) -> Result<Vec<ModelNode>> {
        let parents = self.resolve_parents();

        for &(object, parent) in &parents {
            if parent == Parent::Root {
                self.attach_subtree(object, 0, Mat4::IDENTITY);
            }
        }

        for &(object, parent) in &parents {
            if parent == Parent::Unknown && !self.attached.contains(&object) {
                self.diagnostics.push(Diagnostic::UnresolvedParent {
                    mesh: self.raw_meshes[object].name.clone(),
                    parent: self.raw_meshes[object].parent_name.clone(),
                });
                self.attach_subtree(object, 0, Mat4::IDENTITY);
            }
        }

        for &(object, _) in &parents {
            if !self.attached.contains(&object) {
                self.diagnostics.push(Diagnostic::ParentCycle {
                    mesh: self.raw_meshes[object].name.clone(),
                });
                self.attach_subtree(object, 0, Mat4::IDENTITY);
            }
        }

        elide_root(self.nodes)
    }
}

/// Promotes the only child of the synthetic root to be the root itself.
fn elide_root(mut nodes: Vec<ModelNode>) -> Result<Vec<ModelNode>> {
    match nodes[0].children.len() {
        0 => Err(ImportError::NoHierarchy.into()),
        1 => {
            nodes.remove(0);
            for node in &mut nodes {
                node.parent = node.parent.and_then(|parent| parent.checked_sub(1));
                for child in &mut node.children {
                    *child -= 1;
                }
            }
            Ok(nodes)
        }
        _ => Ok(nodes),
    }
}

/// Rebuilds the node tree from the parent names of the source objects.
///
/// Every source object with at least one output mesh becomes exactly one node
/// referencing all of its output meshes, whose vertices are moved into the
/// node's local space. The returned root node is always at index 0.
pub fn build_hierarchy(
    raw_meshes: &[RawMesh],
    meshes: &mut [PendingMesh],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ModelNode>> {
    puffin::profile_function!();

    let nodes = HierarchyBuilder::new(raw_meshes, meshes, diagnostics).build()?;

    log::debug!("Built hierarchy with {} nodes", nodes.len());

    Ok(nodes)
}
