use std::collections::BTreeSet;

use asemble_model::mesh::{Bone, TexCoordChannel, VertexWeight};

use crate::{
    error::{Diagnostic, Diagnostics},
    expand::ExpandedMesh,
    pending::{MaterialSlot, PendingMesh},
    raw::{BoneVertex, RawBone, RawMaterial, RawMesh},
};

/// Material index of a raw mesh, clamped into the material list.
///
/// The default material must already have been assigned.
pub fn resolve_material_index(
    mesh: &RawMesh,
    num_materials: usize,
    diagnostics: &mut Diagnostics,
) -> u32 {
    debug_assert!(num_materials > 0);

    let last = num_materials.saturating_sub(1) as u32;
    match mesh.material_index {
        Some(index) if (index as usize) < num_materials => index,
        index => {
            let index = index.unwrap_or(u32::MAX);
            diagnostics.push(Diagnostic::MaterialIndexOutOfRange {
                mesh: mesh.name.clone(),
                index,
                clamped: last,
            });
            last
        }
    }
}

/// Splits an expanded mesh into one output mesh per used sub material, or a
/// single output mesh if its material has no sub materials.
pub fn split_by_material(
    source: usize,
    raw: &RawMesh,
    expanded: &ExpandedMesh,
    material_index: u32,
    material: &RawMaterial,
    diagnostics: &mut Diagnostics,
) -> Vec<PendingMesh> {
    puffin::profile_function!();

    if material.sub_materials.is_empty() {
        return vec![copy_mesh(source, raw, expanded, material_index, diagnostics)];
    }

    let num_sub_materials = material.sub_materials.len();
    let last = num_sub_materials as u32 - 1;

    let mut partitions = vec![Vec::new(); num_sub_materials];
    for (face_idx, face) in expanded.faces.iter().enumerate() {
        match face.sub_material {
            Some(sub) if sub < num_sub_materials as u32 => {
                partitions[sub as usize].push(face_idx)
            }
            index => {
                diagnostics.push(Diagnostic::SubMaterialIndexOutOfRange {
                    mesh: raw.name.clone(),
                    face: face_idx,
                    index,
                    clamped: last,
                });
                partitions[last as usize].push(face_idx);
            }
        }
    }

    let mut reported_bones = BTreeSet::new();

    partitions
        .iter()
        .enumerate()
        .filter(|(_, faces)| !faces.is_empty())
        .map(|(sub, faces)| {
            let slot = MaterialSlot::new(material_index, Some(sub as u32));
            let mut out = PendingMesh::new(source, slot, &raw.name);

            let num_vertices = faces.len() * 3;
            out.vertex_positions.reserve(num_vertices);
            out.indices.reserve(num_vertices);

            // Old expanded vertex for every new vertex.
            let mut remap = Vec::with_capacity(num_vertices);
            for &face_idx in faces {
                let base = remap.len() as u32;
                remap.extend(expanded.faces[face_idx].indices.map(|i| i as usize));
                out.indices.extend([base, base + 1, base + 2]);
            }

            out.vertex_positions = remap.iter().map(|&i| expanded.positions[i]).collect();
            if expanded.has_normals() {
                out.vertex_normals = remap.iter().map(|&i| expanded.normals[i]).collect();
            }
            for (channel, coords) in expanded.tex_coords.iter().enumerate() {
                if !coords.is_empty() {
                    out.vertex_tex_coords[channel] = Some(TexCoordChannel::new(
                        expanded.num_uv_components[channel].clamp(2, 3),
                        remap.iter().map(|&i| coords[i]).collect(),
                    ));
                }
            }
            if !expanded.vertex_colors.is_empty() {
                out.vertex_colors = remap.iter().map(|&i| expanded.vertex_colors[i]).collect();
            }
            if !raw.bones.is_empty() && !expanded.bone_vertices.is_empty() {
                out.bones = collect_bones(
                    &raw.name,
                    &raw.bones,
                    remap
                        .iter()
                        .enumerate()
                        .map(|(new, &old)| (new as u32, &expanded.bone_vertices[old])),
                    &mut reported_bones,
                    diagnostics,
                );
            }

            out
        })
        .collect()
}

fn copy_mesh(
    source: usize,
    raw: &RawMesh,
    expanded: &ExpandedMesh,
    material_index: u32,
    diagnostics: &mut Diagnostics,
) -> PendingMesh {
    let slot = MaterialSlot::new(material_index, None);
    let mut out = PendingMesh::new(source, slot, &raw.name);

    out.vertex_positions = expanded.positions.clone();
    out.vertex_normals = expanded.normals.clone();
    out.vertex_colors = expanded.vertex_colors.clone();
    for (channel, coords) in expanded.tex_coords.iter().enumerate() {
        if !coords.is_empty() {
            out.vertex_tex_coords[channel] = Some(TexCoordChannel::new(
                expanded.num_uv_components[channel].clamp(2, 3),
                coords.clone(),
            ));
        }
    }
    out.indices = expanded.faces.iter().flat_map(|face| face.indices).collect();

    if !raw.bones.is_empty() && !expanded.bone_vertices.is_empty() {
        out.bones = collect_bones(
            &raw.name,
            &raw.bones,
            expanded
                .bone_vertices
                .iter()
                .enumerate()
                .map(|(vertex, bone_vertex)| (vertex as u32, bone_vertex)),
            &mut BTreeSet::new(),
            diagnostics,
        );
    }

    out
}

/// Regroups per-vertex weights into per-bone weight lists, leaving out bones
/// without any weight.
fn collect_bones<'a>(
    mesh_name: &str,
    bones: &[RawBone],
    vertices: impl Iterator<Item = (u32, &'a BoneVertex)>,
    reported: &mut BTreeSet<u32>,
    diagnostics: &mut Diagnostics,
) -> Vec<Bone> {
    let mut weights = vec![Vec::new(); bones.len()];

    for (vertex, bone_vertex) in vertices {
        for &(bone, weight) in &bone_vertex.weights {
            match weights.get_mut(bone as usize) {
                Some(bone_weights) => bone_weights.push(VertexWeight { vertex, weight }),
                None => {
                    if reported.insert(bone) {
                        diagnostics.push(Diagnostic::BoneIndexOutOfRange {
                            mesh: mesh_name.to_owned(),
                            bone,
                        });
                    }
                }
            }
        }
    }

    bones
        .iter()
        .zip(weights)
        .filter(|(_, weights)| !weights.is_empty())
        .map(|(bone, weights)| Bone {
            name: bone.name.clone(),
            weights,
        })
        .collect()
}
