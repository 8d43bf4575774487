use anyhow::Result;
use asemble_model::MAX_UV_CHANNELS;
use glam::{Vec3, Vec4};

use crate::{
    error::ImportError,
    raw::{BoneVertex, RawMesh},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandedFace {
    pub indices: [u32; 3],
    pub sub_material: Option<u32>,
    pub smoothing_group: u32,
}

/// Mesh where every face owns its three vertices.
#[derive(Debug, Clone, Default)]
pub struct ExpandedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: [Vec<Vec3>; MAX_UV_CHANNELS],
    pub num_uv_components: [u32; MAX_UV_CHANNELS],
    pub vertex_colors: Vec<Vec4>,
    pub bone_vertices: Vec<BoneVertex>,
    pub faces: Vec<ExpandedFace>,
}

impl ExpandedMesh {
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }
}

/// Checks that every face index addresses an existing pool entry.
pub fn validate(mesh: &RawMesh) -> Result<()> {
    for (face_idx, face) in mesh.faces.iter().enumerate() {
        for &index in &face.indices {
            if index as usize >= mesh.positions.len() {
                return Err(ImportError::VertexIndexOutOfRange {
                    mesh: mesh.name.clone(),
                    face: face_idx,
                    index,
                    len: mesh.positions.len(),
                }
                .into());
            }
        }

        for (channel, coords) in mesh.tex_coords.iter().enumerate() {
            if coords.is_empty() {
                continue;
            }
            for &index in &face.uv_indices[channel] {
                if index as usize >= coords.len() {
                    return Err(ImportError::TexCoordIndexOutOfRange {
                        mesh: mesh.name.clone(),
                        face: face_idx,
                        channel,
                        index,
                        len: coords.len(),
                    }
                    .into());
                }
            }
        }

        if !mesh.vertex_colors.is_empty() {
            for &index in &face.color_indices {
                if index as usize >= mesh.vertex_colors.len() {
                    return Err(ImportError::ColorIndexOutOfRange {
                        mesh: mesh.name.clone(),
                        face: face_idx,
                        index,
                        len: mesh.vertex_colors.len(),
                    }
                    .into());
                }
            }
        }
    }

    Ok(())
}

/// Gathers all per-corner data into unshared vertices, vertex `3 * f + k`
/// being corner `k` of face `f`, and flips the winding of every face.
///
/// Indices must have been checked with [`validate`].
pub fn expand(mesh: &RawMesh) -> ExpandedMesh {
    puffin::profile_function!();

    let num_vertices = mesh.faces.len() * 3;

    let mut expanded = ExpandedMesh {
        positions: Vec::with_capacity(num_vertices),
        num_uv_components: mesh.num_uv_components,
        faces: Vec::with_capacity(mesh.faces.len()),
        ..Default::default()
    };

    // A normal pool that does not cover every position is regenerated.
    let has_normals = !mesh.normals.is_empty() && mesh.normals.len() >= mesh.positions.len();
    let has_colors = !mesh.vertex_colors.is_empty();
    let has_bones = !mesh.bone_vertices.is_empty();

    if has_normals {
        expanded.normals.reserve(num_vertices);
    }
    if has_colors {
        expanded.vertex_colors.reserve(num_vertices);
    }
    if has_bones {
        expanded.bone_vertices.reserve(num_vertices);
    }
    for (channel, coords) in mesh.tex_coords.iter().enumerate() {
        if !coords.is_empty() {
            expanded.tex_coords[channel].reserve(num_vertices);
        }
    }

    for face in &mesh.faces {
        let base = expanded.positions.len() as u32;

        for corner in 0..3 {
            let index = face.indices[corner] as usize;
            expanded.positions.push(mesh.positions[index]);

            for (channel, coords) in mesh.tex_coords.iter().enumerate() {
                if !coords.is_empty() {
                    let uv = coords[face.uv_indices[channel][corner] as usize];
                    expanded.tex_coords[channel].push(uv);
                }
            }

            if has_colors {
                let color = mesh.vertex_colors[face.color_indices[corner] as usize];
                expanded.vertex_colors.push(color);
            }

            if has_normals {
                expanded.normals.push(mesh.normals[index]);
            }

            // Bone data may cover fewer vertices than the position pool.
            if has_bones {
                expanded
                    .bone_vertices
                    .push(mesh.bone_vertices.get(index).cloned().unwrap_or_default());
            }
        }

        expanded.faces.push(ExpandedFace {
            indices: [base + 2, base + 1, base],
            sub_material: face.sub_material,
            smoothing_group: face.smoothing_group,
        });
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawFace;

    fn quad() -> RawMesh {
        let mut mesh = RawMesh::new("Quad");
        mesh.positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        mesh.faces = vec![RawFace::new([0, 1, 2]), RawFace::new([0, 2, 3])];
        mesh
    }

    #[test]
    fn expansion_is_corner_exact() {
        let mesh = quad();
        let expanded = expand(&mesh);

        assert_eq!(expanded.positions.len(), 6);
        for (f, face) in mesh.faces.iter().enumerate() {
            for k in 0..3 {
                assert_eq!(
                    expanded.positions[3 * f + k],
                    mesh.positions[face.indices[k] as usize]
                );
            }
        }
    }

    #[test]
    fn winding_is_reversed() {
        let expanded = expand(&quad());

        assert_eq!(expanded.faces[0].indices, [2, 1, 0]);
        assert_eq!(expanded.faces[1].indices, [5, 4, 3]);
    }

    #[test]
    fn channels_use_their_own_indices() {
        let mut mesh = quad();
        mesh.tex_coords[0] = vec![Vec3::new(0.25, 0.5, 0.0), Vec3::new(0.75, 0.5, 0.0)];
        mesh.vertex_colors = vec![Vec4::ONE, Vec4::new(1.0, 0.0, 0.0, 1.0)];
        for face in &mut mesh.faces {
            face.uv_indices[0] = [1, 0, 1];
            face.color_indices = [0, 1, 1];
        }

        let expanded = expand(&mesh);

        assert_eq!(expanded.tex_coords[0][0], Vec3::new(0.75, 0.5, 0.0));
        assert_eq!(expanded.tex_coords[0][1], Vec3::new(0.25, 0.5, 0.0));
        assert!(expanded.tex_coords[1].is_empty());
        assert_eq!(expanded.vertex_colors[4], Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert!(!expanded.has_normals());
    }

    #[test]
    fn missing_bone_data_means_no_weights() {
        let mut mesh = quad();
        mesh.bone_vertices = vec![BoneVertex {
            weights: vec![(0, 1.0)],
        }];

        let expanded = expand(&mesh);

        assert_eq!(expanded.bone_vertices.len(), 6);
        assert_eq!(expanded.bone_vertices[0].weights, vec![(0, 1.0)]);
        assert!(expanded.bone_vertices[1].weights.is_empty());
        assert_eq!(expanded.bone_vertices[3].weights, vec![(0, 1.0)]);
    }

    #[test]
    fn out_of_range_vertex_index_is_rejected() {
        let mut mesh = quad();
        mesh.faces.push(RawFace::new([0, 1, 9]));

        let err = validate(&mesh).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ImportError>(),
            Some(&ImportError::VertexIndexOutOfRange {
                mesh: "Quad".to_owned(),
                face: 2,
                index: 9,
                len: 4,
            })
        );
    }

    #[test]
    fn out_of_range_uv_index_is_rejected() {
        let mut mesh = quad();
        mesh.tex_coords[1] = vec![Vec3::ZERO; 2];

        let err = validate(&mesh).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::TexCoordIndexOutOfRange { channel: 1, .. })
        ));
    }
}
