use glam::Vec3;

use crate::{
    expand::{ExpandedFace, ExpandedMesh},
    options::{AssembleOptions, SmoothingMatch},
};

// Projecting onto a skewed axis avoids clustering of axis aligned models.
const SORT_AXIS: Vec3 = Vec3::new(0.8523, 0.34321, 0.5736);

#[derive(Debug, Clone, Copy)]
struct SortEntry {
    vertex: u32,
    position: Vec3,
    distance: f32,
    smoothing_group: u32,
}

/// Face corners sorted by their distance along a fixed axis, which narrows
/// position queries down to a small slice before the exact test.
#[derive(Debug)]
pub struct SpatialSort {
    axis: Vec3,
    entries: Vec<SortEntry>,
}

impl SpatialSort {
    pub fn new(positions: &[Vec3], faces: &[ExpandedFace]) -> Self {
        puffin::profile_function!();

        let axis = SORT_AXIS.normalize();

        let mut entries = Vec::with_capacity(faces.len() * 3);
        for face in faces {
            for &vertex in &face.indices {
                let position = positions[vertex as usize];
                entries.push(SortEntry {
                    vertex,
                    position,
                    distance: position.dot(axis),
                    smoothing_group: face.smoothing_group,
                });
            }
        }
        entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Self { axis, entries }
    }

    /// Collects every corner within `epsilon` of `position` whose smoothing
    /// group matches, plus `vertex` itself.
    pub fn find_positions(
        &self,
        vertex: u32,
        position: Vec3,
        smoothing_group: u32,
        epsilon: f32,
        smoothing: SmoothingMatch,
        results: &mut Vec<u32>,
    ) {
        results.clear();

        let distance = position.dot(self.axis);
        let min_distance = distance - epsilon;
        let max_distance = distance + epsilon;
        let squared_epsilon = epsilon * epsilon;

        let start = self
            .entries
            .partition_point(|entry| entry.distance < min_distance);

        for entry in &self.entries[start..] {
            if entry.distance > max_distance {
                break;
            }

            if entry.vertex == vertex
                || (entry.position.distance_squared(position) <= squared_epsilon
                    && smoothing.matches(entry.smoothing_group, smoothing_group))
            {
                results.push(entry.vertex);
            }
        }
    }
}

fn position_epsilon(positions: &[Vec3], scale: f32) -> f32 {
    let (min, max) = positions.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    (max - min).length() * scale
}

/// Computes smoothed vertex normals if the file did not supply any.
pub fn generate_normals(mesh: &mut ExpandedMesh, options: &AssembleOptions) {
    puffin::profile_function!();

    if mesh.has_normals() || mesh.positions.is_empty() {
        return;
    }

    let mut face_normals = vec![Vec3::ZERO; mesh.positions.len()];
    for face in &mesh.faces {
        // Indices are stored flipped, corner 0 of the source face is last.
        let [i2, i1, i0] = face.indices.map(|i| i as usize);
        let p0 = mesh.positions[i0];
        let p1 = mesh.positions[i1];
        let p2 = mesh.positions[i2];
        let n = (p1 - p0).cross(p2 - p0);

        face_normals[i0] = n;
        face_normals[i1] = n;
        face_normals[i2] = n;
    }

    let epsilon = position_epsilon(&mesh.positions, options.weld_epsilon_scale);
    let sort = SpatialSort::new(&mesh.positions, &mesh.faces);

    let mut normals = vec![Vec3::ZERO; mesh.positions.len()];
    let mut matches = Vec::new();
    for face in &mesh.faces {
        for &vertex in &face.indices {
            sort.find_positions(
                vertex,
                mesh.positions[vertex as usize],
                face.smoothing_group,
                epsilon,
                options.smoothing,
                &mut matches,
            );
            debug_assert!(!matches.is_empty(), "a corner always matches itself");

            let sum: Vec3 = matches.iter().map(|&m| face_normals[m as usize]).sum();
            let normal = (sum / matches.len() as f32).normalize_or_zero();

            normals[vertex as usize] = if normal == Vec3::ZERO {
                face_normals[vertex as usize].normalize_or_zero()
            } else {
                normal
            };
        }
    }

    mesh.normals = normals;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expand::expand,
        raw::{RawFace, RawMesh},
    };

    const EPSILON: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    /// Two triangles meeting at a right angle along the X axis edge.
    fn hinge(group_a: u32, group_b: u32) -> ExpandedMesh {
        let mut mesh = RawMesh::new("Hinge");
        mesh.positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        mesh.faces = vec![
            RawFace::new([0, 1, 2]).with_smoothing_group(group_a),
            RawFace::new([0, 3, 1]).with_smoothing_group(group_b),
        ];
        expand(&mesh)
    }

    #[test]
    fn separate_groups_keep_flat_normals() {
        let mut mesh = hinge(1, 2);
        generate_normals(&mut mesh, &AssembleOptions::default());

        for vertex in 0..3 {
            assert!(approx(mesh.normals[vertex], Vec3::Z));
        }
        for vertex in 3..6 {
            assert!(approx(mesh.normals[vertex], Vec3::Y));
        }
    }

    #[test]
    fn shared_group_averages_coincident_corners() {
        let mut mesh = hinge(1, 1);
        generate_normals(&mut mesh, &AssembleOptions::default());

        let smooth = Vec3::new(0.0, 1.0, 1.0).normalize();
        // Corners at the origin and at (1, 0, 0) are shared.
        assert!(approx(mesh.normals[0], smooth));
        assert!(approx(mesh.normals[1], smooth));
        assert!(approx(mesh.normals[3], smooth));
        assert!(approx(mesh.normals[5], smooth));
        // The tips only see their own face.
        assert!(approx(mesh.normals[2], Vec3::Z));
        assert!(approx(mesh.normals[4], Vec3::Y));
    }

    #[test]
    fn overlapping_masks_smooth_unless_exact() {
        let mut overlap = hinge(0b11, 0b01);
        generate_normals(&mut overlap, &AssembleOptions::default());
        assert!(approx(overlap.normals[0], Vec3::new(0.0, 1.0, 1.0).normalize()));

        let mut exact = hinge(0b11, 0b01);
        let options = AssembleOptions {
            smoothing: SmoothingMatch::Exact,
            ..Default::default()
        };
        generate_normals(&mut exact, &options);
        assert!(approx(exact.normals[0], Vec3::Z));
    }

    #[test]
    fn group_zero_is_faceted() {
        let mut mesh = hinge(0, 0);
        generate_normals(&mut mesh, &AssembleOptions::default());

        assert!(approx(mesh.normals[0], Vec3::Z));
        assert!(approx(mesh.normals[3], Vec3::Y));
    }

    #[test]
    fn regenerating_is_a_no_op() {
        let mut mesh = hinge(1, 1);
        generate_normals(&mut mesh, &AssembleOptions::default());
        let first = mesh.normals.clone();

        generate_normals(&mut mesh, &AssembleOptions::default());
        assert_eq!(first, mesh.normals);
    }

    #[test]
    fn supplied_normals_are_kept() {
        let mut raw = RawMesh::new("Tri");
        raw.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        raw.normals = vec![Vec3::NEG_Z; 3];
        raw.faces = vec![RawFace::new([0, 1, 2])];
        let mut mesh = expand(&raw);

        generate_normals(&mut mesh, &AssembleOptions::default());
        assert!(mesh.normals.iter().all(|n| *n == Vec3::NEG_Z));
    }

    #[test]
    fn spatial_sort_filters_by_distance() {
        let positions = vec![
            Vec3::ZERO,
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(0.5, 0.0, 0.0),
        ];
        let faces = vec![
            ExpandedFace {
                indices: [2, 1, 0],
                sub_material: None,
                smoothing_group: 1,
            },
            ExpandedFace {
                indices: [5, 4, 3],
                sub_material: None,
                smoothing_group: 1,
            },
        ];
        let sort = SpatialSort::new(&positions, &faces);

        let mut results = Vec::new();
        sort.find_positions(0, Vec3::ZERO, 1, 1e-4, SmoothingMatch::BitOverlap, &mut results);
        results.sort_unstable();
        assert_eq!(results, vec![0, 3]);

        sort.find_positions(1, positions[1], 4, 1e-4, SmoothingMatch::BitOverlap, &mut results);
        assert_eq!(results, vec![1]);
    }
}
