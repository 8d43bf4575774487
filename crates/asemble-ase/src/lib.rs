//! Turns the records of a parsed ASE/ASK scene into a renderable [`Model`].
//!
//! Parsing itself lives behind [`SceneParser`]; everything after it, from
//! vertex expansion to the node tree, happens in [`assemble`].

use anyhow::{anyhow, Result};
use asemble_model::Model;
use rayon::prelude::*;
use uuid::Uuid;

use crate::{
    pending::PendingMesh,
    raw::{ParsedScene, RawMaterial, RawMesh},
};

pub mod animation;
pub mod error;
pub mod expand;
pub mod hierarchy;
pub mod material;
pub mod normals;
pub mod options;
pub mod pending;
pub mod raw;
pub mod split;

pub use error::{Diagnostic, Diagnostics, ImportError};
pub use options::{AssembleOptions, SmoothingMatch};

/// Reads an ASE/ASK file into its raw records.
pub trait SceneParser {
    fn parse(&self, data: &[u8]) -> Result<ParsedScene>;
}

/// Runs the per object stages: expansion, normal generation and the split by
/// material.
fn assemble_mesh(
    source: usize,
    raw: &RawMesh,
    materials: &[RawMaterial],
    options: &AssembleOptions,
) -> Result<(Vec<PendingMesh>, Diagnostics)> {
    puffin::profile_function!();

    let mut diagnostics = Diagnostics::new();

    expand::validate(raw)?;
    let mut expanded = expand::expand(raw);
    normals::generate_normals(&mut expanded, options);

    let material_index = split::resolve_material_index(raw, materials.len(), &mut diagnostics);
    let meshes = split::split_by_material(
        source,
        raw,
        &expanded,
        material_index,
        &materials[material_index as usize],
        &mut diagnostics,
    );

    Ok((meshes, diagnostics))
}

/// Assembles a parsed scene into a [`Model`].
///
/// Recoverable problems are collected into the returned [`Diagnostics`].
/// Fails with an [`ImportError`] if an object indexes outside of its vertex
/// pools or if no object ends up in the node tree.
pub fn assemble(mut scene: ParsedScene, options: &AssembleOptions) -> Result<(Model, Diagnostics)> {
    puffin::profile_function!();

    material::assign_default_material(&mut scene);

    let mut diagnostics = Diagnostics::new();

    let per_mesh: Vec<(Vec<PendingMesh>, Diagnostics)> = {
        puffin::profile_scope!("meshes");

        let materials = &scene.materials;
        if options.parallel {
            scene
                .meshes
                .par_iter()
                .enumerate()
                .filter(|(_, raw)| !raw.skip)
                .map(|(source, raw)| assemble_mesh(source, raw, materials, options))
                .collect::<Result<_>>()?
        } else {
            scene
                .meshes
                .iter()
                .enumerate()
                .filter(|(_, raw)| !raw.skip)
                .map(|(source, raw)| assemble_mesh(source, raw, materials, options))
                .collect::<Result<_>>()?
        }
    };

    let mut meshes = Vec::new();
    for (mesh_meshes, mesh_diagnostics) in per_mesh {
        meshes.extend(mesh_meshes);
        diagnostics.merge(mesh_diagnostics);
    }
    meshes.retain(|mesh| mesh.num_faces() > 0);

    let needed = material::NeededMaterials::from_meshes(&meshes);
    let mut flat = material::flatten_materials(&scene.materials, &needed, scene.ambient_color);

    let material_indices = meshes
        .iter()
        .map(|mesh| {
            flat.index_of(mesh.slot).ok_or_else(|| {
                anyhow!(
                    "Material {:?} of mesh `{}` was not flattened",
                    mesh.slot,
                    mesh.name
                )
            })
        })
        .collect::<Result<Vec<u32>>>()?;

    if options.bake_texture_transforms {
        material::bake_texture_transforms(
            &mut flat.materials,
            &mut meshes,
            &material_indices,
            &mut diagnostics,
        );
    }

    let nodes = hierarchy::build_hierarchy(&scene.meshes, &mut meshes, &mut diagnostics)?;

    let animations = animation::build_animation(
        &scene.meshes,
        scene.frame_speed,
        scene.ticks_per_frame,
    )
    .into_iter()
    .collect();

    let meshes = meshes
        .into_iter()
        .zip(material_indices)
        .map(|(mesh, material_index)| mesh.finish(material_index))
        .collect::<Vec<_>>();

    let model = Model {
        uuid: Uuid::new_v4(),
        root_node: 0,
        nodes,
        meshes,
        materials: flat.materials,
        animations,
    };

    log::info!(
        "Assembled model with {} meshes, {} materials and {} nodes ({} diagnostics)",
        model.meshes.len(),
        model.materials.len(),
        model.nodes.len(),
        diagnostics.len()
    );

    Ok((model, diagnostics))
}

/// Parses and assembles a scene in one go.
pub fn import<P: SceneParser>(
    parser: &P,
    data: &[u8],
    options: &AssembleOptions,
) -> Result<(Model, Diagnostics)> {
    puffin::profile_function!();

    let scene = parser.parse(data)?;
    assemble(scene, options)
}
