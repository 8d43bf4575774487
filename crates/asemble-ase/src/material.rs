use std::collections::{BTreeSet, HashMap};

use asemble_model::{
    material::{Material, ShadingModel, TextureKind, TextureSlot, UvTransform},
    mesh::TexCoordChannel,
    MAX_UV_CHANNELS,
};
use glam::{Vec2, Vec3};

use crate::{
    error::{Diagnostic, Diagnostics},
    pending::{MaterialSlot, PendingMesh},
    raw::{ParsedScene, RawMaterial, RawTexture, ShadingMode},
};

pub const DEFAULT_MATERIAL_NAME: &str = "DefaultMaterial";

pub fn default_material() -> RawMaterial {
    RawMaterial {
        name: DEFAULT_MATERIAL_NAME.to_owned(),
        diffuse: Vec3::splat(0.5),
        specular: Vec3::ONE,
        ambient: Vec3::splat(0.05),
        shading: ShadingMode::Gouraud,
        ..Default::default()
    }
}

/// Points every mesh without a material at a shared default material that is
/// appended to the material list. Also adds the default material if the file
/// has no materials at all.
pub fn assign_default_material(scene: &mut ParsedScene) -> Option<u32> {
    puffin::profile_function!();

    let default_index = scene.materials.len() as u32;

    let mut needs_default = false;
    for mesh in scene.meshes.iter_mut().filter(|mesh| !mesh.skip) {
        if mesh.material_index.is_none() {
            mesh.material_index = Some(default_index);
            needs_default = true;
        }
    }

    if needs_default || scene.materials.is_empty() {
        scene.materials.push(default_material());
        Some(default_index)
    } else {
        None
    }
}

/// Material slots referenced by at least one output mesh.
#[derive(Debug, Clone, Default)]
pub struct NeededMaterials {
    slots: BTreeSet<MaterialSlot>,
}

impl NeededMaterials {
    pub fn from_meshes(meshes: &[PendingMesh]) -> Self {
        let mut needed = Self::default();
        for mesh in meshes {
            needed.mark(mesh.slot);
        }
        needed
    }

    pub fn mark(&mut self, slot: MaterialSlot) {
        self.slots.insert(slot);
    }

    pub fn is_needed(&self, slot: MaterialSlot) -> bool {
        self.slots.contains(&slot)
    }
}

/// The flattened material list together with the slot each entry came from.
#[derive(Debug, Clone, Default)]
pub struct FlatMaterials {
    pub materials: Vec<Material>,
    origins: Vec<MaterialSlot>,
    lookup: HashMap<MaterialSlot, u32>,
}

impl FlatMaterials {
    pub fn index_of(&self, slot: MaterialSlot) -> Option<u32> {
        self.lookup.get(&slot).copied()
    }

    /// Slot the flattened material at `index` came from.
    pub fn origin(&self, index: u32) -> Option<MaterialSlot> {
        self.origins.get(index as usize).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.materials.len()
    }

    fn push(&mut self, slot: MaterialSlot, material: Material) {
        self.lookup.insert(slot, self.materials.len() as u32);
        self.origins.push(slot);
        self.materials.push(material);
    }
}

/// Builds the output material list: every needed top level material followed
/// by its needed sub materials, in file order. Unreferenced materials are
/// dropped.
pub fn flatten_materials(
    materials: &[RawMaterial],
    needed: &NeededMaterials,
    ambient_color: Vec3,
) -> FlatMaterials {
    puffin::profile_function!();

    let mut flat = FlatMaterials::default();

    for (material_idx, material) in materials.iter().enumerate() {
        let slot = MaterialSlot::new(material_idx as u32, None);
        if needed.is_needed(slot) {
            flat.push(slot, convert_material(material, ambient_color));
        }

        for (sub_idx, sub_material) in material.sub_materials.iter().enumerate() {
            let slot = MaterialSlot::new(material_idx as u32, Some(sub_idx as u32));
            if needed.is_needed(slot) {
                flat.push(slot, convert_material(sub_material, ambient_color));
            }
        }
    }

    log::debug!(
        "Flattened {} materials into {} used entries",
        materials.len(),
        flat.len()
    );

    flat
}

fn texture_slot(kind: TextureKind, texture: &RawTexture) -> Option<TextureSlot> {
    texture.is_set().then(|| TextureSlot {
        kind,
        path: texture.map_name.clone(),
        blend: (!texture.blend.is_nan()).then_some(texture.blend),
        uv_channel: 0,
        transform: UvTransform {
            scale: texture.scale,
            offset: texture.offset,
            rotation: texture.rotation,
        },
    })
}

pub fn convert_material(raw: &RawMaterial, ambient_color: Vec3) -> Material {
    let mut shading = raw.shading;

    let has_shininess = raw.specular_exponent != 0.0 && raw.shininess_strength != 0.0;
    if !has_shininess
        && matches!(
            shading,
            ShadingMode::Metal | ShadingMode::Phong | ShadingMode::Blinn
        )
    {
        shading = ShadingMode::Gouraud;
    }

    let shading_model = match shading {
        ShadingMode::Flat => ShadingModel::Flat,
        ShadingMode::Phong => ShadingModel::Phong,
        ShadingMode::Blinn => ShadingModel::Blinn,
        ShadingMode::Wire | ShadingMode::Gouraud => ShadingModel::Gouraud,
        ShadingMode::Metal => ShadingModel::CookTorrance,
    };

    let textures = [
        (TextureKind::Diffuse, &raw.diffuse_map),
        (TextureKind::Specular, &raw.specular_map),
        (TextureKind::Opacity, &raw.opacity_map),
        (TextureKind::Emissive, &raw.emissive_map),
        (TextureKind::Ambient, &raw.ambient_map),
        (TextureKind::Height, &raw.bump_map),
        (TextureKind::Shininess, &raw.shininess_map),
    ]
    .into_iter()
    .filter_map(|(kind, texture)| texture_slot(kind, texture))
    .collect();

    Material {
        name: raw.name.clone(),
        ambient: raw.ambient + ambient_color,
        diffuse: raw.diffuse,
        specular: raw.specular,
        emissive: raw.emissive,
        shading: shading_model,
        shininess: has_shininess.then_some(raw.specular_exponent),
        shininess_strength: has_shininess.then_some(raw.shininess_strength),
        opacity: 1.0 - raw.transparency,
        wireframe: shading == ShadingMode::Wire,
        textures,
    }
}

fn highest_channel(mesh: &PendingMesh) -> Option<usize> {
    mesh.vertex_tex_coords
        .iter()
        .rposition(|channel| channel.is_some())
}

fn transform_channel(source: &TexCoordChannel, transform: &UvTransform) -> TexCoordChannel {
    let affine = transform.to_affine();
    let coords = source
        .coords
        .iter()
        .map(|uv| {
            let baked = affine.transform_point2(Vec2::new(uv.x, uv.y));
            Vec3::new(baked.x, baked.y, uv.z)
        })
        .collect();
    TexCoordChannel::new(source.components, coords)
}

/// Bakes the texture transforms of every material into the texture
/// coordinates of the meshes using it and assigns each texture slot the
/// channel it has to sample from.
///
/// The first distinct transform of a material is applied to channel 0 in
/// place, every further distinct transform gets a transformed copy of
/// channel 0 behind the highest channel its meshes already use. If those
/// channels do not fit, the material keeps all of its transforms unbaked
/// and the coordinates stay untouched.
pub fn bake_texture_transforms(
    materials: &mut [Material],
    meshes: &mut [PendingMesh],
    material_indices: &[u32],
    diagnostics: &mut Diagnostics,
) {
    puffin::profile_function!();

    debug_assert_eq!(meshes.len(), material_indices.len());

    for (material_idx, material) in materials.iter_mut().enumerate() {
        if material
            .textures
            .iter()
            .all(|texture| texture.transform.is_identity())
        {
            continue;
        }

        let users: Vec<usize> = material_indices
            .iter()
            .enumerate()
            .filter(|&(_, &index)| index as usize == material_idx)
            .map(|(mesh_idx, _)| mesh_idx)
            .collect();

        let mut distinct: Vec<UvTransform> = Vec::new();
        for texture in &material.textures {
            if !distinct.iter().any(|t| t.approx_eq(&texture.transform)) {
                distinct.push(texture.transform);
            }
        }

        let extra_base = users
            .iter()
            .filter_map(|&mesh_idx| highest_channel(&meshes[mesh_idx]))
            .max()
            .map_or(1, |highest| highest + 1);

        // Channel 0 holds the first transform, the others follow the highest
        // channel in use.
        let channels: Vec<usize> = (0..distinct.len())
            .map(|k| if k == 0 { 0 } else { extra_base + k - 1 })
            .collect();
        if channels.iter().any(|&channel| channel >= MAX_UV_CHANNELS) {
            diagnostics.push(Diagnostic::UvChannelsExhausted {
                material: material.name.clone(),
            });
            continue;
        }

        for &mesh_idx in &users {
            let mesh = &mut meshes[mesh_idx];
            let Some(source) = mesh.vertex_tex_coords[0].clone() else {
                continue;
            };

            for (transform, &channel) in distinct.iter().zip(&channels) {
                mesh.vertex_tex_coords[channel] = Some(transform_channel(&source, transform));
            }
        }

        for texture in &mut material.textures {
            let k = distinct
                .iter()
                .position(|t| t.approx_eq(&texture.transform))
                .unwrap_or_default();
            texture.uv_channel = channels[k] as u32;
            texture.transform = UvTransform::IDENTITY;
        }
    }
}
