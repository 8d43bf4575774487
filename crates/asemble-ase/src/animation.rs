use asemble_model::animation::{Animation, NodeAnimation};

use crate::raw::RawMesh;

/// Collects the keyframes of all animated objects into a single animation.
///
/// Returns `None` if no object has more than one key of either kind.
pub fn build_animation(
    raw_meshes: &[RawMesh],
    frame_speed: u32,
    ticks_per_frame: u32,
) -> Option<Animation> {
    puffin::profile_function!();

    let channels: Vec<NodeAnimation> = raw_meshes
        .iter()
        .filter(|mesh| !mesh.skip && mesh.has_animation())
        .map(|mesh| {
            let keys = &mesh.animation;

            let mut channel = NodeAnimation {
                node_name: mesh.name.clone(),
                ..Default::default()
            };
            if keys.position_keys.len() > 1 {
                channel.position_keys = keys.position_keys.clone();
            }
            if keys.rotation_keys.len() > 1 {
                channel.rotation_keys = keys.rotation_keys.clone();
            }
            channel
        })
        .collect();

    if channels.is_empty() {
        return None;
    }

    let duration = channels
        .iter()
        .map(NodeAnimation::last_key_time)
        .fold(0.0, f64::max);

    log::debug!(
        "Built animation with {} channels spanning {} ticks",
        channels.len(),
        duration
    );

    Some(Animation {
        name: String::new(),
        duration,
        ticks_per_second: frame_speed as f64 * ticks_per_frame as f64,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use asemble_model::animation::{QuatKey, VectorKey};
    use glam::{Quat, Vec3};

    use super::*;

    fn position_keys(times: &[f64]) -> Vec<VectorKey> {
        times
            .iter()
            .map(|&time| VectorKey {
                time,
                value: Vec3::splat(time as f32),
            })
            .collect()
    }

    fn rotation_keys(times: &[f64]) -> Vec<QuatKey> {
        times
            .iter()
            .map(|&time| QuatKey {
                time,
                value: Quat::from_rotation_y(time as f32 * 0.001),
            })
            .collect()
    }

    #[test]
    fn static_scene_has_no_animation() {
        let mut still = RawMesh::new("Still");
        still.animation.position_keys = position_keys(&[0.0]);

        assert!(build_animation(&[still, RawMesh::new("Empty")], 30, 160).is_none());
    }

    #[test]
    fn animated_objects_get_one_channel_each() {
        let mut mover = RawMesh::new("Mover");
        mover.animation.position_keys = position_keys(&[0.0, 160.0, 320.0]);
        mover.animation.rotation_keys = rotation_keys(&[0.0]);

        let mut spinner = RawMesh::new("Spinner");
        spinner.animation.rotation_keys = rotation_keys(&[0.0, 480.0]);

        let mut hidden = RawMesh::new("Hidden");
        hidden.animation.position_keys = position_keys(&[0.0, 960.0]);
        hidden.skip = true;

        let animation =
            build_animation(&[mover, RawMesh::new("Still"), spinner, hidden], 30, 160).unwrap();

        assert_eq!(animation.channels.len(), 2);
        assert_eq!(animation.duration, 480.0);
        assert_eq!(animation.ticks_per_second, 4800.0);

        let mover = animation.channel("Mover").unwrap();
        assert_eq!(mover.position_keys.len(), 3);
        // A single key is not an animation.
        assert!(mover.rotation_keys.is_empty());

        let spinner = animation.channel("Spinner").unwrap();
        assert!(spinner.position_keys.is_empty());
        assert_eq!(spinner.rotation_keys, rotation_keys(&[0.0, 480.0]));
    }
}
