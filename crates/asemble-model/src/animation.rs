use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorKey {
    /// Time in source ticks.
    pub time: f64,
    pub value: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey {
    /// Time in source ticks.
    pub time: f64,
    pub value: Quat,
}

/// Keyframes driving a single named node.
#[derive(Debug, Clone, Default)]
pub struct NodeAnimation {
    pub node_name: String,
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
}

impl NodeAnimation {
    pub fn last_key_time(&self) -> f64 {
        let positions = self.position_keys.iter().map(|key| key.time);
        let rotations = self.rotation_keys.iter().map(|key| key.time);
        positions.chain(rotations).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub name: String,
    /// Duration in ticks.
    pub duration: f64,
    pub ticks_per_second: f64,
    pub channels: Vec<NodeAnimation>,
}

impl Animation {
    pub fn channel(&self, node_name: &str) -> Option<&NodeAnimation> {
        self.channels
            .iter()
            .find(|channel| channel.node_name == node_name)
    }

    pub fn duration_in_seconds(&self) -> f64 {
        if self.ticks_per_second > 0.0 {
            self.duration / self.ticks_per_second
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_key_time_spans_both_key_kinds() {
        let channel = NodeAnimation {
            node_name: "Box01".to_owned(),
            position_keys: vec![
                VectorKey { time: 0.0, value: Vec3::ZERO },
                VectorKey { time: 160.0, value: Vec3::X },
            ],
            rotation_keys: vec![
                QuatKey { time: 0.0, value: Quat::IDENTITY },
                QuatKey { time: 320.0, value: Quat::IDENTITY },
            ],
        };
        assert_eq!(channel.last_key_time(), 320.0);

        let animation = Animation {
            name: String::new(),
            duration: 320.0,
            ticks_per_second: 4800.0,
            channels: vec![channel],
        };
        assert!(animation.channel("Box01").is_some());
        assert!((animation.duration_in_seconds() - 320.0 / 4800.0).abs() < 1e-12);
    }
}
