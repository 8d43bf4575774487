/// How two faces decide whether they share a smoothing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMatch {
    /// Groups are bit masks, any common bit smooths.
    #[default]
    BitOverlap,
    /// Only identical masks smooth.
    Exact,
}

impl SmoothingMatch {
    pub fn matches(self, a: u32, b: u32) -> bool {
        match self {
            Self::BitOverlap => a & b != 0,
            Self::Exact => a != 0 && a == b,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Run the per-mesh stages on the rayon thread pool.
    pub parallel: bool,
    pub smoothing: SmoothingMatch,
    /// Position welding tolerance relative to the bounding box diagonal.
    pub weld_epsilon_scale: f32,
    pub bake_texture_transforms: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            smoothing: SmoothingMatch::default(),
            weld_epsilon_scale: 1e-5,
            bake_texture_transforms: true,
        }
    }
}
