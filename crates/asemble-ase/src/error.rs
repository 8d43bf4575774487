use thiserror::Error;

/// Conditions that abort the whole import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("No nodes loaded. The ASE/ASK file is either empty or corrupt")]
    NoHierarchy,

    #[error("Mesh `{mesh}` face {face}: vertex index {index} out of range ({len} positions)")]
    VertexIndexOutOfRange {
        mesh: String,
        face: usize,
        index: u32,
        len: usize,
    },

    #[error(
        "Mesh `{mesh}` face {face}: UV index {index} of channel {channel} out of range ({len} UVs)"
    )]
    TexCoordIndexOutOfRange {
        mesh: String,
        face: usize,
        channel: usize,
        index: u32,
        len: usize,
    },

    #[error("Mesh `{mesh}` face {face}: vertex color index {index} out of range ({len} colors)")]
    ColorIndexOutOfRange {
        mesh: String,
        face: usize,
        index: u32,
        len: usize,
    },
}

fn sub_material_label(index: &Option<u32>) -> String {
    index.map_or_else(|| "none".to_owned(), |index| index.to_string())
}

/// Anomalies the pipeline recovered from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("Material index {index} of mesh `{mesh}` is out of range, using {clamped}")]
    MaterialIndexOutOfRange {
        mesh: String,
        index: u32,
        clamped: u32,
    },

    #[error(
        "Face {face} in mesh `{mesh}` has submaterial index {}, using {clamped}",
        sub_material_label(.index)
    )]
    SubMaterialIndexOutOfRange {
        mesh: String,
        face: usize,
        index: Option<u32>,
        clamped: u32,
    },

    #[error("Mesh `{mesh}` references unknown bone {bone}")]
    BoneIndexOutOfRange { mesh: String, bone: u32 },

    #[error("Parent `{parent}` of mesh `{mesh}` is unknown, attaching to the root")]
    UnresolvedParent { mesh: String, parent: String },

    #[error("Mesh `{mesh}` is part of a parent cycle, attaching to the root")]
    ParentCycle { mesh: String },

    #[error("Node matrix of mesh `{mesh}` is not invertible, vertices stay untouched")]
    SingularTransform { mesh: String },

    #[error("Out of texture coordinate channels to bake the transforms of `{material}`")]
    UvChannelsExhausted { material: String },
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    /// Appends diagnostics that were already logged by a worker.
    pub(crate) fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_render_their_context() {
        let missing = Diagnostic::SubMaterialIndexOutOfRange {
            mesh: "Box01".to_owned(),
            face: 4,
            index: None,
            clamped: 2,
        };
        assert_eq!(
            missing.to_string(),
            "Face 4 in mesh `Box01` has submaterial index none, using 2"
        );

        let out_of_range = Diagnostic::SubMaterialIndexOutOfRange {
            mesh: "Box01".to_owned(),
            face: 4,
            index: Some(9),
            clamped: 2,
        };
        assert!(out_of_range.to_string().contains("index 9"));

        let mut diagnostics = Diagnostics::new();
        diagnostics.push(out_of_range.clone());
        let as_error: &dyn std::error::Error = &diagnostics.entries()[0];
        assert_eq!(as_error.to_string(), out_of_range.to_string());
    }
}
