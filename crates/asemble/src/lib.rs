use std::{collections::HashMap, fs, sync::Arc};

use anyhow::Result;

pub use asemble_ase as ase;
pub use asemble_ase::{AssembleOptions, Diagnostic, Diagnostics, ImportError, SceneParser};
pub use asemble_model as model;
pub use asemble_model::Model;

struct LoadedModel {
    model: Arc<Model>,
    diagnostics: Diagnostics,
}

/// Imports ASE/ASK files through a [`SceneParser`] and keeps every assembled
/// model around by path.
pub struct Asemble<P: SceneParser> {
    parser: P,
    options: AssembleOptions,
    models: HashMap<String, LoadedModel>,
}

impl<P: SceneParser> Asemble<P> {
    pub fn new(parser: P) -> Self {
        Self::with_options(parser, AssembleOptions::default())
    }

    pub fn with_options(parser: P, options: AssembleOptions) -> Self {
        Self {
            parser,
            options,
            models: HashMap::new(),
        }
    }

    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    pub fn get(&mut self, path: &str) -> Result<Arc<Model>> {
        puffin::profile_function!();

        if let Some(loaded) = self.models.get(path) {
            Ok(loaded.model.clone())
        } else {
            let data = fs::read(path)?;
            self.load(path, &data)
        }
    }

    pub fn load(&mut self, path: &str, data: &[u8]) -> Result<Arc<Model>> {
        puffin::profile_function!();

        if let Some(loaded) = self.models.get(path) {
            return Ok(loaded.model.clone());
        }

        let (model, diagnostics) = asemble_ase::import(&self.parser, data, &self.options)?;
        if !diagnostics.is_empty() {
            log::info!("Imported `{path}` with {} diagnostics", diagnostics.len());
        }

        let model = Arc::new(model);
        self.models.insert(
            path.to_owned(),
            LoadedModel {
                model: model.clone(),
                diagnostics,
            },
        );
        Ok(model)
    }

    /// Diagnostics recorded while importing `path`.
    pub fn diagnostics(&self, path: &str) -> Option<&Diagnostics> {
        self.models.get(path).map(|loaded| &loaded.diagnostics)
    }

    pub fn evict(&mut self, path: &str) -> Option<Arc<Model>> {
        self.models.remove(path).map(|loaded| loaded.model)
    }
}
