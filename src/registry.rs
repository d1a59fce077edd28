use crate::adapters::BUILTIN_ADAPTERS;
use crate::config::NormalizerConfig;
use crate::error::ConfigError;
use crate::pipeline::{AdapterSpec, Pipeline};
use std::sync::Arc;

/// Every adapter known to this process, by name.
///
/// Built once from the built-in constructor list plus user adapters from the
/// configuration file, then passed to whoever needs to look adapters up.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    specs: Vec<AdapterSpec>,
    multiline_max_lines: Option<usize>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for constructor in BUILTIN_ADAPTERS {
            registry.register(constructor());
        }
        registry
    }

    /// Built-ins plus the configuration's adapters; a user adapter replaces
    /// the built-in of the same name.
    pub fn from_config(config: &NormalizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut registry = Self::builtin();
        registry.multiline_max_lines = config.multiline_max_lines;
        for spec in &config.adapters {
            if registry.register(spec.clone()).is_some() {
                tracing::info!(adapter = %spec.name, "user adapter overrides built-in");
            }
        }
        Ok(registry)
    }

    /// Add `spec`, returning the adapter it replaced
    pub fn register(&mut self, spec: AdapterSpec) -> Option<AdapterSpec> {
        match self.specs.iter_mut().find(|existing| existing.name == spec.name) {
            Some(existing) => Some(std::mem::replace(existing, spec)),
            None => {
                self.specs.push(spec);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AdapterSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name.as_str()).collect()
    }

    pub fn specs(&self) -> impl Iterator<Item = &AdapterSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Compile the named adapter
    pub fn pipeline(&self, name: &str) -> Result<Arc<Pipeline>, ConfigError> {
        let spec = self.get(name).ok_or_else(|| ConfigError::UnknownAdapter {
            name: name.to_string(),
        })?;
        let pipeline = Pipeline::build(spec)?.with_max_lines(self.multiline_max_lines);
        Ok(Arc::new(pipeline))
    }

    /// Build every adapter, pairing each name with its outcome
    pub fn check_all(&self) -> Vec<(String, Result<(), ConfigError>)> {
        self.specs
            .iter()
            .map(|spec| (spec.name.clone(), Pipeline::build(spec).map(|_| ())))
            .collect()
    }
}
