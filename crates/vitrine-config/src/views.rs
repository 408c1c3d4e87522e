// ── View definitions ──
//
// A view is a named `CrudConfig` plus optional seed records for demo
// mode. Built-in views ship with the binary; a user `views.toml` merges
// over them (same-named views are overridden key by key).

use std::path::Path;
use std::sync::Arc;

use figment::{
    Figment,
    providers::{Format, Toml},
};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use vitrine_core::{CrudConfig, Entity};

use crate::ConfigError;

const BUILTIN: &str = include_str!("../views/builtin.toml");

#[derive(Debug, Deserialize)]
struct ViewFile {
    #[serde(default)]
    views: IndexMap<String, ViewDef>,
}

#[derive(Debug, Deserialize)]
struct ViewDef {
    #[serde(flatten)]
    config: CrudConfig,
    #[serde(default)]
    seed: Vec<Entity>,
}

/// One administrable entity type.
#[derive(Debug, Clone)]
pub struct View {
    /// Lookup key (`products`).
    pub key: String,
    pub config: Arc<CrudConfig>,
    /// Records served by the in-memory backend in demo mode.
    pub seed: Vec<Entity>,
}

/// Every known view, in definition order.
#[derive(Debug, Clone, Default)]
pub struct ViewSet {
    views: IndexMap<String, View>,
}

impl ViewSet {
    pub fn get(&self, key: &str) -> Result<&View, ConfigError> {
        self.views.get(key).ok_or_else(|| ConfigError::UnknownView {
            name: key.to_owned(),
            available: self.keys().collect::<Vec<_>>().join(", "),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Override every view's page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        for view in self.views.values_mut() {
            Arc::make_mut(&mut view.config).page_size = page_size;
        }
        self
    }

    fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let file: ViewFile = figment.extract()?;
        let mut views = IndexMap::with_capacity(file.views.len());
        for (key, def) in file.views {
            def.config.validate().map_err(|e| ConfigError::InvalidView {
                name: key.clone(),
                reason: e.to_string(),
            })?;
            views.insert(
                key.clone(),
                View {
                    key,
                    config: Arc::new(def.config),
                    seed: def.seed,
                },
            );
        }
        Ok(Self { views })
    }
}

/// The views shipped with the binary (products, services, applications).
pub fn builtin_views() -> Result<ViewSet, ConfigError> {
    ViewSet::from_figment(&Figment::from(Toml::string(BUILTIN)))
}

/// Built-in views merged with `path`, when given and present.
pub fn load_views(path: Option<&Path>) -> Result<ViewSet, ConfigError> {
    let mut figment = Figment::from(Toml::string(BUILTIN));
    if let Some(path) = path {
        if path.exists() {
            debug!(path = %path.display(), "loading view definitions");
            figment = figment.merge(Toml::file(path));
        } else {
            debug!(path = %path.display(), "no view definitions file, using built-ins");
        }
    }
    ViewSet::from_figment(&figment)
}

/// Built-in views merged with inline TOML.
pub fn load_views_from_str(toml: &str) -> Result<ViewSet, ConfigError> {
    let figment = Figment::from(Toml::string(BUILTIN)).merge(Toml::string(toml));
    ViewSet::from_figment(&figment)
}
