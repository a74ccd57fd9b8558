use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod validator;

use crate::domain::{LayoutDocument, PageDefaults};
use crate::persistence::PersistenceConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Loaded from `config/layouts`, not from the main settings file
    #[serde(skip)]
    pub layouts: Vec<LayoutPreset>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorSettings {
    pub background_color: String,
    pub container_width: String,
    pub padding: String,
    /// Key of the step array inside a parent record
    pub steps_field: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let page = PageDefaults::default();
        Self {
            background_color: page.background_color,
            container_width: page.container_width,
            padding: page.padding,
            steps_field: "steps".to_string(),
        }
    }
}

impl EditorSettings {
    pub fn page_defaults(&self) -> PageDefaults {
        PageDefaults {
            background_color: self.background_color.clone(),
            container_width: self.container_width.clone(),
            padding: self.padding.clone(),
        }
    }
}

/// Replacement starting layout for one step role
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutPreset {
    pub role: String,
    pub layout: LayoutDocument,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: EditorSettings::default(),
            persistence: PersistenceConfig::default(),
            layouts: Vec::new(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Load `funnelforge.{toml,yaml,json}` and `config/layouts/*` under `root`
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let defaults = Settings::default();
        let config_path = Path::new(root).join("funnelforge");
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("editor.background_color", defaults.editor.background_color)?
            .set_default("editor.container_width", defaults.editor.container_width)?
            .set_default("editor.padding", defaults.editor.padding)?
            .set_default("editor.steps_field", defaults.editor.steps_field)?
            .set_default("persistence.url", defaults.persistence.url)?
            .set_default(
                "persistence.max_connections",
                i64::from(defaults.persistence.max_connections),
            )?
            .set_default("persistence.auto_migrate", defaults.persistence.auto_migrate)?
            .set_default(
                "persistence.connect_timeout_secs",
                defaults.persistence.connect_timeout_secs as i64,
            )?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.load_layouts_from_dir(&format!("{}/config/layouts", root))?;

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(settings)
    }

    fn load_layouts_from_dir(&mut self, path: &str) -> Result<(), anyhow::Error> {
        let pattern = format!("{}/*", path);
        let mut entries: Vec<_> = glob::glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Failed to read glob entry: {}", e);
                    None
                }
            })
            .collect();
        entries.sort();

        for path in entries {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let content = match ext {
                "json" | "yaml" | "yml" | "toml" => std::fs::read_to_string(&path)?,
                _ => continue,
            };
            let preset: LayoutPreset = match ext {
                "json" => serde_json::from_str(&content)?,
                "toml" => toml::from_str(&content)?,
                _ => serde_yaml::from_str(&content)?,
            };
            tracing::debug!(role = %preset.role, file = %path.display(), "Loaded layout preset");
            self.layouts.push(preset);
        }
        Ok(())
    }
}
