use std::collections::HashSet;
use thiserror::Error;

use crate::config::{EditorSettings, LayoutPreset, Settings};
use crate::domain::Block;
use crate::persistence::{DatabaseBackend, PersistenceConfig};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Check every section, collecting all problems rather than stopping at the first
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        errors.extend(Self::validate_editor(&settings.editor));
        errors.extend(Self::validate_persistence(&settings.persistence));
        errors.extend(Self::validate_layouts(&settings.layouts));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_editor(editor: &EditorSettings) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        // An empty background colour means "let the renderer decide".
        for (field, value) in [
            ("editor.container_width", &editor.container_width),
            ("editor.padding", &editor.padding),
            ("editor.steps_field", &editor.steps_field),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::MissingField(field.to_string()));
            }
        }
        errors
    }

    fn validate_persistence(persistence: &PersistenceConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if persistence.url.is_empty() {
            errors.push(ValidationError::MissingField("persistence.url".to_string()));
        } else if let Err(e) = DatabaseBackend::from_url(&persistence.url) {
            errors.push(ValidationError::InvalidValue {
                field: "persistence.url".to_string(),
                reason: e.to_string(),
            });
        }

        if persistence.max_connections == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "persistence.max_connections".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        errors
    }

    fn validate_layouts(layouts: &[LayoutPreset]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut roles = HashSet::new();

        for preset in layouts {
            if preset.role.is_empty() {
                errors.push(ValidationError::MissingField("layouts.role".to_string()));
                continue;
            }
            if !roles.insert(preset.role.as_str()) {
                errors.push(ValidationError::Duplicate(format!(
                    "Layout preset for role '{}'",
                    preset.role
                )));
            }

            let field = format!("layouts.{}", preset.role);
            let mut ids = HashSet::new();
            check_blocks(&preset.layout.blocks, &field, &mut ids, &mut errors);
        }

        errors
    }
}

fn check_blocks<'a>(
    blocks: &'a [Block],
    field: &str,
    ids: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    for block in blocks {
        if !ids.insert(block.id.as_str()) {
            errors.push(ValidationError::Duplicate(format!(
                "Block id '{}' in {}",
                block.id, field
            )));
        }
        if let Err(reason) = block.kind.validate() {
            errors.push(ValidationError::InvalidValue {
                field: format!("{}.{}", field, block.id),
                reason,
            });
        }
        if let Some(children) = block.kind.children() {
            check_blocks(children, field, ids, errors);
        }
    }
}
