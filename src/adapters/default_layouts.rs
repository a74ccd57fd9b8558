//! Default-Layout Factory
//!
//! Produces the starting document for a step that has never been saved. The
//! block content depends only on the step role (and the label for roles that
//! show it); block ids are fresh on every call.

use crate::config::{LayoutPreset, Settings};
use crate::domain::{
    Alignment, Block, BlockKind, ButtonSize, ButtonVariant, FieldKind, LayoutDocument,
    PageDefaults, SelectOption, StepRole,
};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DefaultLayoutFactory {
    page: PageDefaults,
    presets: HashMap<String, LayoutDocument>,
}

impl DefaultLayoutFactory {
    pub fn new(page: PageDefaults) -> Self {
        Self {
            page,
            presets: HashMap::new(),
        }
    }

    /// Presets replace the built-in layout for their role
    pub fn with_presets(mut self, presets: impl IntoIterator<Item = LayoutPreset>) -> Self {
        for preset in presets {
            self.presets.insert(preset.role, preset.layout);
        }
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.editor.page_defaults()).with_presets(settings.layouts.iter().cloned())
    }

    pub fn page(&self) -> &PageDefaults {
        &self.page
    }

    pub fn synthesize(&self, role: &StepRole, label: &str) -> LayoutDocument {
        if let Some(preset) = self.presets.get(role.as_str()) {
            debug!(role = role.as_str(), "Using configured layout preset");
            let mut document = preset.clone();
            for block in &mut document.blocks {
                block.reassign_ids();
            }
            return document.normalized();
        }

        let blocks = match role {
            StepRole::InitialData => initial_data(label),
            StepRole::CustomizeFront => customize("front_editor", label),
            StepRole::CustomizeBack => customize("back_editor", label),
            StepRole::SizeSelection => size_selection(label),
            StepRole::ReviewSubmit => review_submit(label),
            StepRole::Custom(other) => {
                debug!(role = other.as_str(), "No default layout for role, using heading only");
                vec![heading(label)]
            }
        };

        let mut document = LayoutDocument::empty(&self.page);
        document.blocks = blocks.into_iter().map(Block::new).collect();
        document.normalized()
    }
}

fn heading(label: &str) -> BlockKind {
    BlockKind::Heading {
        content: label.to_string(),
        level: 2,
        alignment: Alignment::Center,
    }
}

fn text(content: &str) -> BlockKind {
    BlockKind::Text {
        content: content.to_string(),
        alignment: Alignment::Center,
    }
}

fn button(label: &str, action: &str) -> BlockKind {
    BlockKind::Button {
        label: label.to_string(),
        visual_variant: ButtonVariant::Primary,
        size: ButtonSize::Large,
        alignment: Alignment::Center,
        action_tag: action.to_string(),
    }
}

fn field(kind: FieldKind, label: &str, placeholder: &str, data_key: &str) -> BlockKind {
    BlockKind::FormField {
        field_kind: kind,
        label: label.to_string(),
        placeholder: placeholder.to_string(),
        required: true,
        data_key: data_key.to_string(),
        options: None,
    }
}

fn initial_data(label: &str) -> Vec<BlockKind> {
    vec![
        heading(label),
        text("Preencha seus dados para continuar"),
        field(FieldKind::Text, "Nome completo", "Digite seu nome", "name"),
        field(FieldKind::Phone, "WhatsApp", "(00) 00000-0000", "phone"),
        button("Continuar", "next_step"),
    ]
}

fn customize(editor_kind: &str, label: &str) -> Vec<BlockKind> {
    vec![
        heading(label),
        BlockKind::CustomEditor {
            editor_kind: editor_kind.to_string(),
        },
        button("Continuar", "next_step"),
    ]
}

fn size_selection(label: &str) -> Vec<BlockKind> {
    let options = ["P", "M", "G", "GG"]
        .into_iter()
        .map(|size| SelectOption::new(size, size))
        .collect();
    vec![
        heading(label),
        BlockKind::FormField {
            field_kind: FieldKind::Select,
            label: "Tamanho".to_string(),
            placeholder: "Selecione o tamanho".to_string(),
            required: true,
            data_key: "size".to_string(),
            options: Some(options),
        },
        button("Continuar", "next_step"),
    ]
}

fn review_submit(label: &str) -> Vec<BlockKind> {
    vec![
        heading(label),
        BlockKind::CustomEditor {
            editor_kind: "order_summary".to_string(),
        },
        BlockKind::Divider,
        BlockKind::FormField {
            field_kind: FieldKind::Checkbox,
            label: "Li e aceito os termos".to_string(),
            placeholder: String::new(),
            required: true,
            data_key: "terms".to_string(),
            options: None,
        },
        button("Enviar pedido", "submit"),
    ]
}
