//! Layout document: the ordered blocks of one funnel step plus page settings

use crate::domain::block::{normalize, Block, BlockKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page-level defaults applied to new documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefaults {
    pub background_color: String,
    pub container_width: String,
    pub padding: String,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            container_width: "480px".to_string(),
            padding: "24px".to_string(),
        }
    }
}

/// Header shown above the step: logo, step counter and progress bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressIndicator {
    #[serde(default)]
    pub show_logo: bool,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default = "default_logo_height")]
    pub logo_height: String,
    #[serde(default = "default_true")]
    pub show_step_numbers: bool,
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub total_steps: u32,
}

fn default_logo_height() -> String {
    "40px".to_string()
}

fn default_true() -> bool {
    true
}

impl ProgressIndicator {
    pub fn new(current_step: u32, total_steps: u32) -> Self {
        Self {
            show_logo: false,
            logo_url: String::new(),
            logo_height: default_logo_height(),
            show_step_numbers: true,
            show_progress_bar: true,
            current_step,
            total_steps,
        }
    }
}

fn default_container_width() -> String {
    PageDefaults::default().container_width
}

fn default_padding() -> String {
    PageDefaults::default().padding
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(rename = "components", default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub background_color: String,
    #[serde(default = "default_container_width")]
    pub container_width: String,
    #[serde(default = "default_padding")]
    pub padding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_indicator: Option<ProgressIndicator>,
}

impl Default for LayoutDocument {
    fn default() -> Self {
        Self::empty(&PageDefaults::default())
    }
}

impl LayoutDocument {
    pub fn empty(page: &PageDefaults) -> Self {
        Self {
            blocks: Vec::new(),
            background_color: page.background_color.clone(),
            container_width: page.container_width.clone(),
            padding: page.padding.clone(),
            progress_indicator: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressIndicator) -> Self {
        self.progress_indicator = Some(progress);
        self
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Number of top-level blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Find a block anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&Block> {
        find_in(&self.blocks, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Every block id, depth first
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        collect_ids(&self.blocks, &mut ids);
        ids
    }

    /// Sort and re-key every sibling set
    pub fn normalized(mut self) -> Self {
        normalize_tree(&mut self.blocks);
        self
    }

    /// Equality that ignores block ids
    pub fn structural_eq(&self, other: &LayoutDocument) -> bool {
        self.background_color == other.background_color
            && self.container_width == other.container_width
            && self.padding == other.padding
            && self.progress_indicator == other.progress_indicator
            && blocks_structurally_eq(&self.blocks, &other.blocks)
    }
}

fn find_in<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    for block in blocks {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = block.kind.children().and_then(|c| find_in(c, id)) {
            return Some(found);
        }
    }
    None
}

fn collect_ids<'a>(blocks: &'a [Block], ids: &mut Vec<&'a str>) {
    for block in blocks {
        ids.push(block.id.as_str());
        if let Some(children) = block.kind.children() {
            collect_ids(children, ids);
        }
    }
}

fn normalize_tree(blocks: &mut [Block]) {
    normalize(blocks);
    for block in blocks.iter_mut() {
        block.normalize_children();
    }
}

fn blocks_structurally_eq(a: &[Block], b: &[Block]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            let kinds_match = match (&x.kind, &y.kind) {
                (BlockKind::Card { children: cx }, BlockKind::Card { children: cy }) => {
                    blocks_structurally_eq(cx, cy)
                }
                (kx, ky) => kx == ky,
            };
            kinds_match && x.order == y.order && x.class_name == y.class_name && x.extra == y.extra
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::{Alignment, FieldKind};
    use serde_json::json;

    #[test]
    fn test_document_wire_shape() {
        let raw = json!({
            "components": [
                {"id": "a", "type": "heading", "order": 0, "content": "Oi", "level": 2, "alignment": "center"},
                {"id": "b", "type": "divider", "order": 1}
            ],
            "backgroundColor": "",
            "containerWidth": "600px",
            "padding": "16px",
            "progressIndicator": {
                "showLogo": true, "logoUrl": "https://x/logo.png", "logoHeight": "32px",
                "showStepNumbers": false, "showProgressBar": true,
                "currentStep": 1, "totalSteps": 4
            }
        });

        let document = LayoutDocument::from_value(raw.clone()).unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(document.progress_indicator.as_ref().unwrap().total_steps, 4);
        assert_eq!(document.to_value().unwrap(), raw);
    }

    #[test]
    fn test_unrecognized_enum_values_survive_load() {
        let raw = json!({
            "components": [
                {"id": "t", "type": "text", "order": 0, "content": "Oi", "alignment": "justify"},
                {
                    "id": "f", "type": "formField", "order": 1, "fieldKind": "tel",
                    "label": "Telefone", "placeholder": "", "required": true, "dataKey": "phone"
                },
                {
                    "id": "b", "type": "button", "order": 2, "label": "Ir",
                    "visualVariant": "link", "size": "xl", "alignment": "left", "actionTag": "next_step"
                }
            ],
            "backgroundColor": "",
            "containerWidth": "480px",
            "padding": "24px"
        });

        let document = LayoutDocument::from_value(raw.clone()).unwrap();
        match &document.blocks[1].kind {
            BlockKind::FormField { field_kind, .. } => {
                assert_eq!(field_kind, &FieldKind::Other("tel".to_string()));
                assert!(!field_kind.has_options());
            }
            other => panic!("expected form field, got {:?}", other),
        }
        match &document.blocks[2].kind {
            BlockKind::Button { alignment, .. } => assert_eq!(alignment, &Alignment::Left),
            other => panic!("expected button, got {:?}", other),
        }
        assert_eq!(document.to_value().unwrap(), raw);
    }

    #[test]
    fn test_progress_indicator_omitted() {
        let document = LayoutDocument::default();
        let value = document.to_value().unwrap();
        assert!(value.get("progressIndicator").is_none());
        assert_eq!(value["components"], json!([]));
    }

    #[test]
    fn test_find_nested() {
        let child = Block::new(BlockKind::Divider);
        let child_id = child.id.clone();
        let mut document = LayoutDocument::default();
        document.blocks.push(Block::new(BlockKind::Card {
            children: vec![child],
        }));

        // Block::new re-keys children, so look the id up again.
        let nested_id = document.blocks[0].kind.children().unwrap()[0].id.clone();
        assert_ne!(nested_id, child_id);
        assert!(document.contains(&nested_id));
        assert_eq!(document.ids().len(), 2);
    }

    #[test]
    fn test_structural_eq_ignores_ids() {
        let build = || {
            let mut document = LayoutDocument::default();
            document.blocks.push(Block::new(BlockKind::template("heading").unwrap()));
            document.blocks.push(Block::new(BlockKind::template("button").unwrap()));
            document.normalized()
        };
        let a = build();
        let b = build();
        assert_ne!(a, b);
        assert!(a.structural_eq(&b));
    }

    #[test]
    fn test_normalized_sorts_by_order() {
        let mut document = LayoutDocument::default();
        for order in [2.0, 0.0, 1.0] {
            let mut block = Block::new(BlockKind::Divider);
            block.order = order;
            document.blocks.push(block);
        }
        let first = document.blocks[1].id.clone();
        let document = document.normalized();
        assert_eq!(document.blocks[0].id, first);
        let orders: Vec<f64> = document.blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0.0, 1.0, 2.0]);
    }
}
