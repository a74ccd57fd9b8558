//! Block schema
//!
//! A step layout is an ordered list of [`Block`]s. Every block carries an id, an
//! `order` key and an optional style tag; the variant-specific payload lives in
//! [`BlockKind`], a closed set of variants. The JSON codec is hand-written so that
//! fields and `type` tags this crate does not know about survive a round trip.

use crate::domain::error::LayoutError;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of a block, unique for the lifetime of the process
pub type BlockId = String;

/// Partial field set used by `update` intents
pub type BlockPatch = Map<String, Value>;

/// Keys shared by every variant
pub const COMMON_FIELDS: [&str; 3] = ["id", "order", "className"];

/// Generate a fresh block id for a variant tag
pub fn next_block_id(tag: &str) -> BlockId {
    format!("{}-{}", tag, Uuid::new_v4().simple())
}

/// String-valued enum that keeps values outside its known set
///
/// Layouts written by newer renderers may carry values this crate does not
/// know yet; they decode into `Other` and encode back unchanged.
macro_rules! open_string_enum {
    (
        $(#[$meta:meta])*
        $name:ident (default $default:ident) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(raw) => raw.as_str(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                let known = match raw.as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                };
                known.unwrap_or_else(|| $name::Other(raw))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    known => known.as_str().to_string(),
                }
            }
        }
    };
}

open_string_enum! {
    Alignment (default Center) {
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

open_string_enum! {
    ButtonVariant (default Primary) {
        Primary => "primary",
        Secondary => "secondary",
        Outline => "outline",
        Ghost => "ghost",
    }
}

open_string_enum! {
    ButtonSize (default Medium) {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

open_string_enum! {
    /// Input control rendered by a `formField` block
    FieldKind (default Text) {
        Text => "text",
        Email => "email",
        Phone => "phone",
        Number => "number",
        Textarea => "textarea",
        Select => "select",
        Radio => "radio",
        Checkbox => "checkbox",
        Date => "date",
    }
}

impl FieldKind {
    /// Whether the control picks from a fixed list of options
    pub fn has_options(&self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

fn default_heading_level() -> u8 {
    2
}

fn default_spacer_height() -> String {
    "32px".to_string()
}

/// Variant-specific payload of a block
///
/// The `Unknown` variant holds blocks whose `type` tag is not one of ours; their
/// fields are kept in [`Block::extra`] and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockKind {
    Heading {
        #[serde(default)]
        content: String,
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        alignment: Alignment,
    },
    Text {
        #[serde(default)]
        content: String,
        #[serde(default)]
        alignment: Alignment,
    },
    Image {
        #[serde(default)]
        source: String,
        #[serde(default)]
        alt_text: String,
        #[serde(default)]
        alignment: Alignment,
    },
    Button {
        #[serde(default)]
        label: String,
        #[serde(default)]
        visual_variant: ButtonVariant,
        #[serde(default)]
        size: ButtonSize,
        #[serde(default)]
        alignment: Alignment,
        #[serde(default)]
        action_tag: String,
    },
    FormField {
        #[serde(default)]
        field_kind: FieldKind,
        #[serde(default)]
        label: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        data_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<Vec<SelectOption>>,
    },
    Spacer {
        #[serde(default = "default_spacer_height")]
        height: String,
    },
    Divider,
    Card {
        #[serde(default)]
        children: Vec<Block>,
    },
    CustomEditor {
        #[serde(default)]
        editor_kind: String,
    },
    #[serde(skip)]
    Unknown { tag: String },
}

impl BlockKind {
    /// Every tag the schema knows about, in palette order
    pub const TAGS: [&'static str; 9] = [
        "heading",
        "text",
        "image",
        "button",
        "formField",
        "spacer",
        "divider",
        "card",
        "customEditor",
    ];

    pub fn tag(&self) -> &str {
        match self {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Text { .. } => "text",
            BlockKind::Image { .. } => "image",
            BlockKind::Button { .. } => "button",
            BlockKind::FormField { .. } => "formField",
            BlockKind::Spacer { .. } => "spacer",
            BlockKind::Divider => "divider",
            BlockKind::Card { .. } => "card",
            BlockKind::CustomEditor { .. } => "customEditor",
            BlockKind::Unknown { tag } => tag,
        }
    }

    pub fn is_known_tag(tag: &str) -> bool {
        Self::TAGS.contains(&tag)
    }

    /// JSON keys owned by the variant with the given tag
    pub fn fields_for_tag(tag: &str) -> &'static [&'static str] {
        match tag {
            "heading" => &["content", "level", "alignment"],
            "text" => &["content", "alignment"],
            "image" => &["source", "altText", "alignment"],
            "button" => &["label", "visualVariant", "size", "alignment", "actionTag"],
            "formField" => &[
                "fieldKind",
                "label",
                "placeholder",
                "required",
                "dataKey",
                "options",
            ],
            "spacer" => &["height"],
            "card" => &["children"],
            "customEditor" => &["editorKind"],
            _ => &[],
        }
    }

    pub fn field_names(&self) -> &'static [&'static str] {
        Self::fields_for_tag(self.tag())
    }

    /// Whether any known variant owns this key
    pub fn is_variant_field(key: &str) -> bool {
        Self::TAGS
            .iter()
            .any(|tag| Self::fields_for_tag(tag).contains(&key))
    }

    /// Default template for a palette entry
    pub fn template(tag: &str) -> Option<BlockKind> {
        let kind = match tag {
            "heading" => BlockKind::Heading {
                content: "New heading".to_string(),
                level: 2,
                alignment: Alignment::Center,
            },
            "text" => BlockKind::Text {
                content: "Write your text here".to_string(),
                alignment: Alignment::Left,
            },
            "image" => BlockKind::Image {
                source: String::new(),
                alt_text: String::new(),
                alignment: Alignment::Center,
            },
            "button" => BlockKind::Button {
                label: "Continue".to_string(),
                visual_variant: ButtonVariant::Primary,
                size: ButtonSize::Medium,
                alignment: Alignment::Center,
                action_tag: "next_step".to_string(),
            },
            "formField" => BlockKind::FormField {
                field_kind: FieldKind::Text,
                label: "New field".to_string(),
                placeholder: String::new(),
                required: false,
                data_key: "field".to_string(),
                options: None,
            },
            "spacer" => BlockKind::Spacer {
                height: default_spacer_height(),
            },
            "divider" => BlockKind::Divider,
            "card" => BlockKind::Card {
                children: Vec::new(),
            },
            "customEditor" => BlockKind::CustomEditor {
                editor_kind: String::new(),
            },
            _ => return None,
        };
        Some(kind)
    }

    /// Checks value ranges serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BlockKind::Heading { level, .. } if !(1..=6).contains(level) => {
                Err(format!("heading level must be between 1 and 6, got {}", level))
            }
            _ => Ok(()),
        }
    }

    pub fn children(&self) -> Option<&[Block]> {
        match self {
            BlockKind::Card { children } => Some(children),
            _ => None,
        }
    }
}

/// One visual building block of a layout document
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub order: f64,
    /// Opaque style tag handed to the renderer
    pub class_name: Option<String>,
    pub kind: BlockKind,
    /// Fields not owned by the schema, preserved verbatim
    pub extra: Map<String, Value>,
}

impl Block {
    /// Create a block with a fresh id; nested children get fresh ids too
    pub fn new(kind: BlockKind) -> Self {
        let mut block = Self {
            id: String::new(),
            order: 0.0,
            class_name: None,
            kind,
            extra: Map::new(),
        };
        block.reassign_ids();
        block
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn tag(&self) -> &str {
        self.kind.tag()
    }

    /// Give this block and every descendant a fresh id, normalizing child order
    pub fn reassign_ids(&mut self) {
        self.id = next_block_id(self.kind.tag());
        if let BlockKind::Card { children } = &mut self.kind {
            for child in children.iter_mut() {
                child.reassign_ids();
            }
            normalize(children);
        }
    }

    /// This block's id followed by every descendant id, depth first
    pub fn subtree_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.id.as_str()];
        if let Some(children) = self.kind.children() {
            for child in children {
                ids.extend(child.subtree_ids());
            }
        }
        ids
    }

    /// Sort and re-key every nested sibling set below this block
    pub fn normalize_children(&mut self) {
        if let BlockKind::Card { children } = &mut self.kind {
            normalize(children);
            for child in children.iter_mut() {
                child.normalize_children();
            }
        }
    }

    /// Short label for list views
    pub fn summary(&self) -> String {
        let text = match &self.kind {
            BlockKind::Heading { content, .. } | BlockKind::Text { content, .. } => content.clone(),
            BlockKind::Image {
                source, alt_text, ..
            } => {
                if alt_text.is_empty() {
                    source.clone()
                } else {
                    alt_text.clone()
                }
            }
            BlockKind::Button { label, .. } | BlockKind::FormField { label, .. } => label.clone(),
            BlockKind::Spacer { height } => height.clone(),
            BlockKind::Divider => String::new(),
            BlockKind::Card { children } => format!("{} blocks", children.len()),
            BlockKind::CustomEditor { editor_kind } => editor_kind.clone(),
            BlockKind::Unknown { tag } => tag.clone(),
        };
        truncate(&text, 40)
    }

    /// Merge a partial field set into a copy of this block
    ///
    /// Keys that belong to another variant are rejected, unknown keys are kept as
    /// passthrough fields.
    pub fn apply_patch(&self, patch: &BlockPatch) -> Result<Block, LayoutError> {
        let current = self.tag().to_string();
        let own_fields = self.kind.field_names();
        let is_unknown = matches!(self.kind, BlockKind::Unknown { .. });

        for (key, value) in patch {
            if key == "type" {
                if value.as_str() != Some(current.as_str()) {
                    return Err(LayoutError::InvalidVariantTransition {
                        current,
                        field: key.clone(),
                    });
                }
                continue;
            }
            if COMMON_FIELDS.contains(&key.as_str()) || own_fields.contains(&key.as_str()) {
                continue;
            }
            if !is_unknown && BlockKind::is_variant_field(key) {
                return Err(LayoutError::InvalidVariantTransition {
                    current,
                    field: key.clone(),
                });
            }
        }

        let invalid = |reason: String| LayoutError::InvalidFieldValue {
            field: patch.keys().cloned().collect::<Vec<_>>().join(", "),
            reason,
        };

        let mut fields = match serde_json::to_value(self).map_err(|e| invalid(e.to_string()))? {
            Value::Object(fields) => fields,
            _ => return Err(invalid("block did not encode as an object".to_string())),
        };
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))
    }
}

/// Sort a sibling set by `order` and rewrite it to the dense sequence 0..n-1
pub fn normalize(blocks: &mut [Block]) {
    blocks.sort_by(|a, b| a.order.total_cmp(&b.order));
    reindex(blocks);
}

/// Rewrite `order` from array position without sorting
pub fn reindex(blocks: &mut [Block]) {
    for (idx, block) in blocks.iter_mut().enumerate() {
        block.order = idx as f64;
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}…", head)
    }
}

fn order_to_value(order: f64) -> Value {
    if order.is_finite() && order.fract() == 0.0 && order.abs() < 9.0e15 {
        Value::from(order as i64)
    } else {
        serde_json::Number::from_f64(order)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = self.extra.clone();
        match &self.kind {
            BlockKind::Unknown { tag } => {
                map.insert("type".to_string(), Value::String(tag.clone()));
            }
            kind => match serde_json::to_value(kind).map_err(S::Error::custom)? {
                Value::Object(fields) => map.extend(fields),
                _ => return Err(S::Error::custom("block fields must encode as an object")),
            },
        }
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("order".to_string(), order_to_value(self.order));
        if let Some(class_name) = &self.class_name {
            map.insert("className".to_string(), Value::String(class_name.clone()));
        }
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;

        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "block id must be a string, got {}",
                    other
                )))
            }
            None => return Err(D::Error::missing_field("id")),
        };

        let order = match map.remove("order") {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("block order must be a number, got {}", value)))?,
            None => 0.0,
        };

        let class_name = match map.remove("className") {
            Some(Value::String(class_name)) => Some(class_name),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "className must be a string, got {}",
                    other
                )))
            }
        };

        let tag = match map.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Err(D::Error::missing_field("type")),
        };

        if !BlockKind::is_known_tag(&tag) {
            map.remove("type");
            return Ok(Block {
                id,
                order,
                class_name,
                kind: BlockKind::Unknown { tag },
                extra: map,
            });
        }

        let kind: BlockKind =
            serde_json::from_value(Value::Object(map.clone())).map_err(D::Error::custom)?;
        kind.validate().map_err(D::Error::custom)?;

        map.remove("type");
        for field in kind.field_names() {
            map.remove(*field);
        }

        Ok(Block {
            id,
            order,
            class_name,
            kind,
            extra: map,
        })
    }
}
