//! Vocabulary for the parent records that embed step layouts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of record owning a list of steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    WorkflowTemplate,
    Campaign,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowTemplate => "workflow_template",
            Self::Campaign => "campaign",
        }
    }

    pub fn all() -> &'static [RecordKind] {
        &[Self::WorkflowTemplate, Self::Campaign]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one parent record in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRecordRef {
    pub kind: RecordKind,
    pub id: String,
}

impl ParentRecordRef {
    pub fn new(kind: RecordKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn workflow_template(id: impl Into<String>) -> Self {
        Self::new(RecordKind::WorkflowTemplate, id)
    }

    pub fn campaign(id: impl Into<String>) -> Self {
        Self::new(RecordKind::Campaign, id)
    }
}

impl fmt::Display for ParentRecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Semantic role of a funnel step, used to pick its default layout
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepRole {
    /// Collect the customer's name and phone
    InitialData,
    CustomizeFront,
    CustomizeBack,
    SizeSelection,
    ReviewSubmit,
    Custom(String),
}

impl StepRole {
    pub fn parse(s: &str) -> Self {
        match s {
            "initial_data" => Self::InitialData,
            "customize_front" => Self::CustomizeFront,
            "customize_back" => Self::CustomizeBack,
            "size_selection" => Self::SizeSelection,
            "review_submit" => Self::ReviewSubmit,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::InitialData => "initial_data",
            Self::CustomizeFront => "customize_front",
            Self::CustomizeBack => "customize_back",
            Self::SizeSelection => "size_selection",
            Self::ReviewSubmit => "review_submit",
            Self::Custom(role) => role,
        }
    }
}

impl From<&str> for StepRole {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
