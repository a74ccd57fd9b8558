//! # FunnelForge - step layout editing core
//!
//! Page-layout documents for funnel steps: a typed block schema with a lossless
//! JSON codec, a pure mutation engine that keeps block order dense, a selection
//! controller shared by the list and canvas views, default layouts per step
//! role, and persistence of each step's layout inside its parent workflow
//! template or campaign record.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use funnelforge::adapters::{LayoutEditor, LayoutService};
//! use funnelforge::config::Settings;
//! use funnelforge::domain::ParentRecordRef;
//! use funnelforge::persistence::DataStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let store = DataStore::new(&settings.persistence).await?;
//!     let service = LayoutService::from_settings(store.records(), &settings);
//!
//!     let mut editor =
//!         LayoutEditor::open(service, ParentRecordRef::campaign("summer"), "step-1").await?;
//!     editor.add_tag("heading");
//!     editor.save().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: block schema, layout documents, parent-record vocabulary
//! - **Adapters**: mutation engine, selection, default layouts, persistence adapter, editing session
//! - **Persistence**: parent-record repositories (SQL and in-memory)
//! - **Config**: settings and layout presets

pub mod adapters;
pub mod config;
pub mod domain;
pub mod persistence;
