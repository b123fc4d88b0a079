//! refill - Record and Replay Engine for HTML Form Interactions
//!
//! A Rust engine that records a user's interactions with an HTML form
//! (field fills and button clicks) as an ordered script and replays that
//! script later against the same or an equivalent page, surviving
//! asynchronous DOM mutations and full page navigations.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Dom**: The page model - element tree, selector engine, HTML loading
//! - **Resolver**: Locator derivation and bounded element lookup
//! - **Recorder**: Interaction capture with per-field dedupe
//! - **Replay**: Step execution, value injection, quiescence waits
//! - **Coordinator**: Cross-navigation session tracking and resumption
//! - **Scripts**: JSON persistence for recorded scripts
//! - **CLI**: Inspect / run / script-management commands
//!
//! # Usage
//!
//! ```rust,no_run
//! use refill::core::{FieldKind, Step};
//! use refill::dom::Page;
//! use refill::replay::ReplayEngine;
//! use refill::RefillConfig;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() {
//!     let url = Url::parse("https://forms.example/signup").unwrap();
//!     let page = Page::from_html("<html><body>...</body></html>", url);
//!
//!     let steps = vec![
//!         Step::fill(1, "#email", false, FieldKind::Text, "a@b.c", "Email"),
//!         Step::click(2, "#join", false, "Join"),
//!     ];
//!
//!     let config = RefillConfig::default();
//!     let (engine, _signals) = ReplayEngine::channel(config.replay);
//!     let report = engine.replay(&page, &steps, 0).await;
//!     println!("{}", report.summary());
//! }
//! ```

pub mod cli;
pub mod coordinator;
pub mod core;
pub mod dom;
pub mod recorder;
pub mod replay;
pub mod resolver;
pub mod scripts;

// Re-export commonly used items
pub use crate::coordinator::{Coordinator, PageHost, ReplayHost};
pub use crate::core::{RefillConfig, RefillError, Result};
pub use crate::recorder::Recorder;
pub use crate::replay::ReplayEngine;
pub use crate::scripts::ScriptStore;
