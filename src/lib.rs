//! # class-scan
//!
//! Finds namespaced class declarations in a source tree without parsing it,
//! then confirms each guess against a live type catalog.
//!
//! ## Architecture
//!
//! - **scan**: root path sets and candidate file enumeration
//! - **classify**: per-line namespace/declaration/stop heuristics
//! - **probe**: streaming single-file scan producing at most one class
//! - **registry**: fingerprint-keyed, insertion-ordered class registry
//! - **class_info**: the identity record and its lazy reflection accessors
//! - **catalog**: the reflection collaborator trait and an in-memory catalog
//! - **filter**: attribute-based require-any/require-all filtering
//! - **finder**: the `ClassFinder` facade tying the above together
//! - **config**: tunables, loadable from JSON
//! - **error**: the error taxonomy

pub mod catalog;
pub mod class_info;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod finder;
pub mod probe;
pub mod registry;
pub mod scan;

pub use catalog::{Attribute, Instance, StaticCatalog, TypeCatalog};
pub use class_info::ClassInfo;
pub use classify::{DeclarationKind, LineKind};
pub use config::FinderConfig;
pub use error::{FinderError, Result};
pub use filter::{AttributeFilter, MatchPolicy};
pub use finder::ClassFinder;
pub use registry::{ClassRegistry, Fingerprint};
pub use scan::PathSet;
