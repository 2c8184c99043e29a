//! copymap - what a bean copy actually copies
//!
//! Reads a reflective property-copy call (`BeanUtils.copyProperties(src, dst)`
//! and friends), works out the source and target types it moves data
//! between, and classifies every field on both sides.
//!
//! # Architecture
//!
//! ```text
//! CallSite → Resolver → ResolutionInput → Reconciler → Reconciliation
//!    ↓          ↓                             ↓              ↓
//!  host       five                        TypeModel    diagnostics,
//!  traits   conventions                  (all fields)  setters, colors
//! ```
//!
//! The engine never parses source code. A host (IDE plugin, indexer, test
//! fixture) implements the traits in [`host`] and feeds call sites in.
//! Everything produced is immutable and safe to share across threads.

pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod host;
pub mod reconcile;
pub mod rendering;
pub mod resolve;
pub mod types;

// Re-export core types
pub use types::{FieldDecl, FieldDescriptor, Mark, TypeRef};

pub use config::{Config, ConfigError, EngineConfig};
pub use host::{CallSite, Cancelled, Expression, TypeModel};
pub use reconcile::{common_names, FieldMap, Reconciler, Reconciliation};
pub use resolve::{
    CopyConvention, NotApplicable, Outcome, ResolutionInput, ResolutionStats, Resolver,
    ResolverBuilder,
};

pub use codegen::generate_setters;
pub use diagnostics::{diagnose, DiagnoseOptions, Diagnoser, Diagnostic};
