//! Call-site resolution: which copy convention, which two types.
//!
//! ```text
//! CallSite ─► [Apache → Spring → Hutool → Cglib → Custom] ─► ResolutionInput
//!                       first is_support() wins                    │
//!                                                                  ▼
//!                                  TypeModel ─► Reconciler ─► Reconciliation
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! let resolver = ResolverBuilder::new().build();
//! match resolver.resolve(&call, &model)? {
//!     Outcome::Resolved(r) => println!("{:?}", r.common_names()),
//!     Outcome::NotApplicable(why) => tracing::debug!(?why, "skipped"),
//! }
//! ```
//!
//! Resolution is best-effort: host faults and unknown types become
//! `Outcome::NotApplicable`. Only host cancellation comes back as an error.

mod conventions;
mod resolver;

pub use conventions::{
    ignore_names, is_copy_call, is_copy_property_call, CopyConvention, ResolutionInput,
};
pub use resolver::{NotApplicable, Outcome, ResolutionStats, Resolver, ResolverBuilder};
