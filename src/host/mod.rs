//! The seam between the engine and whatever owns the program model.
//!
//! The engine never parses source text. A host (an IDE plugin, a compiler
//! front-end, a test fixture) hands it call sites that already know their
//! callee and argument types, plus a `TypeModel` that can enumerate fields.
//!
//! ```text
//! host AST ──► CallSite + Expression ──► Resolver ──► Reconciliation
//!                                          │
//! host types ──► TypeModel ────────────────┘
//! ```
//!
//! Host queries are fallible (`anyhow::Result`): stale nodes and partially
//! indexed code are normal. A host that wants an in-flight query abandoned
//! returns `Cancelled` as the error, which the resolver re-raises instead of
//! folding into "no result".

pub mod memory;

use anyhow::Result;
use thiserror::Error;

use crate::types::{FieldDecl, TypeRef};

pub use memory::{MemoryCallSite, MemoryExpr, MemoryModel};

/// Host request to abandon the current computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled by host")]
pub struct Cancelled;

/// True if `err` is, or was caused by, a host cancellation.
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Cancelled>())
}

/// One argument expression of a call site.
pub trait Expression {
    /// Source text as written, e.g. `userDto` or `"password"`.
    fn text(&self) -> &str;

    /// Static type resolved by the host. `Ok(None)` if unknown.
    fn static_type(&self) -> Result<Option<TypeRef>>;

    /// Referenced type if this is a class literal (`Foo.class`).
    fn class_literal_type(&self) -> Option<TypeRef>;

    /// Raw literal text, quotes included, if this is any literal.
    fn literal_text(&self) -> Option<&str>;

    fn is_string_literal(&self) -> bool;

    /// Literal text with every `"` removed.
    fn unquoted_literal(&self) -> Option<String> {
        self.literal_text().map(|text| text.replace('"', ""))
    }

    /// A literal spelling `true` once quotes are dropped.
    fn is_true_literal(&self) -> bool {
        self.unquoted_literal().is_some_and(|text| text == "true")
    }
}

/// A method call expression the host has already bound.
pub trait CallSite {
    type Expr: Expression;

    /// The method expression as written: `BeanUtils.copyProperties`.
    fn method_text(&self) -> &str;

    /// Qualified name of the class declaring the resolved method.
    /// `Ok(None)` when the callee does not resolve.
    fn callee_class(&self) -> Result<Option<String>>;

    fn arguments(&self) -> &[Self::Expr];
}

/// Read-only queries against the host's type system.
pub trait TypeModel {
    /// Every field of `ty`, inherited ones included, in declaration order.
    /// `Ok(None)` if the type does not resolve to a known class.
    fn all_fields(&self, ty: &TypeRef) -> Result<Option<Vec<FieldDecl>>>;
}

impl<T: TypeModel + ?Sized> TypeModel for &T {
    fn all_fields(&self, ty: &TypeRef) -> Result<Option<Vec<FieldDecl>>> {
        (**self).all_fields(ty)
    }
}
