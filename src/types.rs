//! Core types for copymap - field descriptors and reconciliation marks.
//!
//! Everything the engine hands to consumers is built from these:
//! - `TypeRef` wraps the host's canonical type text
//! - `FieldDescriptor` pairs a field name with its type, plus the mark
//!   assigned by the reconciliation pass
//! - `Mark` is the four-way classification of a field against its
//!   counterpart type

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

/// Field names that never take part in a copy, whatever the call site says.
pub const DEFAULT_IGNORED: &[&str] = &["serialVersionUID"];

/// Raw type of class literals and `Class<?>` values.
pub const JAVA_LANG_CLASS: &str = "java.lang.Class";

/// Root of every class hierarchy; copies to or from it carry no information.
pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// Matches a run of package/outer-class qualifiers: `java.util.` in `java.util.List`.
static QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([a-zA-Z0-9_]+\.)+").expect("Invalid qualifier regex")
});

/// A type as the host type system reports it.
///
/// Only the canonical text matters for matching; everything else is derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    canonical: String,
}

impl TypeRef {
    pub fn new(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
        }
    }

    /// Fully-qualified text, e.g. `java.util.List<java.lang.String>`.
    pub fn canonical_text(&self) -> &str {
        &self.canonical
    }

    /// Display form with qualifiers stripped: `List<String>`.
    /// Generic structure is preserved.
    pub fn short_text(&self) -> String {
        QUALIFIER.replace_all(&self.canonical, "").into_owned()
    }

    /// Canonical text without generic arguments: `java.util.List`.
    pub fn raw(&self) -> &str {
        match self.canonical.find('<') {
            Some(pos) => self.canonical[..pos].trim_end(),
            None => &self.canonical,
        }
    }

    /// Last segment of the raw type: `List`.
    pub fn simple_name(&self) -> &str {
        let raw = self.raw();
        match raw.rfind('.') {
            Some(pos) => &raw[pos + 1..],
            None => raw,
        }
    }

    pub fn is_object(&self) -> bool {
        self.raw() == JAVA_LANG_OBJECT
    }

    pub fn is_class(&self) -> bool {
        self.raw() == JAVA_LANG_CLASS
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl From<&str> for TypeRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for TypeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.canonical)
    }
}

/// Reconciliation state of one field relative to the other side of a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mark {
    /// Same name, same type - the copy carries the value over
    Same,
    /// Same name, different type - most copy utilities skip or fail here
    TypeNotMatch,
    /// Excluded by the call site or by the default-ignored set
    Ignored,
    /// No counterpart on the other side
    Diff,
}

impl Mark {
    /// Color name used by presentation layers.
    pub fn color(&self) -> &'static str {
        match self {
            Mark::Same => "green",
            Mark::TypeNotMatch => "yellow",
            Mark::Ignored => "grey",
            Mark::Diff => "red",
        }
    }

    /// Glyph shown next to a field, padded with spaces on both sides.
    pub fn glyph(&self) -> &'static str {
        match self {
            Mark::Same => " ✅ ",
            Mark::TypeNotMatch => " ⚠️ ",
            Mark::Ignored => " 🚫 ",
            Mark::Diff => " ❌ ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mark::Same => "same",
            Mark::TypeNotMatch => "type-not-match",
            Mark::Ignored => "ignored",
            Mark::Diff => "diff",
        }
    }
}

/// One field declaration as the host reports it, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A field of a source or target type, carrying its reconciliation mark.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeRef,
    /// Set by the reconciliation pass; `None` only before classification.
    pub mark: Option<Mark>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            mark: None,
        }
    }

    /// Exact identity: same name and same canonical type text.
    pub fn matches(&self, other: &FieldDescriptor) -> bool {
        self.name == other.name && self.ty.canonical_text() == other.ty.canonical_text()
    }

    /// Identity with letter case ignored on both name and type text.
    pub fn matches_ignore_case(&self, other: &FieldDescriptor) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase()
            && self.ty.canonical_text().to_lowercase() == other.ty.canonical_text().to_lowercase()
    }

    /// `java.lang.String name` instead of the short display form.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.ty.canonical_text(), self.name)
    }
}

impl From<FieldDecl> for FieldDescriptor {
    fn from(decl: FieldDecl) -> Self {
        Self::new(decl.name, decl.ty)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty.short_text(), self.name)
    }
}
