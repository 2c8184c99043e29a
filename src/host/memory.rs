//! In-memory host: a class table and hand-built call sites.
//!
//! Useful for embedders that already extracted declarations by other means,
//! and as the fixture host for the engine's own tests.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use super::{CallSite, Cancelled, Expression, TypeModel};
use crate::types::{FieldDecl, TypeRef};

/// A class declaration: own fields plus an optional superclass.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
}

/// Simulated host failure when a class is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The host model throws (stale or invalid node)
    Fault,
    /// The host asks the engine to abandon the query
    Cancel,
}

/// Class table keyed by qualified name.
#[derive(Debug, Default, Clone)]
pub struct MemoryModel {
    classes: HashMap<String, ClassDecl>,
    failures: HashMap<String, Failure>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class. `fields` are `(name, canonical type)` pairs.
    pub fn class(mut self, name: &str, fields: &[(&str, &str)]) -> Self {
        self.insert(name, None, fields);
        self
    }

    /// Declare a class extending `superclass`.
    pub fn subclass(mut self, name: &str, superclass: &str, fields: &[(&str, &str)]) -> Self {
        self.insert(name, Some(superclass), fields);
        self
    }

    /// Make every field query for `name` fail the given way.
    pub fn failing(mut self, name: &str, failure: Failure) -> Self {
        self.failures.insert(name.to_string(), failure);
        self
    }

    pub fn insert(&mut self, name: &str, superclass: Option<&str>, fields: &[(&str, &str)]) {
        let decl = ClassDecl {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            fields: fields
                .iter()
                .map(|(field, ty)| FieldDecl::new(*field, *ty))
                .collect(),
        };
        self.classes.insert(name.to_string(), decl);
    }

    pub fn get(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.get(name)
    }
}

impl TypeModel for MemoryModel {
    /// Superclass fields come first so a subclass redeclaration is the
    /// last one seen for its name.
    fn all_fields(&self, ty: &TypeRef) -> Result<Option<Vec<FieldDecl>>> {
        let raw = ty.raw();
        match self.failures.get(raw) {
            Some(Failure::Cancel) => return Err(Cancelled.into()),
            Some(Failure::Fault) => bail!("class {} is not valid anymore", raw),
            None => {}
        }

        let Some(class) = self.classes.get(raw) else {
            return Ok(None);
        };

        let mut chain = vec![class];
        let mut seen = HashSet::from([class.name.as_str()]);
        let mut current = class;
        while let Some(parent) = current.superclass.as_deref() {
            // Unknown supertypes (library classes) contribute nothing
            let Some(parent_decl) = self.classes.get(parent) else {
                break;
            };
            if !seen.insert(parent_decl.name.as_str()) {
                break;
            }
            chain.push(parent_decl);
            current = parent_decl;
        }

        let fields = chain
            .iter()
            .rev()
            .flat_map(|decl| decl.fields.iter().cloned())
            .collect();
        Ok(Some(fields))
    }
}

#[derive(Debug, Clone)]
enum ExprKind {
    Value(Option<TypeRef>),
    StringLiteral,
    BooleanLiteral,
    ClassLiteral(TypeRef),
    Faulty(String),
}

/// A hand-built argument expression.
#[derive(Debug, Clone)]
pub struct MemoryExpr {
    text: String,
    kind: ExprKind,
}

impl MemoryExpr {
    /// A variable or other expression with a known static type.
    pub fn value(text: &str, ty: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: ExprKind::Value(Some(TypeRef::new(ty))),
        }
    }

    /// An expression the host could not type.
    pub fn untyped(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: ExprKind::Value(None),
        }
    }

    /// A string literal; `value` is given without quotes.
    pub fn string(value: &str) -> Self {
        Self {
            text: format!("\"{}\"", value),
            kind: ExprKind::StringLiteral,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            text: value.to_string(),
            kind: ExprKind::BooleanLiteral,
        }
    }

    /// `Foo.class` for the qualified class `ty`.
    pub fn class_literal(ty: &str) -> Self {
        let ty = TypeRef::new(ty);
        Self {
            text: format!("{}.class", ty.simple_name()),
            kind: ExprKind::ClassLiteral(ty),
        }
    }

    /// An expression whose type query throws.
    pub fn faulty(text: &str, message: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: ExprKind::Faulty(message.to_string()),
        }
    }
}

impl Expression for MemoryExpr {
    fn text(&self) -> &str {
        &self.text
    }

    fn static_type(&self) -> Result<Option<TypeRef>> {
        match &self.kind {
            ExprKind::Value(ty) => Ok(ty.clone()),
            ExprKind::StringLiteral => Ok(Some(TypeRef::new("java.lang.String"))),
            ExprKind::BooleanLiteral => Ok(Some(TypeRef::new("boolean"))),
            ExprKind::ClassLiteral(ty) => Ok(Some(TypeRef::new(format!(
                "java.lang.Class<{}>",
                ty.canonical_text()
            )))),
            ExprKind::Faulty(message) => bail!("{}", message),
        }
    }

    fn class_literal_type(&self) -> Option<TypeRef> {
        match &self.kind {
            ExprKind::ClassLiteral(ty) => Some(ty.clone()),
            _ => None,
        }
    }

    fn literal_text(&self) -> Option<&str> {
        match self.kind {
            ExprKind::StringLiteral | ExprKind::BooleanLiteral => Some(&self.text),
            _ => None,
        }
    }

    fn is_string_literal(&self) -> bool {
        matches!(self.kind, ExprKind::StringLiteral)
    }
}

/// A hand-built call site.
#[derive(Debug, Clone)]
pub struct MemoryCallSite {
    method_text: String,
    callee_class: Option<String>,
    arguments: Vec<MemoryExpr>,
}

impl MemoryCallSite {
    /// `method_text` as written (`BeanUtils.copyProperties`), `callee_class`
    /// the declaring class it resolves to.
    pub fn new(method_text: &str, callee_class: &str, arguments: Vec<MemoryExpr>) -> Self {
        Self {
            method_text: method_text.to_string(),
            callee_class: Some(callee_class.to_string()),
            arguments,
        }
    }

    /// A call whose method does not resolve.
    pub fn unresolved(method_text: &str, arguments: Vec<MemoryExpr>) -> Self {
        Self {
            method_text: method_text.to_string(),
            callee_class: None,
            arguments,
        }
    }
}

impl CallSite for MemoryCallSite {
    type Expr = MemoryExpr;

    fn method_text(&self) -> &str {
        &self.method_text
    }

    fn callee_class(&self) -> Result<Option<String>> {
        Ok(self.callee_class.clone())
    }

    fn arguments(&self) -> &[MemoryExpr] {
        &self.arguments
    }
}
