//! Warnings about copy calls that probably do not do what the author meant.
//!
//! Diagnostics are advisory: a host failure while checking one rule drops
//! that rule's findings and is logged, it never fails the call. Only
//! cancellation is surfaced.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::host::{is_cancelled, CallSite, Cancelled, Expression, TypeModel};
use crate::resolve::{is_copy_call, is_copy_property_call, CopyConvention, Outcome, Resolver};
use crate::types::{FieldDescriptor, Mark};

/// A source field and the target field it fails to copy into.
#[derive(Debug, Clone, Serialize)]
pub struct MismatchPair {
    pub source: FieldDescriptor,
    pub target: FieldDescriptor,
}

impl fmt::Display for MismatchPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = self.source.mark.unwrap_or(Mark::TypeNotMatch).glyph();
        write!(f, "{}  {}{}", self.source, glyph, self.target)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The copy moves nothing at all.
    NoCommonProperties { source: String, target: String },
    /// Same-named properties whose types differ are skipped by the copy.
    TypeMismatch {
        source: String,
        target: String,
        pairs: Vec<MismatchPair>,
    },
    /// Spring `copyProperties(source, Foo.class)`: the second argument must be an instance.
    ClassAsTarget,
    /// Apache `copyProperty(bean, "name", value)` naming a property the bean lacks.
    MissingProperty { target: String, property: String },
}

impl Diagnostic {
    /// Stable identifier, e.g. for suppressions.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::NoCommonProperties { .. } => "no-common-properties",
            Diagnostic::TypeMismatch { .. } => "type-mismatch",
            Diagnostic::ClassAsTarget => "class-as-target",
            Diagnostic::MissingProperty { .. } => "missing-property",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoCommonProperties { source, target } => {
                write!(f, "{} and {} have no properties in common", source, target)
            }
            Diagnostic::TypeMismatch { source, target, pairs } => {
                writeln!(f, "properties of {} and {} differ in type:", source, target)?;
                let lines: Vec<String> = pairs.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", lines.join("\n"))
            }
            Diagnostic::ClassAsTarget => write!(
                f,
                "BeanUtils.copyProperties copies into an instance; the second argument is a Class"
            ),
            Diagnostic::MissingProperty { target, property } => {
                write!(f, "{} has no property '{}'", target, property)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnoseOptions {
    /// No reconciliation findings for copies to or from `java.lang.Object`.
    pub skip_object_types: bool,
}

impl Default for DiagnoseOptions {
    fn default() -> Self {
        Self {
            skip_object_types: true,
        }
    }
}

/// Check one call site. Calls that are not copy calls yield nothing.
pub fn diagnose<C, M>(
    call: &C,
    model: &M,
    resolver: &Resolver,
    options: DiagnoseOptions,
) -> Result<Vec<Diagnostic>, Cancelled>
where
    C: CallSite,
    M: TypeModel + ?Sized,
{
    let method = call.method_text();
    let mut found = Vec::new();

    if is_copy_call(method) {
        if let Outcome::Resolved(r) = resolver.resolve(call, model)? {
            if options.skip_object_types && (r.source_type.is_object() || r.target_type.is_object()) {
                debug!(method, "copy involves java.lang.Object, skipped");
            } else {
                let source = r.source_type.simple_name().to_string();
                let target = r.target_type.simple_name().to_string();

                if r.common_names().is_empty() {
                    found.push(Diagnostic::NoCommonProperties {
                        source: source.clone(),
                        target: target.clone(),
                    });
                }

                let pairs: Vec<MismatchPair> = r
                    .source_marked(Mark::TypeNotMatch)
                    .filter_map(|field| {
                        r.target_counterpart(&field.name).map(|counterpart| MismatchPair {
                            source: field.clone(),
                            target: counterpart.clone(),
                        })
                    })
                    .collect();
                if !pairs.is_empty() {
                    found.push(Diagnostic::TypeMismatch { source, target, pairs });
                }
            }
        }

        if best_effort(method, class_as_target(call))?.unwrap_or(false) {
            found.push(Diagnostic::ClassAsTarget);
        }
    } else if is_copy_property_call(method) && resolver.conventions().contains(&CopyConvention::Apache) {
        if let Some(missing) = best_effort(method, missing_property(call, model))?.flatten() {
            found.push(missing);
        }
    }

    Ok(found)
}

/// Spring's `copyProperties` with a `Class` where the target bean belongs.
fn class_as_target<C: CallSite>(call: &C) -> anyhow::Result<bool> {
    if call.callee_class()?.as_deref() != Some(CopyConvention::Spring.qualified_name()) {
        return Ok(false);
    }
    let Some(second) = call.arguments().get(1) else {
        return Ok(false);
    };
    Ok(second.static_type()?.is_some_and(|ty| ty.is_class()))
}

fn missing_property<C, M>(call: &C, model: &M) -> anyhow::Result<Option<Diagnostic>>
where
    C: CallSite,
    M: TypeModel + ?Sized,
{
    let args = call.arguments();
    let (Some(bean), Some(name)) = (args.first(), args.get(1)) else {
        return Ok(None);
    };
    let Some(property) = name.unquoted_literal() else {
        return Ok(None);
    };
    let Some(bean_type) = bean.static_type()? else {
        return Ok(None);
    };
    let Some(fields) = model.all_fields(&bean_type)? else {
        return Ok(None);
    };

    if fields.iter().any(|field| field.name == property) {
        return Ok(None);
    }
    Ok(Some(Diagnostic::MissingProperty {
        target: bean_type.simple_name().to_string(),
        property,
    }))
}

/// Drop a failed check instead of failing the whole call.
fn best_effort<T>(method: &str, result: anyhow::Result<T>) -> Result<Option<T>, Cancelled> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if is_cancelled(&err) => Err(Cancelled),
        Err(err) => {
            warn!(method, error = %format!("{:#}", err), "diagnostic check failed");
            Ok(None)
        }
    }
}

/// A resolver paired with diagnostic options, usually built from a `Config`.
#[derive(Debug, Clone, Default)]
pub struct Diagnoser {
    resolver: Resolver,
    options: DiagnoseOptions,
}

impl Diagnoser {
    pub fn new(resolver: Resolver, options: DiagnoseOptions) -> Self {
        Self { resolver, options }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.resolver(),
            DiagnoseOptions {
                skip_object_types: config.skip_object_types,
            },
        )
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn diagnose<C, M>(&self, call: &C, model: &M) -> Result<Vec<Diagnostic>, Cancelled>
    where
        C: CallSite,
        M: TypeModel + ?Sized,
    {
        diagnose(call, model, &self.resolver, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::Failure;
    use crate::host::{MemoryCallSite, MemoryExpr, MemoryModel};

    fn model() -> MemoryModel {
        MemoryModel::new()
            .class("com.acme.Order", &[("id", "int"), ("total", "java.math.BigDecimal")])
            .class("com.acme.OrderDto", &[("id", "java.lang.String"), ("total", "java.math.BigDecimal")])
            .class("com.acme.Invoice", &[("number", "java.lang.String")])
            .class("com.acme.Receipt", &[("code", "java.lang.String")])
            .class("java.lang.Object", &[])
    }

    fn spring(args: Vec<MemoryExpr>) -> MemoryCallSite {
        MemoryCallSite::new(
            "BeanUtils.copyProperties",
            CopyConvention::Spring.qualified_name(),
            args,
        )
    }

    fn copy_property(bean: MemoryExpr, name: &str) -> MemoryCallSite {
        MemoryCallSite::new(
            "BeanUtils.copyProperty",
            CopyConvention::Apache.qualified_name(),
            vec![bean, MemoryExpr::string(name), MemoryExpr::value("value", "java.lang.String")],
        )
    }

    fn codes(found: &[Diagnostic]) -> Vec<&'static str> {
        found.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn test_type_mismatch_lists_pairs() {
        let call = spring(vec![
            MemoryExpr::value("order", "com.acme.Order"),
            MemoryExpr::value("dto", "com.acme.OrderDto"),
        ]);
        let found = Diagnoser::default().diagnose(&call, &model()).unwrap();
        assert_eq!(codes(&found), vec!["type-mismatch"]);

        let Diagnostic::TypeMismatch { source, target, pairs } = &found[0] else {
            panic!("expected a type mismatch");
        };
        assert_eq!(source, "Order");
        assert_eq!(target, "OrderDto");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].to_string(), format!("int id  {}String id", Mark::TypeNotMatch.glyph()));
        assert!(found[0].to_string().ends_with("String id"));
    }

    #[test]
    fn test_no_common_properties() {
        let call = spring(vec![
            MemoryExpr::value("invoice", "com.acme.Invoice"),
            MemoryExpr::value("receipt", "com.acme.Receipt"),
        ]);
        let found = Diagnoser::default().diagnose(&call, &model()).unwrap();
        assert_eq!(codes(&found), vec!["no-common-properties"]);
        assert_eq!(found[0].to_string(), "Invoice and Receipt have no properties in common");
    }

    #[test]
    fn test_object_types_skipped_unless_configured() {
        let call = spring(vec![
            MemoryExpr::value("any", "java.lang.Object"),
            MemoryExpr::value("receipt", "com.acme.Receipt"),
        ]);
        assert!(Diagnoser::default().diagnose(&call, &model()).unwrap().is_empty());

        let config = Config::from_toml_str("skip-object-types = false").unwrap();
        let found = Diagnoser::from_config(&config).diagnose(&call, &model()).unwrap();
        assert_eq!(codes(&found), vec!["no-common-properties"]);
    }

    #[test]
    fn test_class_as_target() {
        let call = spring(vec![
            MemoryExpr::value("order", "com.acme.Order"),
            MemoryExpr::class_literal("com.acme.OrderDto"),
        ]);
        let found = Diagnoser::default().diagnose(&call, &model()).unwrap();
        assert_eq!(codes(&found), vec!["class-as-target"]);

        // Hutool accepts a Class target
        let hutool = MemoryCallSite::new(
            "BeanUtil.copyProperties",
            CopyConvention::Hutool.qualified_name(),
            vec![
                MemoryExpr::value("order", "com.acme.Order"),
                MemoryExpr::class_literal("com.acme.Order"),
            ],
        );
        assert!(Diagnoser::default().diagnose(&hutool, &model()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_property() {
        let call = copy_property(MemoryExpr::value("order", "com.acme.Order"), "discount");
        let found = Diagnoser::default().diagnose(&call, &model()).unwrap();
        assert_eq!(codes(&found), vec!["missing-property"]);
        assert_eq!(found[0].to_string(), "Order has no property 'discount'");

        let present = copy_property(MemoryExpr::value("order", "com.acme.Order"), "total");
        assert!(Diagnoser::default().diagnose(&present, &model()).unwrap().is_empty());

        let unknown = copy_property(MemoryExpr::value("x", "com.acme.Unknown"), "total");
        assert!(Diagnoser::default().diagnose(&unknown, &model()).unwrap().is_empty());
    }

    #[test]
    fn test_disabled_apache_has_no_property_check() {
        let config = Config::from_toml_str(r#"disabled-conventions = ["apache"]"#).unwrap();
        let call = copy_property(MemoryExpr::value("order", "com.acme.Order"), "discount");
        assert!(Diagnoser::from_config(&config).diagnose(&call, &model()).unwrap().is_empty());
    }

    #[test]
    fn test_other_calls_ignored() {
        let call = MemoryCallSite::new(
            "list.add",
            "java.util.List",
            vec![MemoryExpr::value("order", "com.acme.Order")],
        );
        assert!(Diagnoser::default().diagnose(&call, &model()).unwrap().is_empty());
    }

    #[test]
    fn test_host_failures() {
        let faulty = model().failing("com.acme.Order", Failure::Fault);
        let call = copy_property(MemoryExpr::value("order", "com.acme.Order"), "discount");
        assert!(Diagnoser::default().diagnose(&call, &faulty).unwrap().is_empty());

        let cancelling = model().failing("com.acme.Order", Failure::Cancel);
        assert_eq!(Diagnoser::default().diagnose(&call, &cancelling).unwrap_err(), Cancelled);
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let d = Diagnostic::MissingProperty {
            target: "Order".to_string(),
            property: "discount".to_string(),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "missing_property");
        assert_eq!(json["property"], "discount");
    }
}
