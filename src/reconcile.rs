//! Property reconciliation: which fields survive a copy, and how.
//!
//! Given the field sets of a source and a target type, every field on both
//! sides gets a `Mark`:
//!
//! ```text
//! ignored by name?  ──yes──► Ignored
//!       │no
//! counterpart by exact name, else by lower-cased name (case-insensitive only)
//!       │none ──────────────► Diff
//!       │found
//! same name + type? ──yes──► Same
//!       │no
//!       └─────────────────► TypeNotMatch
//! ```
//!
//! The pass runs twice, source against target and target against source,
//! so fields that exist only in the target show up as `Diff` on the target
//! side without a third structure.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::host::TypeModel;
use crate::resolve::{CopyConvention, ResolutionInput};
use crate::types::{FieldDecl, FieldDescriptor, Mark, TypeRef};

/// Field name -> descriptor, one entry per distinct name.
pub type FieldMap = BTreeMap<String, FieldDescriptor>;

/// Lower-cased name -> exact name in the matching `FieldMap`.
pub type LowerCaseIndex = HashMap<String, String>;

/// Outcome of reconciling one call site's source and target types.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub convention: CopyConvention,
    pub source_type: TypeRef,
    pub target_type: TypeRef,
    source_fields: FieldMap,
    target_fields: FieldMap,
    #[serde(skip)]
    lower_source: LowerCaseIndex,
    #[serde(skip)]
    lower_target: LowerCaseIndex,
    ignored_names: BTreeSet<String>,
    case_insensitive: bool,
    #[serde(skip)]
    default_ignored: Arc<BTreeSet<String>>,
}

impl Reconciliation {
    pub fn source_fields(&self) -> &FieldMap {
        &self.source_fields
    }

    pub fn target_fields(&self) -> &FieldMap {
        &self.target_fields
    }

    /// Empty unless the call site asked for case-insensitive matching.
    pub fn lower_case_source_index(&self) -> &LowerCaseIndex {
        &self.lower_source
    }

    pub fn lower_case_target_index(&self) -> &LowerCaseIndex {
        &self.lower_target
    }

    /// Names the call site excluded (defaults not included).
    pub fn ignored_names(&self) -> &BTreeSet<String> {
        &self.ignored_names
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Target field a source field of this name copies into.
    pub fn target_counterpart(&self, name: &str) -> Option<&FieldDescriptor> {
        lookup(&self.target_fields, &self.lower_target, name)
    }

    /// Source field a target field of this name is copied from.
    pub fn source_counterpart(&self, name: &str) -> Option<&FieldDescriptor> {
        lookup(&self.source_fields, &self.lower_source, name)
    }

    /// Source fields carrying `mark`, in name order.
    pub fn source_marked(&self, mark: Mark) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.source_fields.values().filter(move |f| f.mark == Some(mark))
    }

    /// Target fields carrying `mark`, in name order.
    pub fn target_marked(&self, mark: Mark) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.target_fields.values().filter(move |f| f.mark == Some(mark))
    }

    /// Names present on both sides and not ignored, ascending.
    pub fn common_names(&self) -> BTreeSet<String> {
        common_names(
            self.source_fields.keys(),
            self.target_fields.keys(),
            &self.ignored_names,
            &self.default_ignored,
        )
    }
}

/// Intersection of two name sets minus both ignore sets, in ascending order.
pub fn common_names<S, T>(
    source_names: S,
    target_names: T,
    ignore_names: &BTreeSet<String>,
    default_ignored: &BTreeSet<String>,
) -> BTreeSet<String>
where
    S: IntoIterator,
    S::Item: AsRef<str>,
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let target: HashSet<String> = target_names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();

    source_names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .filter(|name| target.contains(name))
        .filter(|name| !ignore_names.contains(name) && !default_ignored.contains(name))
        .collect()
}

/// Builds `Reconciliation`s. Holds only immutable configuration.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: EngineConfig,
}

impl Reconciler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enumerate both types through the host and classify every field.
    ///
    /// `Ok(None)` if either type does not resolve to a known class.
    pub fn reconcile<M: TypeModel + ?Sized>(
        &self,
        input: ResolutionInput,
        model: &M,
    ) -> Result<Option<Reconciliation>> {
        let source = model
            .all_fields(&input.source_type)
            .with_context(|| format!("reading fields of {}", input.source_type))?;
        let target = model
            .all_fields(&input.target_type)
            .with_context(|| format!("reading fields of {}", input.target_type))?;

        let (Some(source), Some(target)) = (source, target) else {
            debug!(
                source = %input.source_type,
                target = %input.target_type,
                "type has no known declaration"
            );
            return Ok(None);
        };

        Ok(Some(self.reconcile_fields(input, source, target)))
    }

    /// Classify already-enumerated fields. Total: never fails.
    pub fn reconcile_fields(
        &self,
        input: ResolutionInput,
        source: Vec<FieldDecl>,
        target: Vec<FieldDecl>,
    ) -> Reconciliation {
        let mut source_fields = to_field_map(source);
        let mut target_fields = to_field_map(target);

        let lower_source = lower_case_index(input.case_insensitive, &source_fields);
        let lower_target = lower_case_index(input.case_insensitive, &target_fields);

        let rules = Rules {
            ignore_names: &input.ignore_names,
            default_ignored: self.config.default_ignored(),
        };

        let source_marks: Vec<Mark> = source_fields
            .values()
            .map(|field| rules.classify(field, &target_fields, &lower_target))
            .collect();
        let target_marks: Vec<Mark> = target_fields
            .values()
            .map(|field| rules.classify(field, &source_fields, &lower_source))
            .collect();

        for (field, mark) in source_fields.values_mut().zip(source_marks) {
            field.mark = Some(mark);
        }
        for (field, mark) in target_fields.values_mut().zip(target_marks) {
            field.mark = Some(mark);
        }

        Reconciliation {
            convention: input.convention,
            source_type: input.source_type,
            target_type: input.target_type,
            source_fields,
            target_fields,
            lower_source,
            lower_target,
            ignored_names: input.ignore_names,
            case_insensitive: input.case_insensitive,
            default_ignored: Arc::clone(self.config.default_ignored_arc()),
        }
    }
}

struct Rules<'a> {
    ignore_names: &'a BTreeSet<String>,
    default_ignored: &'a BTreeSet<String>,
}

impl Rules<'_> {
    fn classify(&self, field: &FieldDescriptor, exact: &FieldMap, lower: &LowerCaseIndex) -> Mark {
        if self.default_ignored.contains(&field.name) || self.ignore_names.contains(&field.name) {
            return Mark::Ignored;
        }

        let Some(counterpart) = lookup(exact, lower, &field.name) else {
            return Mark::Diff;
        };

        if field.matches(counterpart) || (!lower.is_empty() && field.matches_ignore_case(counterpart)) {
            Mark::Same
        } else {
            Mark::TypeNotMatch
        }
    }
}

/// Exact name first, then the lower-case index when one was built.
fn lookup<'a>(exact: &'a FieldMap, lower: &LowerCaseIndex, name: &str) -> Option<&'a FieldDescriptor> {
    if let Some(field) = exact.get(name) {
        return Some(field);
    }
    if lower.is_empty() {
        return None;
    }
    lower
        .get(&name.to_lowercase())
        .and_then(|exact_name| exact.get(exact_name))
}

/// Later declarations of a name replace earlier ones.
fn to_field_map(fields: Vec<FieldDecl>) -> FieldMap {
    fields
        .into_iter()
        .map(|decl| (decl.name.clone(), FieldDescriptor::from(decl)))
        .collect()
}

fn lower_case_index(case_insensitive: bool, fields: &FieldMap) -> LowerCaseIndex {
    if !case_insensitive {
        return LowerCaseIndex::new();
    }
    fields
        .keys()
        .map(|name| (name.to_lowercase(), name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(ignore: &[&str], case_insensitive: bool) -> ResolutionInput {
        ResolutionInput {
            convention: CopyConvention::Spring,
            source_type: TypeRef::new("com.acme.Source"),
            target_type: TypeRef::new("com.acme.Target"),
            ignore_names: ignore.iter().map(|s| s.to_string()).collect(),
            case_insensitive,
        }
    }

    fn fields(decls: &[(&str, &str)]) -> Vec<FieldDecl> {
        decls.iter().map(|(n, t)| FieldDecl::new(*n, *t)).collect()
    }

    fn mark(map: &FieldMap, name: &str) -> Mark {
        map.get(name).and_then(|f| f.mark).expect("field should be marked")
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_identical_types_are_same() {
        let r = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&[("id", "int"), ("name", "java.lang.String")]),
            fields(&[("id", "int"), ("name", "java.lang.String")]),
        );

        assert_eq!(names(&r.common_names()), vec!["id", "name"]);
        for name in ["id", "name"] {
            assert_eq!(mark(r.source_fields(), name), Mark::Same);
            assert_eq!(mark(r.target_fields(), name), Mark::Same);
        }
    }

    #[test]
    fn test_type_mismatch_both_directions() {
        let r = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&[("id", "int"), ("name", "java.lang.String")]),
            fields(&[("id", "java.lang.String"), ("name", "java.lang.String")]),
        );

        assert_eq!(mark(r.source_fields(), "id"), Mark::TypeNotMatch);
        assert_eq!(mark(r.target_fields(), "id"), Mark::TypeNotMatch);
        assert_eq!(mark(r.source_fields(), "name"), Mark::Same);
        assert_eq!(mark(r.target_fields(), "name"), Mark::Same);
    }

    #[test]
    fn test_call_site_ignore_list() {
        let r = Reconciler::default().reconcile_fields(
            input(&["legacyFlag"], false),
            fields(&[("id", "int"), ("legacyFlag", "boolean")]),
            fields(&[("id", "int")]),
        );

        assert_eq!(mark(r.source_fields(), "id"), Mark::Same);
        assert_eq!(mark(r.source_fields(), "legacyFlag"), Mark::Ignored);
        assert_eq!(mark(r.target_fields(), "id"), Mark::Same);
        assert_eq!(names(&r.common_names()), vec!["id"]);
    }

    #[test]
    fn test_ignore_overrides_type_match() {
        let r = Reconciler::default().reconcile_fields(
            input(&["name"], false),
            fields(&[("serialVersionUID", "long"), ("name", "java.lang.String")]),
            fields(&[("serialVersionUID", "long"), ("name", "java.lang.String")]),
        );

        for name in ["serialVersionUID", "name"] {
            assert_eq!(mark(r.source_fields(), name), Mark::Ignored);
            assert_eq!(mark(r.target_fields(), name), Mark::Ignored);
        }
        assert!(r.common_names().is_empty());
    }

    #[test]
    fn test_one_sided_fields_are_diff() {
        let r = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&[("id", "int"), ("createdBy", "java.lang.String")]),
            fields(&[("id", "int"), ("version", "int")]),
        );

        assert_eq!(mark(r.source_fields(), "createdBy"), Mark::Diff);
        assert_eq!(mark(r.target_fields(), "version"), Mark::Diff);
        assert_eq!(r.source_marked(Mark::Diff).count(), 1);
        assert_eq!(r.target_marked(Mark::Same).count(), 1);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let source = fields(&[("userId", "java.lang.Long"), ("age", "int")]);
        let target = fields(&[("UserId", "java.lang.Long"), ("AGE", "long")]);

        let r = Reconciler::default().reconcile_fields(input(&[], true), source.clone(), target.clone());
        assert!(r.is_case_insensitive());
        assert_eq!(mark(r.source_fields(), "userId"), Mark::Same);
        assert_eq!(mark(r.target_fields(), "UserId"), Mark::Same);
        assert_eq!(mark(r.source_fields(), "age"), Mark::TypeNotMatch);
        assert_eq!(mark(r.target_fields(), "AGE"), Mark::TypeNotMatch);
        assert_eq!(
            r.target_counterpart("userId").map(|f| f.name.as_str()),
            Some("UserId")
        );

        let strict = Reconciler::default().reconcile_fields(input(&[], false), source, target);
        assert!(!strict.is_case_insensitive());
        assert!(strict.lower_case_source_index().is_empty());
        assert!(strict.lower_case_target_index().is_empty());
        assert_eq!(mark(strict.source_fields(), "userId"), Mark::Diff);
        assert_eq!(mark(strict.target_fields(), "UserId"), Mark::Diff);
        assert!(strict.target_counterpart("userId").is_none());
    }

    #[test]
    fn test_exact_match_preferred_over_case_fallback() {
        let r = Reconciler::default().reconcile_fields(
            input(&[], true),
            fields(&[("code", "int")]),
            fields(&[("code", "java.lang.String"), ("Code", "int")]),
        );
        // Exact-name counterpart wins even though the other casing has the same type
        assert_eq!(mark(r.source_fields(), "code"), Mark::TypeNotMatch);
    }

    #[test]
    fn test_last_declaration_wins() {
        let r = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&[("id", "int"), ("id", "java.lang.Long")]),
            fields(&[("id", "java.lang.Long")]),
        );
        assert_eq!(r.source_fields().len(), 1);
        assert_eq!(mark(r.source_fields(), "id"), Mark::Same);
    }

    #[test]
    fn test_every_field_is_marked() {
        let r = Reconciler::default().reconcile_fields(
            input(&["b"], true),
            fields(&[("a", "int"), ("b", "int"), ("C", "int"), ("serialVersionUID", "long")]),
            fields(&[("a", "long"), ("c", "int"), ("d", "int")]),
        );
        assert!(r.source_fields().values().all(|f| f.mark.is_some()));
        assert!(r.target_fields().values().all(|f| f.mark.is_some()));
    }

    #[test]
    fn test_common_names_ignore_declaration_order() {
        let decls = [("zeta", "int"), ("alpha", "int"), ("mid", "int"), ("only", "int")];
        let mut reversed = decls;
        reversed.reverse();

        let a = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&decls),
            fields(&decls[..3]),
        );
        let b = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&reversed),
            fields(&decls[..3]),
        );
        assert_eq!(names(&a.common_names()), vec!["alpha", "mid", "zeta"]);
        assert_eq!(a.common_names(), b.common_names());
        assert_eq!(a.common_names(), a.common_names());
    }

    #[test]
    fn test_common_names_free_function() {
        let defaults: BTreeSet<String> = ["serialVersionUID".to_string()].into();
        let ignore: BTreeSet<String> = ["b".to_string()].into();
        let common = common_names(
            ["serialVersionUID", "c", "a", "b"],
            vec!["a", "b", "c", "serialVersionUID", "x"],
            &ignore,
            &defaults,
        );
        assert_eq!(names(&common), vec!["a", "c"]);
    }

    #[test]
    fn test_custom_default_ignored_keeps_builtins() {
        let config = crate::config::Config::from_toml_str(r#"extend-ignore = ["tenantId"]"#).unwrap();
        let r = Reconciler::new(config.engine()).reconcile_fields(
            input(&[], false),
            fields(&[("tenantId", "long"), ("serialVersionUID", "long"), ("id", "int")]),
            fields(&[("tenantId", "long"), ("serialVersionUID", "long"), ("id", "int")]),
        );
        for name in ["tenantId", "serialVersionUID"] {
            assert_eq!(mark(r.source_fields(), name), Mark::Ignored);
            assert_eq!(mark(r.target_fields(), name), Mark::Ignored);
        }
        assert_eq!(names(&r.common_names()), vec!["id"]);
    }

    #[test]
    fn test_case_insensitive_flag_without_fields() {
        let r = Reconciler::default().reconcile_fields(input(&[], true), Vec::new(), Vec::new());
        assert!(r.is_case_insensitive());
        assert!(r.lower_case_source_index().is_empty());
        assert!(r.common_names().is_empty());
    }

    #[test]
    fn test_results_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reconciler>();
        assert_send_sync::<Reconciliation>();
        assert_send_sync::<EngineConfig>();
    }

    #[test]
    fn test_serializes_marks() {
        let r = Reconciler::default().reconcile_fields(
            input(&[], false),
            fields(&[("id", "int")]),
            fields(&[("id", "long")]),
        );
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["convention"], "spring");
        assert_eq!(json["source_type"], "com.acme.Source");
        assert_eq!(json["source_fields"]["id"]["mark"], "TYPE_NOT_MATCH");
        assert_eq!(json["target_fields"]["id"]["ty"], "long");
    }
}
