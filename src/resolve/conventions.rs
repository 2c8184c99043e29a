//! The copy-call conventions the resolver knows about.
//!
//! Each convention is one library's way of spelling "copy the fields of A
//! into B". The set is closed, so it is an enum rather than a trait object:
//! dispatch is a `match`, and the priority order is `CopyConvention::ALL`.
//!
//! # Conventions (priority order)
//!
//! 1. Apache    - `BeanUtils.copyProperties(dest, orig)`, arguments reversed
//! 2. Spring    - `BeanUtils.copyProperties(source, target, ignore...)`
//! 3. Hutool    - `BeanUtil.copyProperties(source, target|Class, ignoreCase|ignore...)`
//! 4. Cglib     - `BeanCopier.create(Source.class, Target.class, useConverter)`
//! 5. Custom    - `BeanCopyUtil.copy(source, target|Class, ignore)`

use std::collections::{BTreeSet, HashSet};

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::host::{CallSite, Expression};
use crate::types::TypeRef;

/// Method expressions that look like a bulk copy, as written at the call site.
static COPY_CALLS: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut calls: HashSet<String> = [
        "copyProperties",
        "BeanUtil.copyProperties",
        "BeanUtils.copyProperties",
        "BeanCopier.create",
        "BeanCopyUtil.copy",
        "BeanCopyUtil.copyPropertiesIgnoreNull",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for convention in CopyConvention::ALL {
        calls.insert(format!("{}.copyProperties", convention.qualified_name()));
    }
    calls.insert(format!("{}.create", CopyConvention::CglibCopier.qualified_name()));
    calls
});

/// Apache's single-property setter, which the diagnostics pass checks separately.
const COPY_PROPERTY_CALLS: &[&str] = &[
    "BeanUtils.copyProperty",
    "org.apache.commons.beanutils.BeanUtils.copyProperty",
];

/// Cheap textual pre-filter before any type resolution happens.
pub fn is_copy_call(method_text: &str) -> bool {
    COPY_CALLS.contains(method_text)
}

/// `BeanUtils.copyProperty(bean, "name", value)` as written.
pub fn is_copy_property_call(method_text: &str) -> bool {
    COPY_PROPERTY_CALLS.contains(&method_text)
}

/// What a convention extracted from a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionInput {
    pub convention: CopyConvention,
    pub source_type: TypeRef,
    pub target_type: TypeRef,
    pub ignore_names: BTreeSet<String>,
    pub case_insensitive: bool,
}

/// A recognized copy-call convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CopyConvention {
    #[serde(rename = "apache")]
    Apache,
    #[serde(rename = "spring")]
    Spring,
    #[serde(rename = "hutool")]
    Hutool,
    #[serde(rename = "cglib")]
    CglibCopier,
    #[serde(rename = "custom")]
    CustomUtil,
}

impl CopyConvention {
    /// Every convention, in resolution priority order.
    pub const ALL: [CopyConvention; 5] = [
        CopyConvention::Apache,
        CopyConvention::Spring,
        CopyConvention::Hutool,
        CopyConvention::CglibCopier,
        CopyConvention::CustomUtil,
    ];

    /// Short identifier used in config files and statistics.
    pub fn id(&self) -> &'static str {
        match self {
            CopyConvention::Apache => "apache",
            CopyConvention::Spring => "spring",
            CopyConvention::Hutool => "hutool",
            CopyConvention::CglibCopier => "cglib",
            CopyConvention::CustomUtil => "custom",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Class that declares the copy method.
    pub fn qualified_name(&self) -> &'static str {
        match self {
            CopyConvention::Apache => "org.apache.commons.beanutils.BeanUtils",
            CopyConvention::Spring => "org.springframework.beans.BeanUtils",
            CopyConvention::Hutool => "cn.hutool.core.bean.BeanUtil",
            CopyConvention::CglibCopier => "org.springframework.cglib.beans.BeanCopier",
            CopyConvention::CustomUtil => "BeanCopyUtil",
        }
    }

    /// Callee gate. The in-house utility lives in whatever package a
    /// project put it, so only its simple name is checked.
    fn claims_callee(&self, callee: &str) -> bool {
        match self {
            CopyConvention::CustomUtil => callee.ends_with(self.qualified_name()),
            _ => callee == self.qualified_name(),
        }
    }

    /// Whether this convention recognizes the call site.
    ///
    /// Beyond the callee gate, some argument shapes are refused because what
    /// the call copies cannot be known statically.
    pub fn is_support<C: CallSite>(&self, call: &C) -> Result<bool> {
        let Some(callee) = call.callee_class()? else {
            return Ok(false);
        };
        if !self.claims_callee(&callee) {
            return Ok(false);
        }

        let args = call.arguments();
        let supported = match self {
            CopyConvention::Apache => true,
            CopyConvention::Spring => {
                // copyProperties(Object, Object, Class<?> editable, ...) is refused
                match args.len() {
                    2 => true,
                    n if n >= 3 => !args[2].static_type()?.is_some_and(|ty| ty.is_class()),
                    _ => true,
                }
            }
            CopyConvention::Hutool => {
                // copyProperties(Object, Object, CopyOptions) is refused
                !(args.len() == 3
                    && args[2]
                        .static_type()?
                        .is_some_and(|ty| ty.simple_name() == "CopyOptions"))
            }
            CopyConvention::CglibCopier => {
                // useConverter = true delegates to a converter we cannot see into
                !args.get(2).is_some_and(|arg| arg.is_true_literal())
            }
            CopyConvention::CustomUtil => match args.len() {
                // copy(source, Class, String...) only; BiConsumer and Converter forms are refused
                3 => args[2].is_string_literal(),
                // copy(source, Class, true, Converter)
                4 => !args[2].is_true_literal(),
                _ => true,
            },
        };
        Ok(supported)
    }

    /// Pull source type, target type and ignore list out of the call.
    ///
    /// `Ok(None)` when either type is not statically known. Missing
    /// arguments are an error: `is_support` said yes to a malformed call.
    pub fn extract<C: CallSite>(&self, call: &C) -> Result<Option<ResolutionInput>> {
        let args = call.arguments();
        let mut case_insensitive = false;

        let (source, target, ignore_names) = match self {
            CopyConvention::Apache => {
                // Destination first, origin second
                let target = arg(args, 0)?.static_type()?;
                let origin = if args.len() >= 3 && arg(args, 1)?.is_string_literal() {
                    // copyProperty(bean, "name", value)
                    arg(args, 2)?
                } else {
                    arg(args, 1)?
                };
                (origin.static_type()?, target, BTreeSet::new())
            }
            CopyConvention::Spring => (
                arg(args, 0)?.static_type()?,
                arg(args, 1)?.static_type()?,
                ignore_names(args),
            ),
            CopyConvention::Hutool => {
                case_insensitive = args.len() >= 3 && args[2].is_true_literal();
                (
                    arg(args, 0)?.static_type()?,
                    target_type(arg(args, 1)?)?,
                    ignore_names(args),
                )
            }
            CopyConvention::CglibCopier => (
                arg(args, 0)?.class_literal_type(),
                arg(args, 1)?.class_literal_type(),
                ignore_names(args),
            ),
            CopyConvention::CustomUtil => {
                let ignore = if args.len() == 3 && args[2].is_string_literal() {
                    ignore_names(args)
                } else {
                    BTreeSet::new()
                };
                (
                    arg(args, 0)?.static_type()?,
                    target_type(arg(args, 1)?)?,
                    ignore,
                )
            }
        };

        let (Some(source_type), Some(target_type)) = (source, target) else {
            return Ok(None);
        };

        Ok(Some(ResolutionInput {
            convention: *self,
            source_type,
            target_type,
            ignore_names,
            case_insensitive,
        }))
    }
}

fn arg<E>(args: &[E], index: usize) -> Result<&E> {
    match args.get(index) {
        Some(expr) => Ok(expr),
        None => bail!(
            "call has {} argument(s), argument {} is required",
            args.len(),
            index
        ),
    }
}

/// Target given either as an instance or as `Target.class`.
fn target_type<E: Expression>(expr: &E) -> Result<Option<TypeRef>> {
    match expr.class_literal_type() {
        Some(ty) => Ok(Some(ty)),
        None => expr.static_type(),
    }
}

/// String literals from the third argument on. Anything else is skipped.
pub fn ignore_names<E: Expression>(args: &[E]) -> BTreeSet<String> {
    if args.len() <= 2 {
        return BTreeSet::new();
    }
    args.iter()
        .skip(2)
        .filter(|expr| expr.is_string_literal())
        .filter_map(|expr| expr.unquoted_literal())
        .collect()
}
