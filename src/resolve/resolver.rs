//! Call resolver: tries each convention in priority order.
//!
//! The resolver is the engine's only entry point:
//! 1. Asks each enabled convention whether it recognizes the call
//! 2. Lets the first one that does extract source, target and ignores
//! 3. Hands the extraction to the reconciler
//! 4. Folds every expected failure into `Outcome::NotApplicable`

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use super::conventions::CopyConvention;
use crate::config::EngineConfig;
use crate::host::{is_cancelled, CallSite, Cancelled, TypeModel};
use crate::reconcile::{Reconciler, Reconciliation};

/// Why a call site produced no reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotApplicable {
    /// No enabled convention claims the callee
    Unrecognized,
    /// A convention matched but a type could not be resolved statically
    UnresolvedType(CopyConvention),
    /// The host failed while the call was being read
    ExtractionFault {
        convention: Option<CopyConvention>,
        message: String,
    },
}

/// Result of resolving one call site.
#[derive(Debug, Clone)]
pub enum Outcome {
    Resolved(Reconciliation),
    NotApplicable(NotApplicable),
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved(_))
    }

    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        match self {
            Outcome::Resolved(r) => Some(r),
            Outcome::NotApplicable(_) => None,
        }
    }

    /// "Show nothing" view for consumers that do not care why.
    pub fn into_reconciliation(self) -> Option<Reconciliation> {
        match self {
            Outcome::Resolved(r) => Some(r),
            Outcome::NotApplicable(_) => None,
        }
    }
}

/// Resolves call sites against a fixed, ordered list of conventions.
///
/// Immutable once built, so one resolver can serve many threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    conventions: Vec<CopyConvention>,
    reconciler: Reconciler,
}

impl Resolver {
    /// All conventions, default engine settings.
    pub fn new() -> Self {
        ResolverBuilder::new().build()
    }

    /// Conventions tried, in order.
    pub fn conventions(&self) -> &[CopyConvention] {
        &self.conventions
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// First enabled convention that recognizes the call.
    pub fn select<C: CallSite>(&self, call: &C) -> Result<Option<CopyConvention>> {
        for &convention in &self.conventions {
            if convention.is_support(call)? {
                return Ok(Some(convention));
            }
        }
        Ok(None)
    }

    /// Resolve a call site into a reconciliation.
    ///
    /// Only a host cancellation is returned as an error; anything else that
    /// goes wrong is reported as `NotApplicable`. The first convention that
    /// recognizes the call decides the outcome, later ones are not consulted.
    pub fn resolve<C, M>(&self, call: &C, model: &M) -> Result<Outcome, Cancelled>
    where
        C: CallSite,
        M: TypeModel + ?Sized,
    {
        let convention = match self.select(call) {
            Ok(Some(convention)) => convention,
            Ok(None) => return Ok(Outcome::NotApplicable(NotApplicable::Unrecognized)),
            Err(err) => return fault(call, None, err),
        };
        debug!(method = call.method_text(), convention = convention.id(), "copy call recognized");

        let attempt = convention.extract(call).and_then(|input| match input {
            Some(input) => self.reconciler.reconcile(input, model),
            None => Ok(None),
        });

        match attempt {
            Ok(Some(reconciliation)) => Ok(Outcome::Resolved(reconciliation)),
            Ok(None) => {
                debug!(
                    method = call.method_text(),
                    convention = convention.id(),
                    "source or target type not resolvable"
                );
                Ok(Outcome::NotApplicable(NotApplicable::UnresolvedType(convention)))
            }
            Err(err) => fault(call, Some(convention), err),
        }
    }

    /// Resolution statistics over a batch of call sites.
    pub fn stats<C, M>(&self, calls: &[C], model: &M) -> Result<ResolutionStats, Cancelled>
    where
        C: CallSite,
        M: TypeModel + ?Sized,
    {
        let mut stats = ResolutionStats::default();

        for call in calls {
            stats.total_calls += 1;
            match self.resolve(call, model)? {
                Outcome::Resolved(r) => {
                    *stats.by_convention.entry(r.convention.id()).or_insert(0) += 1;
                }
                Outcome::NotApplicable(NotApplicable::ExtractionFault { .. }) => {
                    stats.faults += 1;
                    stats.unresolved += 1;
                }
                Outcome::NotApplicable(_) => stats.unresolved += 1,
            }
        }

        Ok(stats)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

fn fault<C: CallSite>(
    call: &C,
    convention: Option<CopyConvention>,
    err: anyhow::Error,
) -> Result<Outcome, Cancelled> {
    if is_cancelled(&err) {
        return Err(Cancelled);
    }
    let message = format!("{:#}", err);
    warn!(
        method = call.method_text(),
        convention = ?convention,
        error = %message,
        "copy call could not be analyzed"
    );
    Ok(Outcome::NotApplicable(NotApplicable::ExtractionFault { convention, message }))
}

/// Statistics about call resolution
#[derive(Debug, Default)]
pub struct ResolutionStats {
    pub total_calls: usize,
    pub unresolved: usize,
    /// Subset of `unresolved` caused by host failures
    pub faults: usize,
    pub by_convention: HashMap<&'static str, usize>,
}

impl ResolutionStats {
    pub fn resolution_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 1.0;
        }
        (self.total_calls - self.unresolved) as f64 / self.total_calls as f64
    }
}

/// Builder for a resolver with a chosen subset of conventions.
pub struct ResolverBuilder {
    config: EngineConfig,
    apache: bool,
    spring: bool,
    hutool: bool,
    cglib: bool,
    custom: bool,
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            apache: true,
            spring: true,
            hutool: true,
            cglib: true,
            custom: true,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn apache(mut self, enabled: bool) -> Self {
        self.apache = enabled;
        self
    }

    pub fn spring(mut self, enabled: bool) -> Self {
        self.spring = enabled;
        self
    }

    pub fn hutool(mut self, enabled: bool) -> Self {
        self.hutool = enabled;
        self
    }

    pub fn cglib(mut self, enabled: bool) -> Self {
        self.cglib = enabled;
        self
    }

    pub fn custom(mut self, enabled: bool) -> Self {
        self.custom = enabled;
        self
    }

    pub fn convention(self, convention: CopyConvention, enabled: bool) -> Self {
        match convention {
            CopyConvention::Apache => self.apache(enabled),
            CopyConvention::Spring => self.spring(enabled),
            CopyConvention::Hutool => self.hutool(enabled),
            CopyConvention::CglibCopier => self.cglib(enabled),
            CopyConvention::CustomUtil => self.custom(enabled),
        }
    }

    fn is_enabled(&self, convention: CopyConvention) -> bool {
        match convention {
            CopyConvention::Apache => self.apache,
            CopyConvention::Spring => self.spring,
            CopyConvention::Hutool => self.hutool,
            CopyConvention::CglibCopier => self.cglib,
            CopyConvention::CustomUtil => self.custom,
        }
    }

    pub fn build(self) -> Resolver {
        // Priority order is fixed regardless of toggle order
        let conventions = CopyConvention::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect();

        Resolver {
            conventions,
            reconciler: Reconciler::new(self.config),
        }
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
