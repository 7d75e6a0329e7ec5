//! Replanning policy: work budgets and self-check configuration.

use replan_kernel::proof::canon::{canonical_json_bytes, CanonError};
use replan_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

use crate::error::ReplanError;

/// Budgets and checks for a planning episode.
///
/// Bounding work is the caller's decision: an exhausted repair budget is
/// reported as "not yet converged", never as "no path".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplanPolicyV1 {
    /// Hard cap on open-list pops per `compute_shortest_path` call.
    pub max_expansions_per_repair: u64,
    /// Hard cap on moves made by `run`.
    pub max_moves: u64,
    /// When to verify the open-list/consistency invariant.
    pub invariant_checks: InvariantChecksV1,
    /// Record per-event trace entries (counters are always kept).
    pub record_events: bool,
}

impl ReplanPolicyV1 {
    /// Validate budgets before any planning work starts.
    ///
    /// # Errors
    ///
    /// Returns [`ReplanError::UnsupportedPolicy`] if a budget is zero.
    pub fn validate(&self) -> Result<(), ReplanError> {
        if self.max_expansions_per_repair == 0 {
            return Err(ReplanError::UnsupportedPolicy {
                detail: "max_expansions_per_repair must be at least 1".into(),
            });
        }
        if self.max_moves == 0 {
            return Err(ReplanError::UnsupportedPolicy {
                detail: "max_moves must be at least 1".into(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "invariant_checks": self.invariant_checks.as_str(),
            "max_expansions_per_repair": self.max_expansions_per_repair,
            "max_moves": self.max_moves,
            "record_events": self.record_events,
        })
    }

    /// Content digest of the canonical policy snapshot.
    ///
    /// # Errors
    ///
    /// Propagates [`CanonError`] from canonical serialization.
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        let bytes = canonical_json_bytes(&self.to_json_value())?;
        Ok(canonical_hash(HashDomain::ReplanPolicy, &bytes))
    }
}

impl Default for ReplanPolicyV1 {
    fn default() -> Self {
        Self {
            max_expansions_per_repair: 1_000_000,
            max_moves: 100_000,
            invariant_checks: InvariantChecksV1::default(),
            record_events: true,
        }
    }
}

/// Invariant self-check mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantChecksV1 {
    /// Never check.
    Off,
    /// Check after `initialize`, each repair, and each cost-change batch.
    Boundaries,
}

impl InvariantChecksV1 {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Boundaries => "boundaries",
        }
    }
}

impl Default for InvariantChecksV1 {
    /// `Boundaries` in debug builds, `Off` in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Boundaries
        } else {
            Self::Off
        }
    }
}
