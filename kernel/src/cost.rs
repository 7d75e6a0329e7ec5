//! Traversal costs.
//!
//! A cost is the price of *entering* a node. Costs are non-negative reals;
//! [`INFINITE_COST`] marks a node as impassable. Negative values and NaN are
//! configuration errors and are rejected by [`validate_cost`] at the point a
//! cost enters the planner.

/// Cost of entering a node, or an accumulated path cost.
pub type Cost = f64;

/// Cost of an impassable node, and the estimate of an unreachable one.
pub const INFINITE_COST: Cost = f64::INFINITY;

/// Rejected cost value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostError {
    /// Costs must be `>= 0`.
    Negative { value: Cost },
    /// NaN has no place in an ordering key.
    NotANumber,
}

impl std::fmt::Display for CostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative { value } => write!(f, "negative cost {value}"),
            Self::NotANumber => write!(f, "cost is NaN"),
        }
    }
}

impl std::error::Error for CostError {}

/// Validate a cost supplied from outside the planner.
///
/// # Errors
///
/// Returns [`CostError::NotANumber`] for NaN and [`CostError::Negative`] for
/// values below zero (including `-infinity`).
pub fn validate_cost(value: Cost) -> Result<Cost, CostError> {
    if value.is_nan() {
        return Err(CostError::NotANumber);
    }
    if value < 0.0 {
        return Err(CostError::Negative { value });
    }
    // Normalize -0.0 so bitwise and numeric equality agree downstream.
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Whether `value` marks an impassable node or an unreachable estimate.
#[must_use]
pub fn is_infinite(value: Cost) -> bool {
    value == INFINITE_COST
}

/// Integer-free textual encoding of a cost for canonical artifacts.
///
/// Canonical JSON admits integers only, so real values are written as
/// `"inf"` or as the 16-digit hex of their IEEE-754 bit pattern. The encoding
/// is exact and platform independent.
#[must_use]
pub fn cost_repr(value: Cost) -> String {
    if is_infinite(value) {
        "inf".to_string()
    } else {
        hex::encode(value.to_bits().to_be_bytes())
    }
}

/// Inverse of [`cost_repr`]. Returns `None` for malformed input.
#[must_use]
pub fn parse_cost_repr(repr: &str) -> Option<Cost> {
    if repr == "inf" {
        return Some(INFINITE_COST);
    }
    let bytes: [u8; 8] = hex::decode(repr).ok()?.try_into().ok()?;
    Some(f64::from_bits(u64::from_be_bytes(bytes)))
}
