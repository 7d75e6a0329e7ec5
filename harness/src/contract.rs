//! World fixture contract: what a world exposes so episodes can be bound to
//! the exact graph they ran on.
//!
//! Worlds provide topology, costs and heuristics through
//! [`GraphProvider`](replan_search::contract::GraphProvider). The fixture
//! contract adds a stable identifier and a canonical description; the digest
//! is computed here, never by the world.

use replan_kernel::proof::canon::{canonical_json_bytes, CanonError};
use replan_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

/// A world that can describe itself as a canonical fixture.
pub trait WorldFixtureV1 {
    /// Unique world identifier (e.g., `"grid"`).
    fn world_id(&self) -> &str;

    /// Canonical description of the world: topology plus initial costs.
    ///
    /// Must contain integers and strings only (reals go through
    /// [`cost_repr`](replan_kernel::cost::cost_repr)).
    fn fixture_json(&self) -> serde_json::Value;

    /// Domain-separated digest of [`WorldFixtureV1::fixture_json`].
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if the fixture is not canonicalizable.
    fn fixture_digest(&self) -> Result<ContentHash, CanonError> {
        let bytes = canonical_json_bytes(&self.fixture_json())?;
        Ok(canonical_hash(HashDomain::WorldFixture, &bytes))
    }
}
