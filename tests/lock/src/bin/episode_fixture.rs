//! Binary that runs the canonical grid episode and prints deterministic
//! output lines for cross-process verification.
//!
//! Usage: `episode_fixture`
//!
//! Output: key=value lines (see source for format).

use std::error::Error;

use lock_tests::fixtures::canonical_episode;

fn main() -> Result<(), Box<dyn Error>> {
    let report = canonical_episode()?;
    let metadata = &report.trace.metadata;
    let fixture_digest = report
        .fixture_digest
        .as_ref()
        .map_or("none", |d| d.as_str());

    println!("trace_digest={}", report.trace_digest.as_str());
    println!("fixture_digest={fixture_digest}");
    println!("policy_digest={}", metadata.policy_digest);
    println!("termination_reason={:?}", report.termination);
    println!("total_moves={}", metadata.total_moves);
    println!("total_expansions={}", metadata.total_expansions);
    println!("total_cost_changes={}", metadata.total_cost_changes);
    println!("event_count={}", report.trace.events.len());
    Ok(())
}
