//! Cross-process determinism lock test.
//!
//! Spawns the `episode_fixture` binary under four environment variants
//! (working directory, locale, timezone) and asserts every variant prints
//! identical output, matching the in-process digest.

use std::path::Path;
use std::process::Command;

use lock_tests::fixtures::canonical_episode;

fn workspace_root() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists")
        .to_string_lossy()
        .to_string()
}

fn run_variant(work_dir: &str, env_overrides: &[(&str, &str)]) -> String {
    let bin = env!("CARGO_BIN_EXE_episode_fixture");

    let mut command = Command::new(bin);
    command.current_dir(work_dir);
    command
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("LANGUAGE");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command.output().unwrap_or_else(|e| {
        panic!("failed to spawn {bin} (work_dir={work_dir}, overrides={env_overrides:?}): {e}")
    });
    assert!(
        output.status.success(),
        "episode_fixture exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

#[test]
fn crossproc_determinism_four_env_variants() {
    let root = workspace_root();
    let baseline = run_variant(&root, &[]);
    assert!(baseline.contains("trace_digest=sha256:"), "baseline: {baseline}");
    assert!(baseline.contains("termination_reason=GoalReached"), "baseline: {baseline}");

    let scratch = tempfile::tempdir().expect("create temp dir");
    let scratch_path = scratch.path().to_string_lossy().to_string();
    let variants: [(&str, &[(&str, &str)]); 3] = [
        (scratch_path.as_str(), &[]),
        (&root, &[("LC_ALL", "C")]),
        (&root, &[("TZ", "Pacific/Kiritimati"), ("LANG", "tr_TR.UTF-8")]),
    ];
    for (dir, overrides) in variants {
        let output = run_variant(dir, overrides);
        assert_eq!(output, baseline, "variant dir={dir} overrides={overrides:?}");
    }
}

#[test]
fn crossproc_digest_matches_inproc() {
    let report = canonical_episode().unwrap();
    let output = run_variant(&workspace_root(), &[]);
    let expected = format!("trace_digest={}\n", report.trace_digest.as_str());
    assert!(output.starts_with(&expected), "in-process {expected} vs {output}");
}
