//! Hash domain governance lock tests.
//!
//! Proves:
//! 1. Canonical domain set has expected count (catches forgotten additions to ALL)
//! 2. All domain byte strings are unique (prevents domain collision)
//! 3. All domains are null-terminated (wire format invariant)
//! 4. All domains follow `REPLAN::*::V1\0` naming convention
//! 5. No raw `REPLAN::` domain literals in production source outside `hash_domain.rs`

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use replan_kernel::proof::hash::HashDomain;

#[test]
fn hash_domain_canonical_set_count() {
    assert_eq!(
        HashDomain::ALL.len(),
        3,
        "expected 3 domain variants; if you added a new domain, update this count"
    );
}

#[test]
fn hash_domain_all_unique_bytes() {
    let mut seen = BTreeSet::new();
    for domain in HashDomain::ALL {
        assert!(
            seen.insert(domain.as_bytes()),
            "duplicate domain bytes: {domain}"
        );
    }
}

#[test]
fn hash_domain_all_null_terminated() {
    for domain in HashDomain::ALL {
        assert!(
            domain.as_bytes().ends_with(&[0]),
            "{domain} is not null-terminated"
        );
    }
}

#[test]
fn hash_domain_all_follow_naming_convention() {
    for domain in HashDomain::ALL {
        let bytes = domain.as_bytes();
        assert!(bytes.starts_with(b"REPLAN::"), "{domain} does not start with REPLAN::");
        assert!(bytes.ends_with(b"::V1\0"), "{domain} does not end with ::V1\\0");
    }
}

fn collect_rs_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }
}

#[test]
fn no_raw_domain_literals_outside_hash_domain() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists");

    let mut files = Vec::new();
    for crate_src in ["kernel/src", "search/src", "harness/src"] {
        collect_rs_files(&root.join(crate_src), &mut files);
    }
    assert!(!files.is_empty(), "no production sources found under {}", root.display());

    let mut violations = Vec::new();
    for path in files {
        if path.ends_with("hash_domain.rs") {
            continue;
        }
        let content = fs::read_to_string(&path).expect("readable source");
        for (line_no, line) in content.lines().enumerate() {
            if line.contains("b\"REPLAN::") {
                violations.push(format!("{}:{}: {}", path.display(), line_no + 1, line.trim()));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "raw hash domain literals outside hash_domain.rs:\n{}",
        violations.join("\n")
    );
}
