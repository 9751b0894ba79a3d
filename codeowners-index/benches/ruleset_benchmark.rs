use codeowners_index::{Rule, RuleSet};
use criterion::{criterion_group, criterion_main, Criterion};

const TEST_PATHS: &[&str] = &[
    "file-a",
    "dir-a/file-a",
    "dir-a/dir-c/file-a",
    "dir-a/dir-c/file-b",
    "dir-b/file-a",
    "dir-b/dir-d/dir-e/dir-f/dir-g/file-a",
];

const TEST_PATTERNS: &[&str] = &[
    "*",
    "*-a",
    "file-*",
    "/dir-b",
    "dir-a/dir-b",
    "**/dir-*/file-*",
    "dir-*/*",
    "dir-b/dir-d/dir-e/dir-f/dir-g/file-a",
    "dir-[ab]/dir-?/",
];

fn build_ruleset(patterns: &[&str]) -> RuleSet {
    let rules = patterns
        .iter()
        .enumerate()
        .map(|(idx, &pattern)| Rule::new(pattern, vec!["@owner".into()], idx + 1).unwrap())
        .collect();

    RuleSet::new(rules)
}

fn ruleset_benchmark(c: &mut Criterion) {
    c.bench_function("building", |b| b.iter(|| build_ruleset(TEST_PATTERNS)));

    let ruleset = build_ruleset(TEST_PATTERNS);
    c.bench_function("resolving", |b| {
        b.iter(|| {
            for p in TEST_PATHS {
                ruleset.owners(p, false);
            }
        })
    });
}

criterion_group!(benches, ruleset_benchmark);
criterion_main!(benches);
