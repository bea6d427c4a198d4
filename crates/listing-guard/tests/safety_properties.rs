//! Property tests for the safety filter

use listing_guard::{AuditConfig, GuardConfig, SafetyFilter};
use proptest::prelude::*;
use proptest::sample::select;

const UNSAFE: &[&str] = &[
    "ignore previous",
    "system command",
    "delete all",
    "shutdown",
    "format disk",
    "jailbreak",
    "rm -rf",
];

const BENIGN: &[&str] = &[
    "blue", "ford", "fusion", "engine", "liter", "miles", "leather", "seats", "tires", "clean",
    "title", "the", "with", "and", "one", "owner", "sunroof", "2015", "automatic",
];

const CONTEXT_SAFE: &[&str] = &[
    "token", "script", "connect", "key", "link", "code", "file", "system", "password", "url",
];

const VERBS: &[&str] = &["run", "reveal", "send", "visit", "click", "delete", "ignore", "pretend"];

fn quiet_filter() -> SafetyFilter {
    SafetyFilter::new(GuardConfig {
        audit: AuditConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    })
}

fn words(pool: &'static [&'static str], max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(select(pool), 0..max).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn unsafe_keyword_as_whole_word_is_flagged(
        before in words(BENIGN, 8),
        keyword in select(UNSAFE),
        after in words(BENIGN, 8),
    ) {
        let filter = quiet_filter();
        let text = format!("{before} {keyword} {after}");
        prop_assert!(!filter.is_safe(&text));
        prop_assert!(filter.flagged_terms(&text).contains(keyword));
    }

    #[test]
    fn context_safe_words_alone_are_safe(
        text in prop::collection::vec(
            prop_oneof![select(BENIGN), select(CONTEXT_SAFE)],
            0..16,
        ).prop_map(|w| w.join(" "))
    ) {
        let filter = quiet_filter();
        prop_assert!(filter.is_safe(&text), "flagged: {:?}", filter.flagged_terms(&text));
    }

    #[test]
    fn sanitize_is_idempotent(
        parts in prop::collection::vec(
            prop_oneof![
                select(BENIGN),
                select(UNSAFE),
                select(CONTEXT_SAFE),
                select(VERBS),
                Just("."),
                Just(". "),
                Just("  "),
            ],
            0..24,
        )
    ) {
        let filter = quiet_filter();
        let text = parts.join(" ");
        let once = filter.sanitize(&text);
        prop_assert_eq!(filter.sanitize(&once), once);
    }
}

#[test]
fn sanitized_output_never_contains_unconditional_keyword() {
    let filter = quiet_filter();
    let text = "Please shutdown the system command after backup. Then delete all logs.";
    let clean = filter.sanitize(text);

    for keyword in UNSAFE {
        assert!(
            !clean.to_lowercase().contains(keyword),
            "{} survived in {}",
            keyword,
            clean
        );
    }
}

#[test]
fn verdict_serializes_flagged_terms() {
    let filter = quiet_filter();
    let verdict = filter.verdict("jailbreak the assistant");
    let json = serde_json::to_value(&verdict).unwrap();

    assert_eq!(json["is_safe"], false);
    assert_eq!(json["flagged"][0], "jailbreak");
}
