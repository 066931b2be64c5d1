//! Property-Based Tests for the Entitlement Engine
//!
//! Verifies invariants over random inputs:
//!
//! - **Fingerprint normalization**: casing, whitespace, and punctuation
//!   noise never changes a project's fingerprint; materially different
//!   attributes do.
//! - **Counter accounting**: effective usage respects the daily anchor,
//!   and admission arithmetic never exceeds the cap.
//!
//! # Running the Tests
//!
//! ```bash
//! cargo test --lib entitlement::proptests
//! ```

use proptest::prelude::*;

use super::plan::Period;
use super::project_lock::{normalize, ProjectContext};
use super::store::Counter;

const MAX_LEN: usize = 500;

// Helper: word-like attribute content (no punctuation, no extra spaces)
fn arb_words() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,10}", 1..5).prop_map(|words| words.join(" "))
}

// Helper: inject random case flips and surrounding/extra whitespace
fn noisy(base: &str, seed: u64) -> String {
    let mut out = String::new();
    let mut bits = seed;
    out.push_str("  ");
    for c in base.chars() {
        if c == ' ' {
            out.push_str(if bits & 1 == 0 { " " } else { "   " });
        } else if bits & 1 == 0 {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        bits = bits.rotate_right(1);
    }
    out.push('\t');
    out
}

proptest! {
    /// Case and whitespace noise never changes the fingerprint
    #[test]
    fn prop_fingerprint_ignores_case_and_whitespace(
        topic in arb_words(),
        audience in arb_words(),
        blocker in arb_words(),
        seed in any::<u64>(),
    ) {
        let clean = ProjectContext::new(topic.clone(), audience.clone(), blocker.clone());
        let dirty = ProjectContext::new(
            noisy(&topic, seed),
            noisy(&audience, seed.rotate_left(7)),
            noisy(&blocker, seed.rotate_left(13)),
        );

        prop_assert_eq!(clean.fingerprint(MAX_LEN), dirty.fingerprint(MAX_LEN));
    }

    /// Punctuation is stripped before hashing
    #[test]
    fn prop_fingerprint_ignores_punctuation(
        topic in arb_words(),
        audience in arb_words(),
        blocker in arb_words(),
    ) {
        let clean = ProjectContext::new(topic.clone(), audience.clone(), blocker.clone());
        let punctuated = ProjectContext::new(
            format!("{}!!!", topic),
            format!("\"{}\"", audience),
            format!("{}...", blocker),
        );

        prop_assert_eq!(clean.fingerprint(MAX_LEN), punctuated.fingerprint(MAX_LEN));
    }

    /// A genuinely different topic is a different project
    #[test]
    fn prop_fingerprint_distinguishes_topics(
        topic in arb_words(),
        audience in arb_words(),
        blocker in arb_words(),
        extra in "[a-z]{3,8}",
    ) {
        let a = ProjectContext::new(topic.clone(), audience.clone(), blocker.clone());
        let b = ProjectContext::new(format!("{} {}", topic, extra), audience, blocker);

        prop_assert_ne!(a.fingerprint(MAX_LEN), b.fingerprint(MAX_LEN));
    }

    /// Normalization is idempotent
    #[test]
    fn prop_normalize_idempotent(value in ".{0,200}") {
        let once = normalize(&value, MAX_LEN);
        let twice = normalize(&once, MAX_LEN);
        prop_assert_eq!(once, twice);
    }

    /// Normalized output never exceeds the bound and never holds
    /// uppercase or punctuation
    #[test]
    fn prop_normalize_output_shape(value in ".{0,600}", max_len in 1usize..=500) {
        let normalized = normalize(&value, max_len);

        prop_assert!(normalized.chars().count() <= max_len);
        prop_assert!(!normalized.chars().any(|c| c.is_uppercase()));
        prop_assert!(normalized
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == ' '));
        prop_assert!(!normalized.contains("  "));
    }

    /// A stale daily anchor always counts as zero; a current one counts
    /// in full
    #[test]
    fn prop_effective_used_respects_anchor(used in 0u32..1000, day_offset in 1i64..365) {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let stale = today - chrono::Duration::days(day_offset);

        let current = Counter { used, period_anchor: Some(today) };
        let outdated = Counter { used, period_anchor: Some(stale) };

        prop_assert_eq!(current.effective_used(Period::Daily, today), used);
        prop_assert_eq!(outdated.effective_used(Period::Daily, today), 0);
        prop_assert_eq!(outdated.effective_used(Period::Total, today), used);
    }
}
