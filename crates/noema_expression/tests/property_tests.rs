//! Property-based tests for the expression surfaces.
//!
//! Uses proptest to verify invariants that must hold for ALL possible inputs,
//! not just hand-picked examples. This catches edge cases that unit tests miss.

use proptest::prelude::*;

use noema_core::config::ChannelConfig;
use noema_core::{read_jsonl, NullNotes};
use noema_expression::{gloss_for, Caregiver, SymbolChannel, VOCAB};

// ============================================================================
// Strategies
// ============================================================================

fn arb_unit() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

fn arb_triggers() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        prop_oneof![Just("overload".to_string()), Just("relaxed".to_string())],
        0..3,
    )
}

fn arb_dominant() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("curiosity".to_string()),
        Just("stability".to_string()),
        Just("pattern_completion".to_string()),
        Just("truth_seeking".to_string()),
        Just("overload_regulation".to_string()),
    ]
}

fn arb_fingerprint() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[RGBY][o^s]", 0..6)
}

/// One full set of channel inputs for a single tick.
#[allow(clippy::type_complexity)]
fn arb_tick_inputs(
) -> impl Strategy<Value = (f64, f64, f64, Vec<String>, u32, Vec<String>, String)> {
    (
        arb_unit(),
        arb_unit(),
        arb_unit(),
        arb_fingerprint(),
        0u32..10,
        arb_triggers(),
        arb_dominant(),
    )
}

/// Tokens the organism might hand to the caregiver, valid or not.
fn arb_emitted() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        prop_oneof![
            Just("N!".to_string()),
            Just("N↑".to_string()),
            Just("Stab↓".to_string()),
            Just("?".to_string()),
            Just("Over!".to_string()),
            Just("Loop?".to_string()),
            Just("Pat→".to_string()),
        ],
        0..4,
    )
}

// ============================================================================
// Channel properties
// ============================================================================

proptest! {
    /// Whatever gets said is vocabulary, each token at most once, and
    /// the glosses line up one-to-one.
    #[test]
    fn emissions_draw_from_the_vocabulary(
        steps in proptest::collection::vec(arb_tick_inputs(), 1..40)
    ) {
        let mut ch = SymbolChannel::new(&ChannelConfig::default());
        for (tick, (novelty, boredom, top_sim, unique, noop_streak, triggers, dominant)) in
            steps.into_iter().enumerate()
        {
            let Some(emission) = ch.step(
                tick as u64,
                novelty,
                boredom,
                top_sim,
                &unique,
                noop_streak,
                &triggers,
                &dominant,
                &mut NullNotes,
            ) else {
                continue;
            };
            prop_assert!(!emission.tokens.is_empty());
            prop_assert_eq!(emission.tokens.len(), emission.glosses.len());
            for (token, gloss) in emission.tokens.iter().zip(&emission.glosses) {
                prop_assert!(VOCAB.iter().any(|(t, _)| t == token), "unknown token {token}");
                prop_assert_eq!(Some(gloss.as_str()), gloss_for(token));
            }
            let mut seen = emission.tokens.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), emission.tokens.len(), "duplicate token emitted");
        }
    }

    /// Consecutive emissions are always at least a full cooldown apart.
    #[test]
    fn cooldown_gap_is_respected(
        steps in proptest::collection::vec(arb_tick_inputs(), 1..60)
    ) {
        let cfg = ChannelConfig::default();
        let mut ch = SymbolChannel::new(&cfg);
        let mut last_emit: Option<u64> = None;
        for (tick, (novelty, boredom, top_sim, unique, noop_streak, triggers, dominant)) in
            steps.into_iter().enumerate()
        {
            let tick = tick as u64;
            let spoke = ch
                .step(
                    tick,
                    novelty,
                    boredom,
                    top_sim,
                    &unique,
                    noop_streak,
                    &triggers,
                    &dominant,
                    &mut NullNotes,
                )
                .is_some();
            if spoke {
                if let Some(prev) = last_emit {
                    prop_assert!(
                        tick - prev >= cfg.cooldown_ticks as u64,
                        "spoke at {prev} and again at {tick}"
                    );
                }
                last_emit = Some(tick);
            }
        }
    }

    /// Sharp novelty and rising novelty are mutually exclusive readings
    /// of the same signal.
    #[test]
    fn at_most_one_novelty_token(
        steps in proptest::collection::vec(arb_tick_inputs(), 1..40)
    ) {
        let mut ch = SymbolChannel::new(&ChannelConfig::default());
        for (tick, (novelty, boredom, top_sim, unique, noop_streak, triggers, dominant)) in
            steps.into_iter().enumerate()
        {
            if let Some(emission) = ch.step(
                tick as u64,
                novelty,
                boredom,
                top_sim,
                &unique,
                noop_streak,
                &triggers,
                &dominant,
                &mut NullNotes,
            ) {
                let sharp = emission.tokens.iter().filter(|t| *t == "N!").count();
                let rising = emission.tokens.iter().filter(|t| *t == "N↑").count();
                prop_assert!(sharp + rising <= 1);
            }
        }
    }

    /// Decoding an encoded emission gives the tokens back untouched.
    #[test]
    fn encode_decode_preserves_vocabulary_tokens(
        tokens in proptest::collection::vec(
            prop_oneof![
                Just("N!".to_string()),
                Just("Stab↓".to_string()),
                Just("Over!".to_string()),
                Just("Pat→".to_string()),
            ],
            0..5
        )
    ) {
        let wire = SymbolChannel::encode(&tokens);
        prop_assert_eq!(SymbolChannel::decode(&wire), tokens);
    }
}

// ============================================================================
// Caregiver properties
// ============================================================================

proptest! {
    /// No matter what gets emitted, the query file only ever holds
    /// queryable tokens and never the same token twice.
    #[test]
    fn queries_are_queryable_and_unique(
        emissions in proptest::collection::vec(arb_emitted(), 1..20)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut c = Caregiver::new(dir.path(), "prop");
        for (tick, emitted) in emissions.into_iter().enumerate() {
            c.maybe_query(tick as u64, &emitted);
        }
        let path = dir.path().join("caregiver_queries.jsonl");
        if !path.exists() {
            return Ok(());
        }
        let lines = read_jsonl(&path).unwrap();
        let mut seen = Vec::new();
        for line in &lines {
            let token = line["token"].as_str().unwrap().to_string();
            prop_assert!(
                ["?", "N!", "N↑", "Over!"].contains(&token.as_str()),
                "queried a self-explanatory token {token}"
            );
            prop_assert!(!seen.contains(&token), "token {token} queried twice");
            seen.push(token);
        }
    }
}
