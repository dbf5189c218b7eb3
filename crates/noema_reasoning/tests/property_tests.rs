//! Property-based tests for planning and the reflex gate.
//!
//! Uses proptest to verify invariants that must hold for ALL possible inputs,
//! not just hand-picked examples. This catches edge cases that unit tests miss.

use proptest::prelude::*;

use noema_core::config::ReflexConfig;
use noema_core::{Action, NullNotes};
use noema_limbic::PlannerBias;
use noema_reasoning::{Planner, ReflexGate};

// ============================================================================
// Strategies
// ============================================================================

fn arb_unit() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

fn arb_move() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Up),
        Just(Action::Down),
        Just(Action::Left),
        Just(Action::Right),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![arb_move(), Just(Action::Ping), Just(Action::Noop)]
}

fn arb_dominant() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("curiosity".to_string()),
        Just("stability".to_string()),
        Just("pattern_completion".to_string()),
        Just("truth_seeking".to_string()),
        Just("caregiver_alignment".to_string()),
        Just("overload_regulation".to_string()),
        Just("unmapped".to_string()),
    ]
}

fn arb_bias() -> impl Strategy<Value = PlannerBias> {
    (arb_unit(), arb_unit()).prop_map(|(explore, settle)| PlannerBias { explore, settle })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Exploration always moves: either a least-visited direction or a
    /// cycle step, never ping or noop.
    #[test]
    fn explore_always_moves(
        tick in 0u64..100,
        seed in any::<u32>(),
        boredom in arb_unit(),
        bias in arb_bias(),
        least in proptest::collection::vec(arb_move(), 0..4),
    ) {
        let mut p = Planner::new();
        let out = p.choose(tick, seed, "curiosity", boredom, bias, &least, (0, 0));
        prop_assert!(out.action.is_move(), "explore produced {:?}", out.action);
    }

    /// A calm organism under stability never walks.
    #[test]
    fn settle_stays_put_below_boredom_threshold(
        tick in 0u64..100,
        seed in any::<u32>(),
        boredom in 0.0f64..0.5,
        bias in arb_bias(),
        least in proptest::collection::vec(arb_move(), 0..4),
    ) {
        let mut p = Planner::new();
        let out = p.choose(tick, seed, "stability", boredom, bias, &least, (0, 0));
        prop_assert_eq!(out.action, Action::Noop);
    }

    /// Whatever the drive, the planner keeps its position history at
    /// eight entries or fewer.
    #[test]
    fn recent_positions_never_exceed_cap(
        dominants in proptest::collection::vec(arb_dominant(), 1..30),
    ) {
        let mut p = Planner::new();
        for (i, dominant) in dominants.iter().enumerate() {
            p.choose(i as u64, 1, dominant, 0.5, PlannerBias::default(), &[], (i as i64, 0));
        }
        prop_assert!(p.recent_positions().len() <= 8);
    }

    /// The reflex gate never invents an action: it passes the proposal
    /// or substitutes noop.
    #[test]
    fn reflex_output_is_proposal_or_noop(
        tick in 0u64..50,
        proposed in arb_action(),
        unique in 0usize..10,
        boredom in arb_unit(),
    ) {
        let mut g = ReflexGate::new(&ReflexConfig::default());
        let out = g.advise(tick, proposed, unique, boredom, &mut NullNotes);
        prop_assert!(out.action == proposed || out.action == Action::Noop);
        for t in &out.triggers {
            prop_assert!(t == "overload" || t == "relaxed", "unknown trigger {t}");
        }
        if out.triggers.iter().any(|t| t == "relaxed") {
            prop_assert!(out.triggers.iter().any(|t| t == "overload"));
        }
    }

    /// Streak relaxation caps consecutive vetoes: the gate can say
    /// noop at most twice in a row before letting an action through.
    #[test]
    fn consecutive_vetoes_stay_bounded(
        scenes in proptest::collection::vec((0usize..8, arb_unit()), 1..40),
    ) {
        let mut g = ReflexGate::new(&ReflexConfig::default());
        let mut run = 0u32;
        let mut longest = 0u32;
        for (tick, (unique, boredom)) in scenes.iter().enumerate() {
            let out = g.advise(tick as u64, Action::Up, *unique, *boredom, &mut NullNotes);
            if out.action == Action::Noop {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        prop_assert!(longest <= 2, "saw {longest} consecutive vetoes");
    }
}
