//! Behavior planner: dominant drive → behavior → action.
//!
//! A deterministic decision table, not a search. Each drive maps to a
//! small policy: explore walks least-visited directions, settle sits
//! still unless boredom argues otherwise, probe alternates pings with
//! sweep steps. The direction cycle is seeded by `rng_seed + tick`, so
//! a run replays identically from its seed.

use std::collections::VecDeque;

use noema_core::Action;
use noema_limbic::PlannerBias;
use serde::{Deserialize, Serialize};

/// Clockwise sweep used when visit counts single nothing out.
const DIR_CYCLE: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

const RECENT_POS_CAP: usize = 8;

/// Named policy the planner committed to this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Explore,
    Settle,
    Complete,
    Probe,
    Align,
    Cooldown,
    Default,
}

impl Behavior {
    pub fn as_name(&self) -> &'static str {
        match self {
            Behavior::Explore => "explore",
            Behavior::Settle => "settle",
            Behavior::Complete => "complete",
            Behavior::Probe => "probe",
            Behavior::Align => "align",
            Behavior::Cooldown => "cooldown",
            Behavior::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub behavior: Behavior,
    pub action: Action,
}

#[derive(Default)]
pub struct Planner {
    last_action: Option<Action>,
    recent_pos: VecDeque<(i64, i64)>,
    alt: bool,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positions seen by the planner, newest last, capped at 8.
    pub fn recent_positions(&self) -> &VecDeque<(i64, i64)> {
        &self.recent_pos
    }

    /// Seeded direction sweep that avoids undoing the previous step
    /// when an alternative exists.
    fn cycle(&self, tick: u64, rng_seed: u32) -> Action {
        let base = ((rng_seed as u64 + tick) % 4) as usize;
        for i in 0..4 {
            let cand = DIR_CYCLE[(base + i) % 4];
            if self.last_action.and_then(|a| a.opposite()) == Some(cand) {
                continue;
            }
            return cand;
        }
        DIR_CYCLE[base]
    }

    /// Map the dominant drive to a behavior and a concrete action.
    ///
    /// `bias` carries the learning pressures produced on the previous
    /// tick; `least_visited` is ordered best-first.
    pub fn choose(
        &mut self,
        tick: u64,
        rng_seed: u32,
        dominant: &str,
        boredom: f64,
        bias: PlannerBias,
        least_visited: &[Action],
        pos: (i64, i64),
    ) -> Plan {
        if self.recent_pos.len() == RECENT_POS_CAP {
            self.recent_pos.pop_front();
        }
        self.recent_pos.push_back(pos);

        let (behavior, action) = match dominant {
            "curiosity" => {
                let action = match least_visited.first() {
                    Some(&first) => {
                        // anti-stick: a calm organism repeating one exit
                        // gets nudged onto the cycle
                        if boredom < 0.25 && bias.explore < 0.2 && self.last_action == Some(first)
                        {
                            self.cycle(tick, rng_seed)
                        } else {
                            first
                        }
                    }
                    None => self.cycle(tick, rng_seed),
                };
                (Behavior::Explore, action)
            }
            "stability" => {
                let mut action = Action::Noop;
                if boredom >= 0.5 {
                    if let Some(&first) = least_visited.first() {
                        action = first;
                    }
                }
                if bias.settle >= 0.7 {
                    action = Action::Noop;
                }
                (Behavior::Settle, action)
            }
            "pattern_completion" => {
                self.alt = !self.alt;
                let pref = if self.alt { Action::Left } else { Action::Right };
                let action = if self.last_action.and_then(|a| a.opposite()) == Some(pref) {
                    Action::Up
                } else {
                    pref
                };
                (Behavior::Complete, action)
            }
            "truth_seeking" => {
                let action = if self.last_action == Some(Action::Ping) {
                    self.cycle(tick, rng_seed)
                } else {
                    Action::Ping
                };
                (Behavior::Probe, action)
            }
            "caregiver_alignment" => (Behavior::Align, Action::Noop),
            "overload_regulation" => (Behavior::Cooldown, Action::Noop),
            _ => (Behavior::Default, Action::Noop),
        };

        // The planner remembers its own proposal, not whatever the
        // reflex gate actually let through.
        self.last_action = Some(action);
        Plan { behavior, action }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(
        p: &mut Planner,
        tick: u64,
        dominant: &str,
        boredom: f64,
        bias: PlannerBias,
        least: &[Action],
    ) -> Plan {
        p.choose(tick, 0, dominant, boredom, bias, least, (4, 4))
    }

    #[test]
    fn test_explore_takes_best_least_visited() {
        let mut p = Planner::new();
        let out = plan(&mut p, 0, "curiosity", 0.5, PlannerBias::default(), &[Action::Down, Action::Left]);
        assert_eq!(out.behavior, Behavior::Explore);
        assert_eq!(out.action, Action::Down);
    }

    #[test]
    fn test_explore_falls_back_to_cycle() {
        let mut p = Planner::new();
        let out = plan(&mut p, 0, "curiosity", 0.5, PlannerBias::default(), &[]);
        assert_eq!(out.action, Action::Up, "cycle base for seed 0 tick 0");
    }

    #[test]
    fn test_explore_anti_stick_cycles_away() {
        let mut p = Planner::new();
        let first = plan(&mut p, 0, "curiosity", 0.1, PlannerBias::default(), &[Action::Up]);
        assert_eq!(first.action, Action::Up);
        let second = plan(&mut p, 1, "curiosity", 0.1, PlannerBias::default(), &[Action::Up]);
        assert_eq!(
            second.action,
            Action::Right,
            "calm repeat of the same exit swaps to the cycle"
        );
    }

    #[test]
    fn test_cycle_skips_exact_backtrack() {
        let mut p = Planner::new();
        p.choose(0, 3, "curiosity", 0.5, PlannerBias::default(), &[Action::Down], (4, 4));
        let out = p.choose(1, 3, "curiosity", 0.5, PlannerBias::default(), &[], (4, 5));
        assert_eq!(out.action, Action::Right, "cycle lands on up but up undoes down");
    }

    #[test]
    fn test_settle_prefers_noop() {
        let mut p = Planner::new();
        let out = plan(&mut p, 0, "stability", 0.3, PlannerBias::default(), &[Action::Left]);
        assert_eq!(out.behavior, Behavior::Settle);
        assert_eq!(out.action, Action::Noop);
    }

    #[test]
    fn test_settle_walks_least_visited_when_bored() {
        let mut p = Planner::new();
        let out = plan(&mut p, 0, "stability", 0.5, PlannerBias::default(), &[Action::Left]);
        assert_eq!(out.action, Action::Left);
    }

    #[test]
    fn test_settle_pressure_forces_noop() {
        let mut p = Planner::new();
        let bias = PlannerBias { explore: 0.0, settle: 0.8 };
        let out = plan(&mut p, 0, "stability", 0.9, bias, &[Action::Left]);
        assert_eq!(out.action, Action::Noop, "settle pressure outranks boredom");
    }

    #[test]
    fn test_complete_sweeps_and_avoids_backtrack() {
        let mut p = Planner::new();
        let a = plan(&mut p, 0, "pattern_completion", 0.0, PlannerBias::default(), &[]);
        let b = plan(&mut p, 1, "pattern_completion", 0.0, PlannerBias::default(), &[]);
        let c = plan(&mut p, 2, "pattern_completion", 0.0, PlannerBias::default(), &[]);
        assert_eq!(a.action, Action::Left);
        assert_eq!(b.action, Action::Up, "right would undo left, sweep climbs instead");
        assert_eq!(c.action, Action::Left);
        assert_eq!(a.behavior, Behavior::Complete);
    }

    #[test]
    fn test_probe_alternates_ping_and_step() {
        let mut p = Planner::new();
        let a = plan(&mut p, 0, "truth_seeking", 0.0, PlannerBias::default(), &[]);
        let b = plan(&mut p, 1, "truth_seeking", 0.0, PlannerBias::default(), &[]);
        let c = plan(&mut p, 2, "truth_seeking", 0.0, PlannerBias::default(), &[]);
        assert_eq!(a.action, Action::Ping);
        assert_eq!(b.behavior, Behavior::Probe);
        assert!(b.action.is_move(), "a step between pings varies the view");
        assert_eq!(c.action, Action::Ping);
    }

    #[test]
    fn test_quiet_drives_map_to_noop() {
        let mut p = Planner::new();
        for (dominant, behavior) in [
            ("caregiver_alignment", Behavior::Align),
            ("overload_regulation", Behavior::Cooldown),
            ("something_else", Behavior::Default),
        ] {
            let out = plan(&mut p, 0, dominant, 0.9, PlannerBias::default(), &[Action::Up]);
            assert_eq!(out.behavior, behavior);
            assert_eq!(out.action, Action::Noop);
        }
    }

    #[test]
    fn test_recent_positions_stay_bounded() {
        let mut p = Planner::new();
        for i in 0..12 {
            p.choose(i, 0, "curiosity", 0.5, PlannerBias::default(), &[], (i as i64, 0));
        }
        assert_eq!(p.recent_positions().len(), 8);
        assert_eq!(*p.recent_positions().front().unwrap(), (4, 0), "oldest entries fall off");
    }

    #[test]
    fn test_behavior_names_serialize_lowercase() {
        let out = Plan { behavior: Behavior::Explore, action: Action::Up };
        let v = serde_json::to_value(out).unwrap();
        assert_eq!(v["behavior"], "explore");
        assert_eq!(v["action"], "up");
    }
}
