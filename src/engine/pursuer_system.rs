use super::*;
use crate::policy::Observation;
use crate::{adversarial, pathfinding};

struct Intent {
    idx: usize,
    candidate: Vec2,
    observation: Option<Observation>,
}

impl GameEngine {
    /// Every pursuer due this tick decides against the same pre-move state;
    /// moves are applied afterwards, one at a time.
    pub(super) fn update_pursuers(&mut self) {
        let tick = self.tick_counter;
        let intents: Vec<Intent> = {
            let state = self.simulation_state();
            self.pursuers
                .iter()
                .enumerate()
                .filter(|(_, pursuer)| pursuer.acts_on(tick))
                .map(|(idx, pursuer)| self.decide(&state, idx, pursuer))
                .collect()
        };

        for intent in intents {
            let pursuer = &mut self.pursuers[intent.idx];
            if intent.observation.is_some() {
                pursuer.observation = intent.observation;
            }
            if self.grid.is_open(intent.candidate) {
                pursuer.pos = intent.candidate;
            }
        }
    }

    fn decide(&self, state: &SimulationState<'_>, idx: usize, pursuer: &Pursuer) -> Intent {
        let (candidate, observation) = match pursuer.strategy {
            StrategyKind::ShortestPath => (pathfinding::decide_move(state, pursuer.pos), None),
            StrategyKind::Adversarial => (
                adversarial::decide_move(state, pursuer.pos, self.config.adversarial_depth),
                None,
            ),
            StrategyKind::Policy => {
                let (next, observation) =
                    policy::decide_move(state, pursuer.pos, self.policy.as_ref());
                (next, Some(observation))
            }
        };
        Intent {
            idx,
            candidate,
            observation,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::GameConfig;
    use crate::engine::GameEngine;
    use crate::policy::{GreedyPolicy, IdlePolicy, PolicyModel};
    use crate::types::{Direction, StrategyKind, Vec2};
    use crate::world::HexGrid;

    fn engine_with(
        rows: &[&str],
        move_every: u32,
        pursuers: Vec<(StrategyKind, Vec2)>,
        policy: Arc<dyn PolicyModel>,
    ) -> GameEngine {
        let config = GameConfig {
            rotation_interval_ticks: 0,
            pursuer_move_every: move_every,
            ..GameConfig::default()
        };
        GameEngine::from_parts(
            config,
            HexGrid::from_rows(rows).expect("square rows"),
            Vec2::new(0, 0),
            Vec2::new(0, 4),
            pursuers,
            policy,
        )
    }

    #[test]
    fn cadence_skips_off_ticks() {
        let mut engine = engine_with(
            &["     ", "     ", "     ", "     ", "     "],
            2,
            vec![(StrategyKind::ShortestPath, Vec2::new(4, 0))],
            Arc::new(IdlePolicy),
        );
        engine.step(Direction::None);
        assert_eq!(engine.pursuers()[0].pos, Vec2::new(4, 0));
        engine.step(Direction::None);
        assert_eq!(engine.pursuers()[0].pos, Vec2::new(3, 0));
    }

    #[test]
    fn policy_pursuer_caches_its_observation() {
        let mut engine = engine_with(
            &["     ", "     ", "     ", "     ", "     "],
            1,
            vec![(StrategyKind::Policy, Vec2::new(4, 0))],
            Arc::new(GreedyPolicy),
        );
        assert!(engine.pursuers()[0].observation.is_none());
        engine.step(Direction::None);
        assert_eq!(engine.pursuers()[0].pos, Vec2::new(3, 0));
        let observation = engine.pursuers()[0].observation.expect("cached observation");
        assert_eq!(&observation[..4], &[4.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn blocked_policy_move_holds_position() {
        let mut engine = engine_with(
            &["   # ", "     ", "     ", "     ", "     "],
            1,
            vec![(StrategyKind::Policy, Vec2::new(4, 0))],
            Arc::new(GreedyPolicy),
        );
        engine.step(Direction::None);
        assert_eq!(engine.pursuers()[0].pos, Vec2::new(4, 0));
    }

    #[test]
    fn all_strategies_stay_on_open_tiles() {
        let grid_rows = [
            "       ", " # # # ", "       ", " ## ## ", "       ", " # # # ", "       ",
        ];
        let mut engine = engine_with(
            &grid_rows,
            1,
            vec![
                (StrategyKind::ShortestPath, Vec2::new(6, 6)),
                (StrategyKind::Adversarial, Vec2::new(6, 0)),
                (StrategyKind::Policy, Vec2::new(0, 6)),
            ],
            Arc::new(GreedyPolicy),
        );
        for _ in 0..12 {
            engine.step(Direction::None);
            for pursuer in engine.pursuers() {
                assert!(engine.grid.is_open(pursuer.pos), "{pursuer:?}");
            }
            if engine.is_ended() {
                break;
            }
        }
    }
}
