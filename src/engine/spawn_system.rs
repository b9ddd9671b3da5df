use super::*;
use crate::constants::PURSUER_SPAWN_MIN_DISTANCE;
use crate::error::GridError;
use crate::pathfinding::manhattan;

impl GameEngine {
    /// The first pursuer starts on the far spawn tile; the rest are scattered
    /// away from the evader when the grid allows it.
    pub(super) fn spawn_pursuers(&mut self) {
        let [_, lair] = self.grid.spawn_tiles();
        let evader = self.evader.pos;
        let move_every = self.config.pursuer_move_every;
        let strategies = self.config.pursuers.clone();

        self.pursuers = Vec::with_capacity(strategies.len());
        for (idx, strategy) in strategies.into_iter().enumerate() {
            let pos = if idx == 0 {
                lair
            } else {
                self.pick_pursuer_tile(evader, lair)
            };
            self.pursuers
                .push(Pursuer::new(pursuer_id(idx), strategy, pos, move_every));
        }
    }

    fn pick_pursuer_tile(&mut self, evader: Vec2, fallback: Vec2) -> Vec2 {
        self.grid
            .random_open_tile_where(&mut self.rng, |pos| {
                manhattan(pos, evader) >= PURSUER_SPAWN_MIN_DISTANCE
            })
            .or_else(|_| self.grid.random_open_tile(&mut self.rng))
            .unwrap_or(fallback)
    }

    /// Random open tile that is neither the evader's tile nor its home,
    /// avoiding pursuers when possible.
    pub(super) fn pick_destination(&mut self) -> Result<Vec2, GridError> {
        let evader = self.evader.pos;
        let home = self.evader.home;
        let occupied: Vec<Vec2> = self.pursuers.iter().map(|pursuer| pursuer.pos).collect();
        self.grid
            .random_open_tile_where(&mut self.rng, |pos| {
                pos != evader && pos != home && !occupied.contains(&pos)
            })
            .or_else(|_| {
                self.grid
                    .random_open_tile_where(&mut self.rng, |pos| pos != evader && pos != home)
            })
            .or_else(|_| {
                self.grid
                    .random_open_tile_where(&mut self.rng, |pos| pos != evader)
            })
    }

    /// Whether a carried-over destination can stay where it is.
    pub(super) fn destination_still_valid(&self, pos: Vec2) -> bool {
        self.grid.is_open(pos) && pos != self.evader.pos && pos != self.evader.home
    }

    pub(super) fn respawn_evader(&mut self) {
        let home = self.evader.home;
        self.evader.pos = self.grid.nearest_open(home).unwrap_or(home);
        self.evader.invincible = self.config.invincibility_ticks;

        if self.evader.pos == self.destination {
            let previous = self.destination;
            self.destination = self.pick_destination().unwrap_or(previous);
            if self.destination != previous {
                self.events.push(RuntimeEvent::DestinationMoved {
                    x: self.destination.x,
                    y: self.destination.y,
                });
            }
        }
    }

    /// Moves anyone left standing on an obstacle to the closest open tile.
    pub(super) fn displace_agents(&mut self) {
        if let Some(pos) = self.grid.nearest_open(self.evader.pos) {
            self.evader.pos = pos;
        }
        for pursuer in &mut self.pursuers {
            if let Some(pos) = self.grid.nearest_open(pursuer.pos) {
                pursuer.pos = pos;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GameConfig;
    use crate::constants::PURSUER_SPAWN_MIN_DISTANCE;
    use crate::engine::GameEngine;
    use crate::pathfinding::manhattan;
    use crate::policy::IdlePolicy;
    use crate::rng::Rng;
    use crate::types::{Direction, StrategyKind, Vec2};
    use crate::world::HexGrid;
    use std::sync::Arc;

    #[test]
    fn first_pursuer_starts_on_far_spawn_tile() {
        let engine = GameEngine::new(GameConfig::default(), 17).expect("valid setup");
        let [home, lair] = engine.grid.spawn_tiles();
        assert_eq!(engine.evader().pos, home);
        assert_eq!(engine.pursuers()[0].pos, lair);
        assert_eq!(engine.pursuers()[0].id, "pursuer_1");
        assert_eq!(engine.pursuers()[2].strategy, StrategyKind::Policy);
    }

    #[test]
    fn other_pursuers_keep_their_distance_on_roomy_grids() {
        let config = GameConfig {
            obstacle_probability: 0.0,
            ..GameConfig::default()
        };
        for seed in 0..20u32 {
            let engine = GameEngine::new(config.clone(), seed).expect("valid setup");
            for pursuer in &engine.pursuers()[1..] {
                assert!(manhattan(pursuer.pos, engine.evader().pos) >= PURSUER_SPAWN_MIN_DISTANCE);
            }
        }
    }

    #[test]
    fn respawn_returns_home_with_invincibility() {
        let mut engine = GameEngine::new(GameConfig::default(), 3).expect("valid setup");
        let [_, lair] = engine.grid.spawn_tiles();
        engine.evader.pos = lair;
        engine.evader.invincible = 0;
        engine.respawn_evader();
        assert_eq!(engine.evader().pos, engine.evader().home);
        assert_eq!(engine.evader().invincible, engine.config.invincibility_ticks);
    }

    #[test]
    fn destination_never_lands_on_evader_home() {
        let rows = ["   ", "   ", "   "];
        for seed in 0..30u32 {
            let mut engine = GameEngine::from_parts(
                GameConfig::default(),
                HexGrid::from_rows(&rows).expect("square rows"),
                Vec2::new(1, 1),
                Vec2::new(2, 2),
                vec![],
                Arc::new(IdlePolicy),
            );
            engine.rng = Rng::new(seed);
            engine.evader.pos = Vec2::new(0, 0);
            let picked = engine.pick_destination().expect("open tiles left");
            assert_ne!(picked, Vec2::new(1, 1));
            assert_ne!(picked, Vec2::new(0, 0));
        }
    }

    #[test]
    fn respawn_avoids_a_blocked_home() {
        let rows = ["#   ", "    ", "    ", "    "];
        let mut engine = GameEngine::from_parts(
            GameConfig::default(),
            HexGrid::from_rows(&rows).expect("square rows"),
            Vec2::new(0, 0),
            Vec2::new(3, 3),
            vec![(StrategyKind::Policy, Vec2::new(2, 0))],
            Arc::new(IdlePolicy),
        );
        engine.evader.pos = Vec2::new(1, 0);
        engine.evader.invincible = 0;
        engine.step(Direction::Right);
        assert_eq!(engine.evader().lives, engine.config.initial_lives - 1);
        assert!(engine.grid.is_open(engine.evader().pos));
        assert_ne!(engine.evader().pos, engine.destination());
    }
}
