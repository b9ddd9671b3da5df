use std::sync::Arc;

use crate::config::GameConfig;
use crate::constants::{
    pursuer_id, DESTINATION_BONUS, EXTRA_LIFE_EVERY, PELLET_BONUS_EVERY, PELLET_BONUS_POINTS,
    PELLET_POINTS,
};
use crate::error::SetupError;
use crate::policy::{self, PolicyModel};
use crate::rng::Rng;
use crate::state::{Evader, Pursuer, SimulationState};
use crate::types::{
    Direction, GameOverReason, GameSummary, RuntimeEvent, Snapshot, StrategyKind, Vec2,
};
use crate::world::HexGrid;

mod autopilot;
mod pursuer_system;
mod rotation_system;
mod spawn_system;
mod utils;

use self::utils::step_target;

/// Owns the whole game and advances it one tick at a time.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,
    pub grid: HexGrid,

    seed: u32,
    rng: Rng,
    policy: Arc<dyn PolicyModel>,
    evader: Evader,
    pursuers: Vec<Pursuer>,
    destination: Vec2,
    events: Vec<RuntimeEvent>,

    tick_counter: u64,
    ticks_since_rotation: u32,
    ended: bool,
    end_reason: Option<GameOverReason>,
}

impl GameEngine {
    pub fn new(config: GameConfig, seed: u32) -> Result<Self, SetupError> {
        let policy = policy::from_kind(config.policy);
        Self::with_policy(config, seed, policy)
    }

    pub fn with_policy(
        config: GameConfig,
        seed: u32,
        policy: Arc<dyn PolicyModel>,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let mut rng = Rng::new(seed);
        let grid = HexGrid::generate(
            config.grid_size,
            config.pellet_probability,
            config.obstacle_probability,
            &mut rng,
        );
        let [home, _] = grid.spawn_tiles();
        let evader = Evader::new(home, config.initial_lives, config.invincibility_ticks);

        let mut engine = Self {
            config,
            grid,
            seed,
            rng,
            policy,
            evader,
            pursuers: Vec::new(),
            destination: home,
            events: Vec::new(),
            tick_counter: 0,
            ticks_since_rotation: 0,
            ended: false,
            end_reason: None,
        };
        engine.spawn_pursuers();
        engine.destination = engine.pick_destination()?;
        Ok(engine)
    }

    /// Hand-built game: no random generation, pursuers placed as given.
    pub fn from_parts(
        config: GameConfig,
        grid: HexGrid,
        evader_home: Vec2,
        destination: Vec2,
        pursuers: Vec<(StrategyKind, Vec2)>,
        policy: Arc<dyn PolicyModel>,
    ) -> Self {
        let move_every = config.pursuer_move_every;
        let evader = Evader::new(evader_home, config.initial_lives, config.invincibility_ticks);
        let pursuers = pursuers
            .into_iter()
            .enumerate()
            .map(|(idx, (strategy, pos))| {
                Pursuer::new(pursuer_id(idx), strategy, pos, move_every)
            })
            .collect();
        Self {
            config,
            grid,
            seed: 0,
            rng: Rng::new(0),
            policy,
            evader,
            pursuers,
            destination,
            events: Vec::new(),
            tick_counter: 0,
            ticks_since_rotation: 0,
            ended: false,
            end_reason: None,
        }
    }

    /// Rebuilds everything from `seed`, keeping config and policy model.
    pub fn reset(&mut self, seed: u32) -> Result<(), SetupError> {
        *self = Self::with_policy(self.config.clone(), seed, Arc::clone(&self.policy))?;
        Ok(())
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn evader(&self) -> &Evader {
        &self.evader
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn simulation_state(&self) -> SimulationState<'_> {
        SimulationState {
            grid: &self.grid,
            evader: &self.evader,
            pursuers: &self.pursuers,
            destination: self.destination,
            tick: self.tick_counter,
        }
    }

    /// One tick: evader input, pellet and destination checks, pursuer
    /// decisions, collisions, rotation, then invincibility bookkeeping.
    pub fn step(&mut self, input: Direction) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;

        if self.move_evader(input) && self.ended {
            return;
        }

        self.update_pursuers();
        self.resolve_collisions();
        if self.ended {
            return;
        }

        self.update_rotation();
        self.evader.invincible = self.evader.invincible.saturating_sub(1);
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            seed: self.seed,
            size: self.grid.size(),
            tiles: self.grid.rows(),
            pellets_remaining: self.grid.count_pellets(),
            evader: self.evader.view(),
            pursuers: self.pursuers.iter().map(Pursuer::view).collect(),
            destination: self.destination,
            rotations: self.grid.rotations(),
            ticks_until_rotation: self.ticks_until_rotation(),
            game_over: self.ended,
            victory: self.end_reason == Some(GameOverReason::Victory),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason,
            seed: self.seed,
            ticks: self.tick_counter,
            score: self.evader.score,
            lives: self.evader.lives,
            pellets_collected: self.evader.pellets_collected,
            bonuses_awarded: self.evader.bonuses_awarded,
            extra_lives_awarded: self.evader.extra_lives_awarded,
            rotations: self.grid.rotations(),
        }
    }

    /// Returns whether the evader moved. Pickup and the destination check run
    /// in the same call.
    fn move_evader(&mut self, input: Direction) -> bool {
        if input == Direction::None {
            return false;
        }
        let target = step_target(self.evader.pos, input);
        if !self.grid.is_open(target) {
            return false;
        }
        self.evader.pos = target;
        self.collect_pellet();
        self.check_destination();
        true
    }

    fn collect_pellet(&mut self) {
        let pos = self.evader.pos;
        if !self.grid.take_pellet(pos) {
            return;
        }
        self.evader.score += PELLET_POINTS;
        self.evader.pellets_collected += 1;
        self.events
            .push(RuntimeEvent::PelletCollected { x: pos.x, y: pos.y });

        let collected = self.evader.pellets_collected;
        if collected % PELLET_BONUS_EVERY == 0 {
            self.evader.score += PELLET_BONUS_POINTS;
            self.evader.bonuses_awarded += 1;
            self.events.push(RuntimeEvent::PelletBonus {
                pellets_collected: collected,
                points: PELLET_BONUS_POINTS,
            });
        }
        if collected % EXTRA_LIFE_EVERY == 0 {
            self.evader.lives += 1;
            self.evader.extra_lives_awarded += 1;
            self.events.push(RuntimeEvent::ExtraLife {
                lives: self.evader.lives,
            });
        }
    }

    fn check_destination(&mut self) {
        if self.evader.pos != self.destination {
            return;
        }
        self.evader.score += DESTINATION_BONUS;
        self.events.push(RuntimeEvent::DestinationReached {
            bonus: DESTINATION_BONUS,
        });
        self.finish(GameOverReason::Victory);
    }

    fn resolve_collisions(&mut self) {
        let Some(pursuer_id) = self
            .pursuers
            .iter()
            .find(|pursuer| pursuer.pos == self.evader.pos)
            .map(|pursuer| pursuer.id.clone())
        else {
            return;
        };
        if self.evader.invincible > 0 {
            return;
        }

        self.evader.lives = self.evader.lives.saturating_sub(1);
        self.events.push(RuntimeEvent::EvaderCaught {
            pursuer_id,
            lives_left: self.evader.lives,
        });
        if self.evader.lives == 0 {
            self.finish(GameOverReason::Caught);
            return;
        }
        self.respawn_evader();
    }

    fn finish(&mut self, reason: GameOverReason) {
        self.ended = true;
        self.end_reason = Some(reason);
        self.events.push(RuntimeEvent::GameOver {
            victory: reason == GameOverReason::Victory,
        });
    }
}
