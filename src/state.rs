use crate::policy::Observation;
use crate::types::{EvaderView, PursuerView, StrategyKind, Vec2};
use crate::world::HexGrid;

#[derive(Clone, Debug)]
pub struct Evader {
    pub pos: Vec2,
    pub home: Vec2,
    pub score: i32,
    pub lives: u32,
    /// Ticks left during which collisions are ignored.
    pub invincible: u32,
    pub pellets_collected: u32,
    pub bonuses_awarded: u32,
    pub extra_lives_awarded: u32,
}

impl Evader {
    pub fn new(home: Vec2, lives: u32, invincible: u32) -> Self {
        Self {
            pos: home,
            home,
            score: 0,
            lives,
            invincible,
            pellets_collected: 0,
            bonuses_awarded: 0,
            extra_lives_awarded: 0,
        }
    }

    pub fn view(&self) -> EvaderView {
        EvaderView {
            x: self.pos.x,
            y: self.pos.y,
            home: self.home,
            score: self.score,
            lives: self.lives,
            invincible: self.invincible,
            pellets_collected: self.pellets_collected,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: String,
    pub strategy: StrategyKind,
    pub pos: Vec2,
    /// Acts on ticks divisible by this value.
    pub move_every: u32,
    /// Last state vector handed to the policy model.
    pub observation: Option<Observation>,
}

impl Pursuer {
    pub fn new(id: String, strategy: StrategyKind, pos: Vec2, move_every: u32) -> Self {
        Self {
            id,
            strategy,
            pos,
            move_every: move_every.max(1),
            observation: None,
        }
    }

    pub fn acts_on(&self, tick: u64) -> bool {
        tick % u64::from(self.move_every) == 0
    }

    pub fn view(&self) -> PursuerView {
        PursuerView {
            id: self.id.clone(),
            x: self.pos.x,
            y: self.pos.y,
            strategy: self.strategy,
            move_every: self.move_every,
        }
    }
}

/// Read-only view of one tick handed to pursuer strategies.
#[derive(Clone, Copy, Debug)]
pub struct SimulationState<'a> {
    pub grid: &'a HexGrid,
    pub evader: &'a Evader,
    pub pursuers: &'a [Pursuer],
    pub destination: Vec2,
    pub tick: u64,
}

impl SimulationState<'_> {
    pub fn pellets_remaining(&self) -> u32 {
        self.grid.count_pellets()
    }
}
