//! Bounded lookahead for the adversarial pursuer.
//!
//! Only the pursuer branches. The minimizing layer expands the same mover's
//! neighbors again, standing in for an evader whose replies are not modelled;
//! the evader enters only through [`evaluate`].

use crate::pathfinding::manhattan;
use crate::state::SimulationState;
use crate::types::Vec2;
use crate::world::HexGrid;

/// Higher is better for the pursuer.
pub fn evaluate(pos: Vec2, target: Vec2) -> i32 {
    -manhattan(pos, target)
}

pub fn minimax(grid: &HexGrid, pos: Vec2, target: Vec2, depth: u32, maximizing: bool) -> i32 {
    if depth == 0 {
        return evaluate(pos, target);
    }
    let scores = grid
        .open_neighbors(pos)
        .map(|next| minimax(grid, next, target, depth - 1, !maximizing));
    let best = if maximizing { scores.max() } else { scores.min() };
    best.unwrap_or_else(|| evaluate(pos, target))
}

/// Picks the open neighbor with the best lookahead score. The first neighbor
/// in grid order wins ties; a boxed-in pursuer stays put. A `depth` of zero
/// behaves like one.
pub fn decide_move(state: &SimulationState<'_>, current_pos: Vec2, depth: u32) -> Vec2 {
    let target = state.evader.pos;
    let mut best: Option<(i32, Vec2)> = None;
    for next in state.grid.open_neighbors(current_pos) {
        let score = minimax(state.grid, next, target, depth.saturating_sub(1), false);
        if best.map(|(top, _)| score > top).unwrap_or(true) {
            best = Some((score, next));
        }
    }
    best.map(|(_, pos)| pos).unwrap_or(current_pos)
}
