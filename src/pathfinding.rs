use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::state::SimulationState;
use crate::types::Vec2;
use crate::world::HexGrid;

/// Manhattan distance on raw coordinates. It overestimates the two hex
/// diagonals, so routes are shortest in the common case but not guaranteed
/// optimal around obstacles.
pub fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Best-first search from `start` to `goal` with unit edge costs.
///
/// The returned route excludes `start` and ends at `goal`; it is empty when
/// `goal` cannot be reached or equals `start`. Obstacles are never enqueued.
/// Equal priorities pop in insertion order.
pub fn find_path(start: Vec2, goal: Vec2, grid: &HexGrid) -> Vec<Vec2> {
    if start == goal || !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return Vec::new();
    }

    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<Vec2, Vec2> = HashMap::new();
    let mut cost_so_far: HashMap<Vec2, i32> = HashMap::new();
    let mut sequence = 0u64;

    frontier.push(Reverse((manhattan(start, goal), sequence, start)));
    cost_so_far.insert(start, 0);

    while let Some(Reverse((_, _, current))) = frontier.pop() {
        if current == goal {
            break;
        }
        let current_cost = cost_so_far.get(&current).copied().unwrap_or(0);
        for next in grid.open_neighbors(current) {
            let new_cost = current_cost + 1;
            let improved = cost_so_far
                .get(&next)
                .map(|known| new_cost < *known)
                .unwrap_or(true);
            if !improved {
                continue;
            }
            cost_so_far.insert(next, new_cost);
            came_from.insert(next, current);
            sequence += 1;
            frontier.push(Reverse((new_cost + manhattan(next, goal), sequence, next)));
        }
    }

    if !came_from.contains_key(&goal) {
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(prev) => current = *prev,
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// Shortest-path pursuer: first step of the route to the evader, or stay.
pub fn decide_move(state: &SimulationState<'_>, current_pos: Vec2) -> Vec2 {
    find_path(current_pos, state.evader.pos, state.grid)
        .first()
        .copied()
        .unwrap_or(current_pos)
}
