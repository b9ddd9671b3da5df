use std::collections::{HashSet, VecDeque};

use super::*;
use super::utils::within_one_step;

impl GameEngine {
    /// Suggested evader input: the first move of a four-direction route to
    /// the destination. While the evader is vulnerable, first steps next to a
    /// pursuer are avoided if any other route exists.
    pub fn autopilot_direction(&self) -> Direction {
        if self.ended {
            return Direction::None;
        }
        let pursuers: Vec<Vec2> = self.pursuers.iter().map(|pursuer| pursuer.pos).collect();
        if self.evader.invincible == 0 {
            let safe = self.first_step_toward(self.destination, |pos| {
                !within_one_step(pos, pursuers.iter())
            });
            if let Some(direction) = safe {
                return direction;
            }
        }
        self.first_step_toward(self.destination, |_| true)
            .unwrap_or(Direction::None)
    }

    fn first_step_toward(&self, goal: Vec2, allow_first: impl Fn(Vec2) -> bool) -> Option<Direction> {
        let start = self.evader.pos;
        if start == goal {
            return None;
        }
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::new();

        for direction in Direction::MOVES {
            let next = step_target(start, direction);
            if !self.grid.is_open(next) || !allow_first(next) || !seen.insert(next) {
                continue;
            }
            if next == goal {
                return Some(direction);
            }
            queue.push_back((next, direction));
        }

        while let Some((pos, first)) = queue.pop_front() {
            for direction in Direction::MOVES {
                let next = step_target(pos, direction);
                if !self.grid.is_open(next) || !seen.insert(next) {
                    continue;
                }
                if next == goal {
                    return Some(first);
                }
                queue.push_back((next, first));
            }
        }
        None
    }
}
