use super::*;
use crate::config::DestinationPolicy;

impl GameEngine {
    pub(super) fn update_rotation(&mut self) {
        let interval = self.config.rotation_interval_ticks;
        if interval == 0 {
            return;
        }
        self.ticks_since_rotation += 1;
        if self.ticks_since_rotation < interval {
            return;
        }
        self.ticks_since_rotation = 0;
        self.rotate_maze();
    }

    /// `None` when rotation is disabled.
    pub(super) fn ticks_until_rotation(&self) -> Option<u32> {
        let interval = self.config.rotation_interval_ticks;
        (interval > 0).then(|| interval.saturating_sub(self.ticks_since_rotation))
    }

    fn rotate_maze(&mut self) {
        let previous = self.destination;
        let carried = match self.config.destination_policy {
            DestinationPolicy::Keep => Some(previous),
            DestinationPolicy::Remap => Some(self.grid.rotate_coord(previous)),
            DestinationPolicy::Reroll => None,
        };

        self.grid.rotate();
        self.events.push(RuntimeEvent::MazeRotated {
            rotations: self.grid.rotations(),
        });
        self.displace_agents();

        self.destination = match carried {
            Some(pos) if self.destination_still_valid(pos) => pos,
            _ => self.pick_destination().unwrap_or(previous),
        };
        if self.destination != previous {
            self.events.push(RuntimeEvent::DestinationMoved {
                x: self.destination.x,
                y: self.destination.y,
            });
        }
    }
}
