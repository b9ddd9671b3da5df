use crate::types::{Direction, Vec2};
use crate::world::hex_distance;

pub(super) fn step_target(pos: Vec2, dir: Direction) -> Vec2 {
    let (dx, dy) = dir.delta();
    pos.offset(dx, dy)
}

/// True when `pos` is on or next to any of `others` in hex steps.
pub(super) fn within_one_step<'a>(pos: Vec2, mut others: impl Iterator<Item = &'a Vec2>) -> bool {
    others.any(|other| hex_distance(pos, *other) <= 1)
}
