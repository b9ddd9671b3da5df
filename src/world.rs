use std::collections::{HashSet, VecDeque};

use crate::constants::RANDOM_TILE_ATTEMPTS_PER_TILE;
use crate::error::GridError;
use crate::rng::Rng;
use crate::types::Vec2;

/// Hex adjacency offsets in the order every search iterates them.
pub const HEX_DIRECTIONS: [(i32, i32); 6] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, 1), (1, -1)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub pos: Vec2,
    pub pellet: bool,
    pub obstacle: bool,
    neighbors: Vec<Vec2>,
}

impl Tile {
    fn new(pos: Vec2, pellet: bool, obstacle: bool) -> Self {
        Self {
            pos,
            pellet,
            obstacle,
            neighbors: Vec::new(),
        }
    }

    pub fn neighbors(&self) -> &[Vec2] {
        &self.neighbors
    }
}

/// Square tile matrix with hexagonal adjacency. Tiles live in a flat
/// row-major vector and refer to neighbors by coordinate only, so a rotation
/// rebuilds the vector without leaving anything dangling.
#[derive(Clone, Debug)]
pub struct HexGrid {
    size: i32,
    tiles: Vec<Tile>,
    rotations: u32,
}

impl HexGrid {
    /// Seeded construction: independent pellet and obstacle rolls per tile,
    /// then both spawn tiles are cleared.
    pub fn build(size: i32, pellet_probability: f64, obstacle_probability: f64, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        Self::generate(size, pellet_probability, obstacle_probability, &mut rng)
    }

    pub fn generate(
        size: i32,
        pellet_probability: f64,
        obstacle_probability: f64,
        rng: &mut Rng,
    ) -> Self {
        let size = size.max(1);
        let mut tiles = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let pellet = rng.chance(pellet_probability);
                let obstacle = rng.chance(obstacle_probability);
                tiles.push(Tile::new(Vec2::new(x, y), pellet, obstacle));
            }
        }
        let mut grid = Self {
            size,
            tiles,
            rotations: 0,
        };
        grid.clear_spawn_tiles();
        grid.rebuild_adjacency();
        grid
    }

    /// Obstacle-free grid without pellets.
    pub fn open(size: i32) -> Self {
        Self::generate(size, 0.0, 0.0, &mut Rng::new(0))
    }

    /// Hand-built square grid: `#` obstacle, `.` pellet, anything else an
    /// empty open tile. Row index is `y`, column index is `x`. Spawn tiles
    /// are taken as written.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let size = rows.len();
        if size == 0 || rows.iter().any(|row| row.chars().count() != size) {
            return None;
        }
        let mut tiles = Vec::with_capacity(size * size);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                tiles.push(Tile::new(Vec2::new(x as i32, y as i32), c == '.', c == '#'));
            }
        }
        let mut grid = Self {
            size: size as i32,
            tiles,
            rotations: 0,
        };
        grid.rebuild_adjacency();
        Some(grid)
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn rotations(&self) -> u32 {
        self.rotations
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The two tiles that always stay obstacle-free: evader home first,
    /// pursuer spawn second.
    pub fn spawn_tiles(&self) -> [Vec2; 2] {
        [
            Vec2::new(1.min(self.size - 1), 1.min(self.size - 1)),
            Vec2::new((self.size - 2).max(0), (self.size - 2).max(0)),
        ]
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.size && pos.y < self.size
    }

    pub fn tile(&self, pos: Vec2) -> Option<&Tile> {
        self.index_of(pos).map(|idx| &self.tiles[idx])
    }

    fn tile_mut(&mut self, pos: Vec2) -> Option<&mut Tile> {
        let idx = self.index_of(pos)?;
        Some(&mut self.tiles[idx])
    }

    /// In bounds and not an obstacle.
    pub fn is_open(&self, pos: Vec2) -> bool {
        self.tile(pos).map(|tile| !tile.obstacle).unwrap_or(false)
    }

    pub fn has_pellet(&self, pos: Vec2) -> bool {
        self.tile(pos).map(|tile| tile.pellet).unwrap_or(false)
    }

    /// Clears the pellet at `pos`, reporting whether one was there.
    pub fn take_pellet(&mut self, pos: Vec2) -> bool {
        match self.tile_mut(pos) {
            Some(tile) if tile.pellet => {
                tile.pellet = false;
                true
            }
            _ => false,
        }
    }

    pub fn set_obstacle(&mut self, pos: Vec2, obstacle: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.obstacle = obstacle;
        }
    }

    /// In-bounds neighbors in [`HEX_DIRECTIONS`] order, obstacles included.
    pub fn neighbors(&self, pos: Vec2) -> &[Vec2] {
        self.tile(pos).map(|tile| tile.neighbors()).unwrap_or(&[])
    }

    pub fn open_neighbors(&self, pos: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        self.neighbors(pos)
            .iter()
            .copied()
            .filter(move |next| self.is_open(*next))
    }

    pub fn count_pellets(&self) -> u32 {
        self.tiles.iter().filter(|tile| tile.pellet).count() as u32
    }

    /// Where a tile at `pos` lands after one [`HexGrid::rotate`].
    pub fn rotate_coord(&self, pos: Vec2) -> Vec2 {
        Vec2::new(self.size - 1 - pos.y, pos.x)
    }

    /// Quarter turn of the tile matrix. Tile contents move with their tile,
    /// adjacency is rebuilt from scratch and the spawn tiles are cleared
    /// again.
    pub fn rotate(&mut self) {
        let size = self.size;
        let mut rotated: Vec<Option<Tile>> = vec![None; self.tiles.len()];
        for tile in self.tiles.drain(..) {
            let target = Vec2::new(size - 1 - tile.pos.y, tile.pos.x);
            let idx = (target.y * size + target.x) as usize;
            rotated[idx] = Some(Tile::new(target, tile.pellet, tile.obstacle));
        }
        self.tiles = rotated.into_iter().flatten().collect();
        self.rotations = self.rotations.saturating_add(1);
        self.clear_spawn_tiles();
        self.rebuild_adjacency();
    }

    /// Uniform rejection sampling with a bounded number of draws, then a
    /// row-major scan from a random start.
    pub fn random_open_tile(&self, rng: &mut Rng) -> Result<Vec2, GridError> {
        self.random_open_tile_where(rng, |_| true)
    }

    pub fn random_open_tile_where(
        &self,
        rng: &mut Rng,
        accept: impl Fn(Vec2) -> bool,
    ) -> Result<Vec2, GridError> {
        let count = self.tiles.len();
        for _ in 0..count.saturating_mul(RANDOM_TILE_ATTEMPTS_PER_TILE) {
            let tile = &self.tiles[rng.below(count)];
            if !tile.obstacle && accept(tile.pos) {
                return Ok(tile.pos);
            }
        }

        let start = rng.below(count);
        (0..count)
            .map(|step| &self.tiles[(start + step) % count])
            .find(|tile| !tile.obstacle && accept(tile.pos))
            .map(|tile| tile.pos)
            .ok_or(GridError::FullyObstructed { size: self.size })
    }

    /// Closest open tile by hex steps, `pos` itself included. Ties go to the
    /// tile reached first in neighbor order.
    pub fn nearest_open(&self, pos: Vec2) -> Option<Vec2> {
        if !self.in_bounds(pos) {
            return None;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(pos);
        queue.push_back(pos);

        while let Some(current) = queue.pop_front() {
            if self.is_open(current) {
                return Some(current);
            }
            for &next in self.neighbors(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        None
    }

    pub fn rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.size as usize)
            .map(|row| {
                row.iter()
                    .map(|tile| {
                        if tile.obstacle {
                            '#'
                        } else if tile.pellet {
                            '.'
                        } else {
                            ' '
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn index_of(&self, pos: Vec2) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some((pos.y * self.size + pos.x) as usize)
    }

    fn clear_spawn_tiles(&mut self) {
        for spawn in self.spawn_tiles() {
            self.set_obstacle(spawn, false);
        }
    }

    fn rebuild_adjacency(&mut self) {
        let size = self.size;
        for tile in &mut self.tiles {
            tile.neighbors = HEX_DIRECTIONS
                .iter()
                .map(|&(dx, dy)| tile.pos.offset(dx, dy))
                .filter(|next| next.x >= 0 && next.y >= 0 && next.x < size && next.y < size)
                .collect();
        }
    }
}

/// Steps between two tiles on an unobstructed hex grid.
pub fn hex_distance(a: Vec2, b: Vec2) -> i32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx.abs() + dy.abs() + (dx + dy).abs()) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_symmetric(grid: &HexGrid) {
        for tile in grid.tiles() {
            for &next in tile.neighbors() {
                assert!(
                    grid.neighbors(next).contains(&tile.pos),
                    "{:?} lists {:?} but not the reverse",
                    tile.pos,
                    next
                );
            }
        }
    }

    #[test]
    fn adjacency_is_symmetric_after_build_and_rotation() {
        for seed in 0..20u32 {
            let mut grid = HexGrid::build(9, 0.7, 0.15, seed);
            assert_symmetric(&grid);
            for _ in 0..4 {
                grid.rotate();
                assert_symmetric(&grid);
            }
        }
    }

    #[test]
    fn spawn_tiles_are_open_after_build_and_rotation() {
        for seed in 0..200u32 {
            let mut grid = HexGrid::build(8, 0.5, 0.95, seed);
            for spawn in grid.spawn_tiles() {
                assert!(grid.is_open(spawn), "seed={seed} spawn={spawn:?}");
            }
            grid.rotate();
            for spawn in grid.spawn_tiles() {
                assert!(grid.is_open(spawn), "seed={seed} spawn={spawn:?} after rotate");
            }
        }
    }

    #[test]
    fn neighbors_follow_fixed_direction_order() {
        let grid = HexGrid::open(5);
        assert_eq!(
            grid.neighbors(Vec2::new(2, 2)),
            &[
                Vec2::new(1, 2),
                Vec2::new(3, 2),
                Vec2::new(2, 1),
                Vec2::new(2, 3),
                Vec2::new(1, 3),
                Vec2::new(3, 1),
            ]
        );
        assert_eq!(
            grid.neighbors(Vec2::new(0, 0)),
            &[Vec2::new(1, 0), Vec2::new(0, 1)]
        );
        assert!(grid.neighbors(Vec2::new(-1, 0)).is_empty());
    }

    #[test]
    fn rotation_keeps_shape_and_bounds() {
        let mut grid = HexGrid::build(7, 0.7, 0.2, 5);
        grid.rotate();
        assert_eq!(grid.tiles().len(), 49);
        for (idx, tile) in grid.tiles().iter().enumerate() {
            assert_eq!(idx as i32, tile.pos.y * 7 + tile.pos.x);
            assert!(tile.neighbors().len() <= 6);
            assert!(tile.neighbors().iter().all(|next| grid.in_bounds(*next)));
        }
        assert_eq!(grid.rotations(), 1);
    }

    #[test]
    fn rotation_moves_tile_contents_with_the_mapping() {
        let mut grid = HexGrid::from_rows(&["#. ", "   ", "  ."]).expect("square rows");
        let blocked = Vec2::new(0, 0);
        let pellet = Vec2::new(1, 0);
        let moved_blocked = grid.rotate_coord(blocked);
        let moved_pellet = grid.rotate_coord(pellet);
        assert_eq!(moved_blocked, Vec2::new(2, 0));
        assert_eq!(moved_pellet, Vec2::new(2, 1));

        grid.rotate();
        assert!(!grid.is_open(moved_blocked));
        assert!(grid.has_pellet(moved_pellet));
        assert_eq!(grid.count_pellets(), 2);
    }

    #[test]
    fn full_turn_restores_layout_once_spawn_orbit_is_cleared() {
        let mut grid = HexGrid::build(6, 0.5, 0.3, 11);
        // Both spawn tiles share one rotation orbit; two turns clear all of it.
        grid.rotate();
        grid.rotate();
        let settled = grid.rows();
        for _ in 0..4 {
            grid.rotate();
        }
        assert_eq!(grid.rows(), settled);
    }

    #[test]
    fn count_pellets_and_take_pellet_agree() {
        let mut grid = HexGrid::from_rows(&["..", ".#"]).expect("square rows");
        assert_eq!(grid.count_pellets(), 3);
        assert!(grid.take_pellet(Vec2::new(0, 0)));
        assert!(!grid.take_pellet(Vec2::new(0, 0)));
        assert!(!grid.take_pellet(Vec2::new(5, 5)));
        assert_eq!(grid.count_pellets(), 2);
    }

    #[test]
    fn random_open_tile_finds_the_only_open_tile() {
        let grid = HexGrid::from_rows(&["###", "## ", "###"]).expect("square rows");
        let mut rng = Rng::new(1);
        for _ in 0..10 {
            assert_eq!(grid.random_open_tile(&mut rng), Ok(Vec2::new(2, 1)));
        }
    }

    #[test]
    fn random_open_tile_fails_on_fully_obstructed_grid() {
        let grid = HexGrid::from_rows(&["##", "##"]).expect("square rows");
        let mut rng = Rng::new(1);
        assert_eq!(
            grid.random_open_tile(&mut rng),
            Err(GridError::FullyObstructed { size: 2 })
        );
    }

    #[test]
    fn nearest_open_walks_out_of_obstacles() {
        let grid = HexGrid::from_rows(&["###", "###", "## "]).expect("square rows");
        assert_eq!(grid.nearest_open(Vec2::new(0, 0)), Some(Vec2::new(2, 2)));
        assert_eq!(grid.nearest_open(Vec2::new(2, 2)), Some(Vec2::new(2, 2)));
        assert_eq!(grid.nearest_open(Vec2::new(9, 9)), None);
    }

    #[test]
    fn hex_distance_uses_diagonal_shortcuts() {
        assert_eq!(hex_distance(Vec2::new(0, 0), Vec2::new(2, 2)), 4);
        assert_eq!(hex_distance(Vec2::new(0, 2), Vec2::new(2, 0)), 2);
        assert_eq!(hex_distance(Vec2::new(3, 3), Vec2::new(3, 3)), 0);
    }

    #[test]
    fn rows_render_obstacles_and_pellets() {
        let grid = HexGrid::from_rows(&["#.", " ."]).expect("square rows");
        assert_eq!(grid.rows(), vec!["#.".to_string(), " .".to_string()]);
        assert!(HexGrid::from_rows(&["#.", "."]).is_none());
    }
}
