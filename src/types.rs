use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Single-step intents shared by the evader input surface and policy models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Fixed enumeration order used by policy models.
    pub const MOVES: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ShortestPath,
    Adversarial,
    Policy,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shortest_path" | "astar" => Some(Self::ShortestPath),
            "adversarial" | "minimax" => Some(Self::Adversarial),
            "policy" => Some(Self::Policy),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    Caught,
}

#[derive(Clone, Debug, Serialize)]
pub struct EvaderView {
    pub x: i32,
    pub y: i32,
    pub home: Vec2,
    pub score: i32,
    pub lives: u32,
    pub invincible: u32,
    #[serde(rename = "pelletsCollected")]
    pub pellets_collected: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub strategy: StrategyKind,
    #[serde(rename = "moveEvery")]
    pub move_every: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletCollected {
        x: i32,
        y: i32,
    },
    PelletBonus {
        #[serde(rename = "pelletsCollected")]
        pellets_collected: u32,
        points: i32,
    },
    ExtraLife {
        lives: u32,
    },
    EvaderCaught {
        #[serde(rename = "pursuerId")]
        pursuer_id: String,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    MazeRotated {
        rotations: u32,
    },
    DestinationMoved {
        x: i32,
        y: i32,
    },
    DestinationReached {
        bonus: i32,
    },
    GameOver {
        victory: bool,
    },
}

/// Everything a presentation layer needs to draw one tick.
///
/// `tiles` holds one string per row (`y`), one char per column (`x`):
/// `#` obstacle, `.` pellet, space for an empty open tile.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub seed: u32,
    pub size: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: u32,
    pub evader: EvaderView,
    pub pursuers: Vec<PursuerView>,
    pub destination: Vec2,
    pub rotations: u32,
    #[serde(rename = "ticksUntilRotation")]
    pub ticks_until_rotation: Option<u32>,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    pub victory: bool,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    pub seed: u32,
    pub ticks: u64,
    pub score: i32,
    pub lives: u32,
    #[serde(rename = "pelletsCollected")]
    pub pellets_collected: u32,
    #[serde(rename = "bonusesAwarded")]
    pub bonuses_awarded: u32,
    #[serde(rename = "extraLivesAwarded")]
    pub extra_lives_awarded: u32,
    pub rotations: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_move_accepts_known_directions_only() {
        assert_eq!(Direction::parse_move("up"), Some(Direction::Up));
        assert_eq!(Direction::parse_move("none"), Some(Direction::None));
        assert_eq!(Direction::parse_move("north"), None);
    }

    #[test]
    fn strategy_names_and_aliases_parse() {
        assert_eq!(StrategyKind::parse("astar"), Some(StrategyKind::ShortestPath));
        assert_eq!(StrategyKind::parse("minimax"), Some(StrategyKind::Adversarial));
        assert_eq!(StrategyKind::parse("policy"), Some(StrategyKind::Policy));
        assert_eq!(StrategyKind::parse("random"), None);
    }

    #[test]
    fn runtime_events_serialize_with_type_tag() {
        let value = serde_json::to_value(RuntimeEvent::EvaderCaught {
            pursuer_id: "pursuer_1".to_string(),
            lives_left: 2,
        })
        .expect("event should serialize");
        assert_eq!(value["type"], "evader_caught");
        assert_eq!(value["pursuerId"], "pursuer_1");
        assert_eq!(value["livesLeft"], 2);
    }
}
