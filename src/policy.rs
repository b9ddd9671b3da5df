use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PolicyKind;
use crate::constants::{OBSERVATION_LEN, OBSERVATION_TICK_PERIOD};
use crate::error::PolicyLoadError;
use crate::state::SimulationState;
use crate::types::{Direction, Vec2};

/// `[pursuer_x, pursuer_y, evader_x, evader_y, tick % 10, pellets_remaining]`
pub type Observation = [f32; OBSERVATION_LEN];

/// Maps an observation to a move. `None` means stay in place.
pub trait PolicyModel: Debug + Send + Sync {
    fn name(&self) -> &str;
    fn infer(&self, observation: &Observation) -> Option<Direction>;
}

pub fn encode_observation(state: &SimulationState<'_>, current_pos: Vec2) -> Observation {
    [
        current_pos.x as f32,
        current_pos.y as f32,
        state.evader.pos.x as f32,
        state.evader.pos.y as f32,
        (state.tick % OBSERVATION_TICK_PERIOD) as f32,
        state.pellets_remaining() as f32,
    ]
}

/// Applies the model's direction with no retry: a blocked or out-of-bounds
/// target keeps the pursuer where it is. Returns the observation used so the
/// caller can cache it.
pub fn decide_move(
    state: &SimulationState<'_>,
    current_pos: Vec2,
    model: &dyn PolicyModel,
) -> (Vec2, Observation) {
    let observation = encode_observation(state, current_pos);
    let Some(direction) = model.infer(&observation) else {
        return (current_pos, observation);
    };
    let (dx, dy) = direction.delta();
    let target = current_pos.offset(dx, dy);
    if state.grid.is_open(target) {
        (target, observation)
    } else {
        (current_pos, observation)
    }
}

pub fn from_kind(kind: PolicyKind) -> Arc<dyn PolicyModel> {
    match kind {
        PolicyKind::Idle => Arc::new(IdlePolicy),
        PolicyKind::Greedy => Arc::new(GreedyPolicy),
    }
}

/// Default when no model is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdlePolicy;

impl PolicyModel for IdlePolicy {
    fn name(&self) -> &str {
        "idle"
    }

    fn infer(&self, _observation: &Observation) -> Option<Direction> {
        None
    }
}

/// Closes the larger axis gap first; horizontal wins ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyPolicy;

impl PolicyModel for GreedyPolicy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn infer(&self, observation: &Observation) -> Option<Direction> {
        let dx = observation[2] - observation[0];
        let dy = observation[3] - observation[1];
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else {
            Some(if dy > 0.0 {
                Direction::Down
            } else {
                Direction::Up
            })
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LinearPolicyFile {
    version: u8,
    weights: [[f32; OBSERVATION_LEN]; 4],
    bias: [f32; 4],
}

/// One linear score per direction in [`Direction::MOVES`] order; the highest
/// score wins and earlier directions win ties.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearPolicy {
    weights: [[f32; OBSERVATION_LEN]; 4],
    bias: [f32; 4],
}

impl LinearPolicy {
    pub fn new(weights: [[f32; OBSERVATION_LEN]; 4], bias: [f32; 4]) -> Result<Self, PolicyLoadError> {
        let finite = weights.iter().flatten().chain(bias.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(PolicyLoadError::NonFinite);
        }
        Ok(Self { weights, bias })
    }

    pub fn from_json(text: &str, path: &Path) -> Result<Self, PolicyLoadError> {
        let file: LinearPolicyFile =
            serde_json::from_str(text).map_err(|source| PolicyLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if file.version != 1 {
            return Err(PolicyLoadError::UnsupportedVersion(file.version));
        }
        Self::new(file.weights, file.bias)
    }

    pub fn load(path: &Path) -> Result<Self, PolicyLoadError> {
        let text = fs::read_to_string(path).map_err(|source| PolicyLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }
}

impl PolicyModel for LinearPolicy {
    fn name(&self) -> &str {
        "linear"
    }

    fn infer(&self, observation: &Observation) -> Option<Direction> {
        let mut best: Option<(f32, Direction)> = None;
        for (idx, direction) in Direction::MOVES.into_iter().enumerate() {
            let score = self.weights[idx]
                .iter()
                .zip(observation.iter())
                .map(|(w, x)| w * x)
                .sum::<f32>()
                + self.bias[idx];
            if !score.is_finite() {
                return None;
            }
            if best.map(|(top, _)| score > top).unwrap_or(true) {
                best = Some((score, direction));
            }
        }
        best.map(|(_, direction)| direction)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::state::Evader;
    use crate::world::HexGrid;

    fn state<'a>(grid: &'a HexGrid, evader: &'a Evader, tick: u64) -> SimulationState<'a> {
        SimulationState {
            grid,
            evader,
            pursuers: &[],
            destination: Vec2::new(0, 0),
            tick,
        }
    }

    #[derive(Debug)]
    struct Fixed(Direction);

    impl PolicyModel for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn infer(&self, _observation: &Observation) -> Option<Direction> {
            Some(self.0)
        }
    }

    #[test]
    fn observation_layout_is_stable() {
        let grid = HexGrid::from_rows(&["...", " . ", "   "]).expect("square rows");
        let evader = Evader::new(Vec2::new(2, 1), 3, 0);
        let observation = encode_observation(&state(&grid, &evader, 23), Vec2::new(0, 2));
        assert_eq!(observation, [0.0, 2.0, 2.0, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn idle_policy_stays_in_place() {
        let grid = HexGrid::open(4);
        let evader = Evader::new(Vec2::new(3, 3), 3, 0);
        let (next, observation) =
            decide_move(&state(&grid, &evader, 1), Vec2::new(1, 1), &IdlePolicy);
        assert_eq!(next, Vec2::new(1, 1));
        assert_eq!(observation[2], 3.0);
    }

    #[test]
    fn blocked_or_out_of_bounds_targets_are_rejected_without_retry() {
        let grid = HexGrid::from_rows(&["   ", " # ", "   "]).expect("square rows");
        let evader = Evader::new(Vec2::new(2, 2), 3, 0);
        let snapshot = state(&grid, &evader, 0);

        let (next, _) = decide_move(&snapshot, Vec2::new(1, 0), &Fixed(Direction::Down));
        assert_eq!(next, Vec2::new(1, 0));
        let (next, _) = decide_move(&snapshot, Vec2::new(0, 0), &Fixed(Direction::Up));
        assert_eq!(next, Vec2::new(0, 0));
        let (next, _) = decide_move(&snapshot, Vec2::new(0, 0), &Fixed(Direction::Right));
        assert_eq!(next, Vec2::new(1, 0));
    }

    #[test]
    fn greedy_policy_closes_the_larger_gap() {
        let policy = GreedyPolicy;
        assert_eq!(
            policy.infer(&[0.0, 0.0, 4.0, 1.0, 0.0, 0.0]),
            Some(Direction::Right)
        );
        assert_eq!(
            policy.infer(&[3.0, 5.0, 2.0, 0.0, 0.0, 0.0]),
            Some(Direction::Up)
        );
        assert_eq!(policy.infer(&[2.0, 2.0, 2.0, 2.0, 0.0, 0.0]), None);
    }

    #[test]
    fn linear_policy_takes_argmax_with_first_direction_on_ties() {
        let mut weights = [[0.0; OBSERVATION_LEN]; 4];
        weights[3][2] = 1.0;
        let policy = LinearPolicy::new(weights, [0.0; 4]).expect("finite weights");
        assert_eq!(
            policy.infer(&[0.0, 0.0, 5.0, 0.0, 0.0, 0.0]),
            Some(Direction::Right)
        );
        assert_eq!(policy.infer(&[0.0; OBSERVATION_LEN]), Some(Direction::Up));
    }

    #[test]
    fn linear_policy_rejects_bad_files() {
        let path = PathBuf::from("weights.json");
        let version_two = r#"{"version":2,"weights":[[0,0,0,0,0,0],[0,0,0,0,0,0],[0,0,0,0,0,0],[0,0,0,0,0,0]],"bias":[0,0,0,0]}"#;
        assert!(matches!(
            LinearPolicy::from_json(version_two, &path),
            Err(PolicyLoadError::UnsupportedVersion(2))
        ));
        assert!(matches!(
            LinearPolicy::from_json("{", &path),
            Err(PolicyLoadError::Parse { .. })
        ));
        let mut weights = [[0.0; OBSERVATION_LEN]; 4];
        weights[0][0] = f32::NAN;
        assert!(matches!(
            LinearPolicy::new(weights, [0.0; 4]),
            Err(PolicyLoadError::NonFinite)
        ));
    }

    #[test]
    fn linear_policy_parses_version_one() {
        let text = r#"{"version":1,"weights":[[0,0,0,-1,0,0],[0,0,0,1,0,0],[0,0,-1,0,0,0],[0,0,1,0,0,0]],"bias":[0,0,0,0.5]}"#;
        let policy = LinearPolicy::from_json(text, Path::new("inline")).expect("valid weights");
        assert_eq!(
            policy.infer(&[0.0, 0.0, 0.0, 3.0, 0.0, 0.0]),
            Some(Direction::Down)
        );
    }

    #[test]
    fn missing_weights_file_reports_read_error() {
        let path = std::env::temp_dir().join("hexmaze-missing-dir").join("weights.json");
        assert!(matches!(
            LinearPolicy::load(&path),
            Err(PolicyLoadError::Read { .. })
        ));
    }
}
