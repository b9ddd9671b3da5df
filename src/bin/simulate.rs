use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hexmaze_pursuit::config::{DestinationPolicy, GameConfig, PolicyKind};
use hexmaze_pursuit::engine::GameEngine;
use hexmaze_pursuit::policy::PolicyModel;
use hexmaze_pursuit::server_utils::{load_config, load_policy, resolve_seed};
use hexmaze_pursuit::telemetry::{emit_log, now_ms, LogContext};
use hexmaze_pursuit::types::{GameOverReason, RuntimeEvent, Snapshot, StrategyKind, Vec2};
use hexmaze_pursuit::world::HexGrid;
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    games: usize,
    #[arg(long)]
    grid_size: Option<i32>,
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    rotation_interval: Option<u32>,
    /// `idle` or `greedy`.
    #[arg(long)]
    policy: Option<String>,
    #[arg(long)]
    policy_weights: Option<PathBuf>,
    /// Comma-separated strategies, e.g. `astar,minimax,policy`.
    #[arg(long)]
    pursuers: Option<String>,
    /// `keep`, `remap` or `reroll`.
    #[arg(long)]
    destination_policy: Option<String>,
    #[arg(long, default_value_t = 2_000)]
    max_ticks: u64,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// JSON game config; flags above override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    scenario: String,
    seed: u32,
    reason: String,
    ticks: u64,
    score: i32,
    lives: u32,
    #[serde(rename = "pelletsCollected")]
    pellets_collected: u32,
    #[serde(rename = "bonusesAwarded")]
    bonuses_awarded: u32,
    #[serde(rename = "extraLivesAwarded")]
    extra_lives_awarded: u32,
    rotations: u32,
    captures: u32,
    #[serde(rename = "destinationMoves")]
    destination_moves: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct GameRun {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    config: GameConfig,
    policy: String,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "averageScore")]
    average_score: f64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let base_seed = resolve_seed(cli.seed);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, run_started_at_ms));

    let (config, policy) = match resolve_setup(&cli) {
        Ok(setup) => setup,
        Err(error) => {
            emit_log(
                "error",
                "setup_failed",
                LogContext::run(&run_id),
                json!({ "error": format!("{error:#}") }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for game_idx in 0..cli.games {
        let seed = base_seed.wrapping_add(game_idx as u32);
        let scenario = format!("game-{}", game_idx + 1);
        let context = LogContext::run(&run_id).scenario(&scenario, seed);
        emit_log(
            "info",
            "game_started",
            context,
            json!({
                "gridSize": config.grid_size,
                "adversarialDepth": config.adversarial_depth,
                "rotationIntervalTicks": config.rotation_interval_ticks,
                "policy": policy.name(),
            }),
        );

        let run = match run_game(&scenario, &config, &policy, seed, cli.max_ticks) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "game_setup_failed",
                    context,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                context.at_tick(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();
        *reason_counts.entry(run.result.reason.clone()).or_insert(0) += 1;

        emit_log(
            "info",
            "game_finished",
            context.at_tick(run.result.ticks),
            json!({
                "reason": run.result.reason,
                "score": run.result.score,
                "rotations": run.result.rotations,
                "anomalyCount": run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => eprintln!("[simulate] failed to serialize result: {error}"),
        }
        results.push(run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        &config,
        policy.name(),
        results,
        reason_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                LogContext::run(&run_id),
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        LogContext::run(&run_id),
        json!({
            "gameCount": summary.game_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_setup(cli: &Cli) -> anyhow::Result<(GameConfig, Arc<dyn PolicyModel>)> {
    let mut config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    if let Some(grid_size) = cli.grid_size {
        config.grid_size = grid_size;
    }
    if let Some(depth) = cli.depth {
        config.adversarial_depth = depth;
    }
    if let Some(interval) = cli.rotation_interval {
        config.rotation_interval_ticks = interval;
    }
    if let Some(raw) = cli.policy.as_deref() {
        config.policy =
            PolicyKind::parse(raw).with_context(|| format!("unknown policy `{raw}`"))?;
    }
    if let Some(raw) = cli.pursuers.as_deref() {
        config.pursuers = parse_pursuers(raw)?;
    }
    if let Some(raw) = cli.destination_policy.as_deref() {
        config.destination_policy = DestinationPolicy::parse(raw)
            .with_context(|| format!("unknown destination policy `{raw}`"))?;
    }
    config.validate().context("invalid game config")?;

    let policy = load_policy(config.policy, cli.policy_weights.as_deref())?;
    Ok((config, policy))
}

fn parse_pursuers(raw: &str) -> anyhow::Result<Vec<StrategyKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            StrategyKind::parse(name).with_context(|| format!("unknown pursuer strategy `{name}`"))
        })
        .collect()
}

fn run_game(
    scenario: &str,
    config: &GameConfig,
    policy: &Arc<dyn PolicyModel>,
    seed: u32,
    max_ticks: u64,
) -> anyhow::Result<GameRun> {
    let mut engine = GameEngine::with_policy(config.clone(), seed, Arc::clone(policy))?;

    let mut captures = 0u32;
    let mut destination_moves = 0u32;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    while !engine.is_ended() && engine.tick() < max_ticks {
        let direction = engine.autopilot_direction();
        engine.step(direction);
        let snapshot = engine.build_snapshot(true);

        let mut rotated = false;
        for event in &snapshot.events {
            match event {
                RuntimeEvent::EvaderCaught { .. } => captures += 1,
                RuntimeEvent::DestinationMoved { .. } => destination_moves += 1,
                RuntimeEvent::MazeRotated { .. } => rotated = true,
                _ => {}
            }
        }

        let lives_cap = config.initial_lives + engine.evader().extra_lives_awarded;
        let mut messages = collect_snapshot_anomalies(&snapshot, &engine.grid, lives_cap);
        if rotated {
            messages.extend(collect_adjacency_anomalies(&engine.grid));
        }
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
    }

    let summary = engine.build_summary();
    Ok(GameRun {
        result: GameResultLine {
            scenario: scenario.to_string(),
            seed,
            reason: game_over_reason_key(summary.reason),
            ticks: summary.ticks,
            score: summary.score,
            lives: summary.lives,
            pellets_collected: summary.pellets_collected,
            bonuses_awarded: summary.bonuses_awarded,
            extra_lives_awarded: summary.extra_lives_awarded,
            rotations: summary.rotations,
            captures,
            destination_moves,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, grid: &HexGrid, lives_cap: u32) -> Vec<String> {
    let mut anomalies = Vec::new();
    let evader = Vec2::new(snapshot.evader.x, snapshot.evader.y);
    if !grid.is_open(evader) {
        anomalies.push(format!("evader on blocked tile: ({}, {})", evader.x, evader.y));
    }
    for pursuer in &snapshot.pursuers {
        if !grid.is_open(Vec2::new(pursuer.x, pursuer.y)) {
            anomalies.push(format!(
                "pursuer on blocked tile: {} ({}, {})",
                pursuer.id, pursuer.x, pursuer.y
            ));
        }
    }
    if !snapshot.game_over && snapshot.destination == evader {
        anomalies.push("destination reached without game over".to_string());
    }
    if !grid.is_open(snapshot.destination) {
        anomalies.push(format!(
            "destination on blocked tile: ({}, {})",
            snapshot.destination.x, snapshot.destination.y
        ));
    }
    if snapshot.evader.score < 0 {
        anomalies.push(format!("negative score: {}", snapshot.evader.score));
    }
    if snapshot.evader.lives > lives_cap {
        anomalies.push(format!(
            "lives over-run: {} > {}",
            snapshot.evader.lives, lives_cap
        ));
    }
    anomalies
}

fn collect_adjacency_anomalies(grid: &HexGrid) -> Vec<String> {
    let mut anomalies = Vec::new();
    for tile in grid.tiles() {
        for &next in tile.neighbors() {
            if !grid.in_bounds(next) {
                anomalies.push(format!("neighbor out of bounds: ({}, {})", next.x, next.y));
            } else if !grid.neighbors(next).contains(&tile.pos) {
                anomalies.push(format!(
                    "asymmetric adjacency: ({}, {}) -> ({}, {})",
                    tile.pos.x, tile.pos.y, next.x, next.y
                ));
            }
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

#[allow(clippy::too_many_arguments)]
fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    config: &GameConfig,
    policy: &str,
    games: Vec<GameResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let game_count = games.len();
    let (average_ticks, average_score) = if game_count == 0 {
        (0, 0.0)
    } else {
        let ticks: u64 = games.iter().map(|game| game.ticks).sum();
        let score: i64 = games.iter().map(|game| i64::from(game.score)).sum();
        (ticks / game_count as u64, score as f64 / game_count as f64)
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        config: config.clone(),
        policy: policy.to_string(),
        game_count,
        anomaly_count,
        average_ticks,
        average_score,
        reason_counts,
        games,
    }
}

fn game_over_reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::Victory) => "victory",
        Some(GameOverReason::Caught) => "caught",
        None => "unfinished",
    }
    .to_string()
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
