use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// One JSON object per line on stderr.
#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    #[serde(rename = "timestampIso")]
    pub timestamp_iso: String,
    pub level: String,
    pub event: String,
    #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

/// Where a log line came from. Empty fields are left out of the output.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogContext<'a> {
    pub run_id: Option<&'a str>,
    pub scenario: Option<&'a str>,
    pub seed: Option<u32>,
    pub tick: Option<u64>,
}

impl<'a> LogContext<'a> {
    pub fn run(run_id: &'a str) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    pub fn scenario(self, scenario: &'a str, seed: u32) -> Self {
        Self {
            scenario: Some(scenario),
            seed: Some(seed),
            ..self
        }
    }

    pub fn at_tick(self, tick: u64) -> Self {
        Self {
            tick: Some(tick),
            ..self
        }
    }
}

pub fn now_ms() -> u64 {
    timestamp_ms(Utc::now())
}

fn timestamp_ms(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp_millis()).unwrap_or(0)
}

pub fn build_log_line(
    at: DateTime<Utc>,
    level: &str,
    event: &str,
    context: LogContext<'_>,
    details: Value,
) -> StructuredLogLine {
    StructuredLogLine {
        timestamp_ms: timestamp_ms(at),
        timestamp_iso: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        level: level.to_string(),
        event: event.to_string(),
        run_id: context.run_id.map(str::to_string),
        scenario: context.scenario.map(str::to_string),
        seed: context.seed,
        tick: context.tick,
        details,
    }
}

pub fn emit_log(level: &str, event: &str, context: LogContext<'_>, details: Value) {
    let line = build_log_line(Utc::now(), level, event, context, details);
    match serde_json::to_string(&line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("[log] failed to serialize {event}: {error}"),
    }
}
