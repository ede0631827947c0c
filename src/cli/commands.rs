//! CLI command implementations
//!
//! Both commands wire the same monitor from the config: for each point,
//! point -> Shewhart -> Tracking -> facts, and one rule kit over every point's
//! rules.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::chart::{Chart, Guide};
use crate::config::EngineConfig;
use crate::core::{ClockPort, CoreResult};
use crate::fact::{Fact, SustainMode};
use crate::knob::{KnobSetting, SUSTAINED_MIN_CYCLES};
use crate::observability::{log_event_with_fields, Event, Logger, MetricsSnapshot};
use crate::rule::{Rule, RuleKit};
use crate::sequence::{NodeId, Sequence};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_lines, write_error, write_response};

/// Main CLI entry point. This is the only function `main` calls.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    Logger::set_min_severity(cli.log_level.into());
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { config } => check(&config),
        Command::Replay { config, input } => replay(&config, &input),
    }
}

/// Nodes wired for one configured point.
#[derive(Debug, Clone)]
pub struct MonitoredPoint {
    pub name: String,
    pub point: NodeId,
    pub shewhart: NodeId,
    pub tracking: NodeId,
    pub facts: Vec<NodeId>,
}

pub struct Monitor {
    pub seq: Sequence,
    pub points: Vec<MonitoredPoint>,
    pub kit: Option<NodeId>,
}

impl Monitor {
    fn point(&self, name: &str) -> Option<&MonitoredPoint> {
        self.points.iter().find(|p| p.name == name)
    }

    fn summary(&self) -> Value {
        let nodes: Vec<Value> = self
            .seq
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| {
                json!({
                    "id": i,
                    "label": n.label(),
                    "kind": n.kind.kind_str(),
                    "trigger_group": n.element.trigger_group,
                    "triggers_per_cycle": n.element.cadence.triggers_per_cycle,
                    "inputs": n.kind.inputs(),
                })
            })
            .collect();
        json!({
            "nodes": nodes,
            "max_group": self.seq.max_group(),
            "rule_kit": self.kit,
        })
    }
}

/// Wire the monitor described by `config`.
pub fn wire(config: &EngineConfig) -> CliResult<Monitor> {
    let mut seq = config.sequence();
    let mut points = Vec::with_capacity(config.points.len());
    let mut kit = RuleKit::new();
    let mut rule_id = 0;

    for p in &config.points {
        let name = p.name.as_str();
        let point = seq.add_analog_point(name, p.range, p.triggers_per_cycle);
        let shewhart = seq.add_shewhart(&format!("{}.shewhart", name), point, config.shewhart.window_secs);
        let tracking = seq.add_tracking(
            &format!("{}.tracking", name),
            point,
            shewhart,
            Guide::Autoregressive,
        );

        let steady = seq.add_fact(&format!("{}.steady", name), Fact::from_chart(shewhart, Chart::is_steady));
        let settled = seq.add_fact(
            &format!("{}.settled", name),
            Fact::sustained(steady, SustainMode::True, SUSTAINED_MIN_CYCLES.default as u32)
                .map_err(knob_error)?,
        );
        let rising = seq.add_fact(&format!("{}.rising", name), Fact::from_chart(tracking, Chart::is_rising));
        let falling = seq.add_fact(&format!("{}.falling", name), Fact::from_chart(tracking, Chart::is_falling));
        let hunting = seq.add_fact(&format!("{}.hunting", name), Fact::from_chart(tracking, Chart::is_hunting));

        let settings = [
            (shewhart, KnobSetting::ShewhartZPass(config.shewhart.z_pass)),
            (shewhart, KnobSetting::ShewhartTripFreeMargin(config.shewhart.trip_free_margin)),
            (tracking, KnobSetting::TrackingLagFrac(config.tracking.lag_frac)),
            (tracking, KnobSetting::TrackingStaleFrac(config.tracking.stale_frac)),
            (
                tracking,
                KnobSetting::TrackingAppsBetweenResets(config.tracking.apps_between_resets),
            ),
        ];
        for (node, setting) in settings {
            seq.apply_knob(node, setting).map_err(knob_error)?;
        }
        if let Some(v) = config.tracking.half_band {
            seq.apply_knob(tracking, KnobSetting::TrackingHalfBand(v)).map_err(knob_error)?;
        }
        if let Some(v) = config.tracking.warn {
            seq.apply_knob(tracking, KnobSetting::TrackingWarn(v)).map_err(knob_error)?;
        }

        // once settled, a point neither hunts nor drifts
        rule_id += 1;
        kit = kit.with_rule(Rule::new(rule_id, vec![settled], vec![hunting]).with_then(|c| !c[0]));
        rule_id += 1;
        kit = kit.with_rule(
            Rule::new(rule_id, vec![settled], vec![rising, falling]).with_then(|c| !c[0] && !c[1]),
        );

        points.push(MonitoredPoint {
            name: p.name.clone(),
            point,
            shewhart,
            tracking,
            facts: vec![steady, settled, rising, falling, hunting],
        });
    }

    let kit = if points.is_empty() {
        None
    } else {
        let id = seq.add_rule_kit("unit", 1, kit);
        seq.apply_knob(id, KnobSetting::RuleKitTrapSecs(config.rule_kit.trap_secs))
            .map_err(knob_error)?;
        Some(id)
    };

    seq.finish_wiring();
    Ok(Monitor { seq, points, kit })
}

fn knob_error(e: crate::core::CoreError) -> CliError {
    CliError::config_error(format!("{}: {}", e.code(), e))
}

/// Validate a config and print the wired nodes.
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = load(config_path)?;
    let monitor = wire(&config)?;
    write_response(&mut io::stdout(), monitor.summary())
}

/// Replay a JSON-lines reading file, one status line per tick.
pub fn replay(config_path: &Path, input_path: &Path) -> CliResult<()> {
    let config = load(config_path)?;
    let input = File::open(input_path)
        .map_err(|e| CliError::io_error(format!("Failed to open {:?}: {}", input_path, e)))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    replay_from(&config, BufReader::new(input), &mut out)?;
    Ok(())
}

fn load(config_path: &Path) -> CliResult<EngineConfig> {
    let config = EngineConfig::load(config_path)?;
    let path = config_path.display().to_string();
    let points = config.points.len().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", &path), ("points", &points)]);
    Ok(config)
}

/// One line of a reading file.
#[derive(Debug, Deserialize)]
struct ReadingLine {
    timestamp: Value,
    #[serde(default)]
    values: BTreeMap<String, (f64, bool)>,
}

fn parse_timestamp(line: usize, v: &Value) -> CliResult<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CliError::input_error(line, "timestamp must be whole seconds")),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.timestamp())
            .map_err(|e| CliError::input_error(line, format!("timestamp '{}': {}", s, e))),
        _ => Err(CliError::input_error(line, "timestamp must be a number or RFC 3339 string")),
    }
}

/// Drive a freshly wired monitor with `input`, writing to `out`.
///
/// Points missing from a line keep the value posted last. A reading whose
/// timestamp repeats the previous one is answered with an error line and
/// skipped; any other malformed line ends the replay.
pub fn replay_from<R: BufRead, W: Write>(
    config: &EngineConfig,
    input: R,
    out: &mut W,
) -> CliResult<MetricsSnapshot> {
    let mut monitor = wire(config)?;
    let mut port = ClockPort::new();
    let run_id = Uuid::new_v4().to_string();
    log_event_with_fields(Event::ReplayStart, &[("run_id", &run_id)]);

    for entry in read_lines(input) {
        let (line, value) = entry?;
        let reading: ReadingLine =
            serde_json::from_value(value).map_err(|e| CliError::input_error(line, e))?;
        let timestamp = parse_timestamp(line, &reading.timestamp)?;

        let mut posts = Vec::with_capacity(reading.values.len());
        for (name, (x, valid)) in &reading.values {
            let point = monitor
                .point(name)
                .ok_or_else(|| CliError::input_error(line, format!("unknown point '{}'", name)))?
                .point;
            posts.push((point, *x, *valid));
        }

        // a rejected timestamp leaves the points as they were
        let clock: CoreResult<_> = port.read(timestamp);
        let clock = match clock {
            Ok(c) => c,
            Err(e) => {
                write_error(out, e.code(), &format!("line {}: {}", line, e))?;
                continue;
            }
        };
        for (point, x, valid) in posts {
            monitor.seq.post_analog(point, x, valid);
        }

        let status = monitor.seq.trigger(&clock);
        let mut facts = Map::new();
        for p in &monitor.points {
            for id in &p.facts {
                let fact = monitor.seq.fact(*id);
                let claim = if fact.is_valid() { json!(fact.now()) } else { Value::Null };
                facts.insert(monitor.seq.node(*id).label().to_string(), claim);
            }
        }
        let kit = monitor
            .kit
            .map(|k| serde_json::to_value(monitor.seq.rule_kit(k).last_outcome()))
            .transpose()?;

        write_response(
            out,
            json!({
                "run_id": run_id,
                "tick": clock.trigger_count,
                "timestamp": clock.timestamp,
                "tick_status": status,
                "facts": facts,
                "kit": kit,
            }),
        )?;
    }

    let metrics = monitor.seq.metrics().snapshot();
    let ticks = metrics.ticks.to_string();
    log_event_with_fields(Event::ReplayComplete, &[("run_id", &run_id), ("ticks", &ticks)]);
    write_response(out, json!({ "run_id": run_id, "metrics": metrics }))?;
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> EngineConfig {
        EngineConfig::from_json(r#"{"points": [{"name": "sat", "range": "zero_to_120"}]}"#).unwrap()
    }

    fn lines(out: &[u8]) -> Vec<Value> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_wire_builds_one_chain_per_point() {
        let monitor = wire(&config()).unwrap();
        assert_eq!(monitor.points.len(), 1);
        // point, 2 charts, 5 facts, kit
        assert_eq!(monitor.seq.nodes().len(), 9);
        let kit = monitor.seq.rule_kit(monitor.kit.unwrap());
        assert_eq!(kit.rules().len(), 2);
        assert_eq!(kit.trap_cycles(), 60);
    }

    #[test]
    fn test_replay_writes_one_line_per_tick() {
        let input: String = (0..5)
            .map(|i| format!("{{\"timestamp\": {}, \"values\": {{\"sat\": [55.0, true]}}}}\n", 1_700_000_000 + 60 * i))
            .collect();
        let mut out = Vec::new();
        let metrics = replay_from(&config(), input.as_bytes(), &mut out).unwrap();
        assert_eq!(metrics.ticks, 5);

        let lines = lines(&out);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0]["data"]["tick"], 1);
        assert_eq!(lines[0]["data"]["tick_status"], "AllCycled");
        assert_eq!(lines[4]["data"]["facts"]["sat.steady"], true);
        assert!(lines[5]["data"]["metrics"]["node_cycles"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_rfc3339_timestamps_and_repeats() {
        let input = "{\"timestamp\": \"2024-03-01T10:00:00Z\", \"values\": {\"sat\": [50, true]}}\n\
                     {\"timestamp\": \"2024-03-01T10:00:00Z\"}\n\
                     {\"timestamp\": \"2024-03-01T10:01:00Z\"}\n";
        let mut out = Vec::new();
        let metrics = replay_from(&config(), input.as_bytes(), &mut out).unwrap();
        assert_eq!(metrics.ticks, 2);
        let lines = lines(&out);
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["code"], "AFDD_FAIL_TIMESTAMP_SAME_AS_PREVIOUS");
    }

    #[test]
    fn test_rejected_timestamp_discards_its_values() {
        let input = "{\"timestamp\": 6000, \"values\": {\"sat\": [50, true]}}\n\
                     {\"timestamp\": 6000, \"values\": {\"sat\": [100, true]}}\n\
                     {\"timestamp\": 6060}\n";
        let mut out = Vec::new();
        let metrics = replay_from(&config(), input.as_bytes(), &mut out).unwrap();
        assert_eq!(metrics.ticks, 2);
        let lines = lines(&out);
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[2]["data"]["tick"], 2);
        assert_eq!(lines[2]["data"]["facts"]["sat.steady"], true);
    }

    #[test]
    fn test_unknown_point_ends_replay() {
        let input = "{\"timestamp\": 100, \"values\": {\"oat\": [50, true]}}\n";
        let mut out = Vec::new();
        let err = replay_from(&config(), input.as_bytes(), &mut out).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InputError);
        assert!(err.message().contains("oat"));
    }

    #[test]
    fn test_check_rejects_bad_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("afdd.json");
        fs::write(&path, r#"{"secs_per_trigger": 0}"#).unwrap();
        let err = check(&path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
