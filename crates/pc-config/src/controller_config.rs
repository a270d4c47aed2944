use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_SWEEP_INTERVAL_MS: u64 = 100;
pub const MAX_SWEEP_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5_000;

pub const MIN_MIN_START_TIME_MS: u64 = 0;
pub const MAX_MIN_START_TIME_MS: u64 = 600_000;
pub const DEFAULT_MIN_START_TIME_MS: u64 = 5_000;

pub const MIN_MAX_START_TIME_MS: u64 = 1_000;
pub const MAX_MAX_START_TIME_MS: u64 = 3_600_000;
pub const DEFAULT_MAX_START_TIME_MS: u64 = 90_000;

pub const MIN_CRASH_DETECTION_MS: u64 = 1_000;
pub const MAX_CRASH_DETECTION_MS: u64 = 600_000;
pub const DEFAULT_CRASH_DETECTION_MS: u64 = 15_000;

pub const MIN_STOPPED_TIMEOUT_MS: u64 = 0;
pub const MAX_STOPPED_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_STOPPED_TIMEOUT_MS: u64 = 5_000;

pub const MIN_WONT_START_RETRY_MS: u64 = 1_000;
pub const MAX_WONT_START_RETRY_MS: u64 = 3_600_000;
pub const DEFAULT_WONT_START_RETRY_MS: u64 = 60_000;

pub const MIN_STOP_TIMEOUT_MS: u64 = 100;
pub const MAX_STOP_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 10_000;

pub const MIN_STOP_ALL_TIMEOUT_MS: u64 = 1_000;
pub const MAX_STOP_ALL_TIMEOUT_MS: u64 = 3_600_000;
pub const DEFAULT_STOP_ALL_TIMEOUT_MS: u64 = 60_000;

pub const MIN_KILL_TIMEOUT_MS: u64 = 100;
pub const MAX_KILL_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 30_000;

pub const MIN_OUTPUT_BUFFER_BYTES: usize = 1_024;
pub const MAX_OUTPUT_BUFFER_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_OUTPUT_BUFFER_BYTES: usize = 64 * 1024;

pub const MIN_COLLECTOR_JOIN_GRACE_MS: u64 = 10;
pub const MAX_COLLECTOR_JOIN_GRACE_MS: u64 = 60_000;
pub const DEFAULT_COLLECTOR_JOIN_GRACE_MS: u64 = 1_000;

pub const DEFAULT_KILL_RUNNING_NODES: bool = true;
pub const DEFAULT_DAEMON: bool = false;

/// Timing and policy tunables for the node supervisor.
///
/// Read once at startup. All durations are milliseconds of wall-clock
/// time measured against the state's last relevant observation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Interval between reconciliation sweeps
    pub sweep_interval_ms: u64,
    /// Process exits observed before this much time has passed are ignored
    pub min_start_time_ms: u64,
    /// A node that has not answered a ping by now is considered failed
    pub max_start_time_ms: u64,
    /// How long a running node may fail pings before it is declared crashed
    pub crash_detection_ms: u64,
    /// Grace before a stopped node that answers pings is re-adopted
    pub stopped_timeout_ms: u64,
    /// How long a node that would not start waits before another attempt
    pub wont_start_retry_ms: u64,
    /// Default graceful stop timeout
    pub stop_timeout_ms: u64,
    /// Overall ceiling for stopping every node at shutdown
    pub stop_all_timeout_ms: u64,
    /// Upper bound on a single invocation of the control script
    pub kill_timeout_ms: u64,
    /// Bytes of stdout/stderr retained per stream for diagnostics
    pub output_buffer_bytes: usize,
    /// Grace period when joining output collectors
    pub collector_join_grace_ms: u64,
    /// Whether a running node that stops answering may be killed
    pub kill_running_nodes: bool,
    /// Administrative daemon mode: disabled nodes found running are shut down
    pub daemon: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            min_start_time_ms: DEFAULT_MIN_START_TIME_MS,
            max_start_time_ms: DEFAULT_MAX_START_TIME_MS,
            crash_detection_ms: DEFAULT_CRASH_DETECTION_MS,
            stopped_timeout_ms: DEFAULT_STOPPED_TIMEOUT_MS,
            wont_start_retry_ms: DEFAULT_WONT_START_RETRY_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            stop_all_timeout_ms: DEFAULT_STOP_ALL_TIMEOUT_MS,
            kill_timeout_ms: DEFAULT_KILL_TIMEOUT_MS,
            output_buffer_bytes: DEFAULT_OUTPUT_BUFFER_BYTES,
            collector_join_grace_ms: DEFAULT_COLLECTOR_JOIN_GRACE_MS,
            kill_running_nodes: DEFAULT_KILL_RUNNING_NODES,
            daemon: DEFAULT_DAEMON,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        check_range(
            "sweep_interval_ms",
            self.sweep_interval_ms,
            MIN_SWEEP_INTERVAL_MS,
            MAX_SWEEP_INTERVAL_MS,
        )?;
        check_range(
            "min_start_time_ms",
            self.min_start_time_ms,
            MIN_MIN_START_TIME_MS,
            MAX_MIN_START_TIME_MS,
        )?;
        check_range(
            "max_start_time_ms",
            self.max_start_time_ms,
            MIN_MAX_START_TIME_MS,
            MAX_MAX_START_TIME_MS,
        )?;
        check_range(
            "crash_detection_ms",
            self.crash_detection_ms,
            MIN_CRASH_DETECTION_MS,
            MAX_CRASH_DETECTION_MS,
        )?;
        check_range(
            "stopped_timeout_ms",
            self.stopped_timeout_ms,
            MIN_STOPPED_TIMEOUT_MS,
            MAX_STOPPED_TIMEOUT_MS,
        )?;
        check_range(
            "wont_start_retry_ms",
            self.wont_start_retry_ms,
            MIN_WONT_START_RETRY_MS,
            MAX_WONT_START_RETRY_MS,
        )?;
        check_range(
            "stop_timeout_ms",
            self.stop_timeout_ms,
            MIN_STOP_TIMEOUT_MS,
            MAX_STOP_TIMEOUT_MS,
        )?;
        check_range(
            "stop_all_timeout_ms",
            self.stop_all_timeout_ms,
            MIN_STOP_ALL_TIMEOUT_MS,
            MAX_STOP_ALL_TIMEOUT_MS,
        )?;
        check_range(
            "kill_timeout_ms",
            self.kill_timeout_ms,
            MIN_KILL_TIMEOUT_MS,
            MAX_KILL_TIMEOUT_MS,
        )?;
        check_range(
            "collector_join_grace_ms",
            self.collector_join_grace_ms,
            MIN_COLLECTOR_JOIN_GRACE_MS,
            MAX_COLLECTOR_JOIN_GRACE_MS,
        )?;

        if self.output_buffer_bytes < MIN_OUTPUT_BUFFER_BYTES
            || self.output_buffer_bytes > MAX_OUTPUT_BUFFER_BYTES
        {
            return Err(ConfigError::controller(format!(
                "controller.output_buffer_bytes must be {}-{}, got {}",
                MIN_OUTPUT_BUFFER_BYTES, MAX_OUTPUT_BUFFER_BYTES, self.output_buffer_bytes
            )));
        }

        if self.max_start_time_ms <= self.min_start_time_ms {
            return Err(ConfigError::controller(format!(
                "controller.max_start_time_ms ({}) must be greater than min_start_time_ms ({})",
                self.max_start_time_ms, self.min_start_time_ms
            )));
        }

        Ok(())
    }
}

#[track_caller]
fn check_range(key: &str, value: u64, min: u64, max: u64) -> ConfigErrorResult<()> {
    if value < min || value > max {
        return Err(ConfigError::controller(format!(
            "controller.{key} must be {min}-{max}, got {value}"
        )));
    }
    Ok(())
}
