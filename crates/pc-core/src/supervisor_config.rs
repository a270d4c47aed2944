use pc_config::ControllerConfig;

use std::time::Duration;

/// Exit code a node uses to report that another instance already owns it.
pub const ALREADY_RUNNING_EXIT_CODE: i32 = 33;

/// Interval used when an operation polls the supervisor for progress.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timing and policy knobs for the supervisor, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub sweep_interval: Duration,
    pub min_start_time: Duration,
    pub max_start_time: Duration,
    pub crash_detection: Duration,
    pub stopped_timeout: Duration,
    pub wont_start_retry: Duration,
    pub stop_timeout: Duration,
    pub stop_all_timeout: Duration,
    pub kill_timeout: Duration,
    pub collector_join_grace: Duration,
    pub poll_interval: Duration,
    pub output_buffer_bytes: usize,
    pub kill_running_nodes: bool,
    pub daemon: bool,
    pub already_running_exit_code: i32,
}

impl From<&ControllerConfig> for SupervisorConfig {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
            min_start_time: Duration::from_millis(config.min_start_time_ms),
            max_start_time: Duration::from_millis(config.max_start_time_ms),
            crash_detection: Duration::from_millis(config.crash_detection_ms),
            stopped_timeout: Duration::from_millis(config.stopped_timeout_ms),
            wont_start_retry: Duration::from_millis(config.wont_start_retry_ms),
            stop_timeout: Duration::from_millis(config.stop_timeout_ms),
            stop_all_timeout: Duration::from_millis(config.stop_all_timeout_ms),
            kill_timeout: Duration::from_millis(config.kill_timeout_ms),
            collector_join_grace: Duration::from_millis(config.collector_join_grace_ms),
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_buffer_bytes: config.output_buffer_bytes,
            kill_running_nodes: config.kill_running_nodes,
            daemon: config.daemon,
            already_running_exit_code: ALREADY_RUNNING_EXIT_CODE,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::from(&ControllerConfig::default())
    }
}
