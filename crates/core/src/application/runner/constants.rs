// Runner constants (no magic values)

/// Bodies allowed to run at the same time
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Admitted jobs allowed to wait for a worker before `start` rejects
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Environment variable overriding `max_workers`
pub const ENV_MAX_WORKERS: &str = "PANELKIT_MAX_WORKERS";

/// Environment variable overriding `queue_capacity`
pub const ENV_QUEUE_CAPACITY: &str = "PANELKIT_QUEUE_CAPACITY";

/// Shown when a panic payload carries no message
pub const UNKNOWN_PANIC_MESSAGE: &str = "Unknown panic";
