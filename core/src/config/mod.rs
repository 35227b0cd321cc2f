mod load;
mod types;

pub use load::{apply_env_overrides, get_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, BackendConfig, LoggingConfig, PlannerConfig, RetryConfig, ReviewConfig,
    SchedulerConfig, DEFAULT_TASK_TIMEOUT_SECS, MAX_TASK_TIMEOUT_SECS,
};
