use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default taskpilot data directory: ~/.taskpilot
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".taskpilot"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.taskpilot/config.toml (highest)
    let user_config = get_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {} failed: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse config {} failed: {e}", path.display()))?;
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
pub fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("TASKPILOT_BACKEND_CMD") {
        if !v.trim().is_empty() {
            cfg.backend.command = Some(v.trim().to_string());
        }
    }
    if let Ok(v) = std::env::var("TASKPILOT_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v.trim().to_string();
        }
    }
    if let Ok(v) = std::env::var("TASKPILOT_MAX_IDLE_POLLS") {
        match v.trim().parse::<u32>() {
            Ok(n) => cfg.scheduler.max_idle_polls = n,
            Err(_) => tracing::warn!("ignoring invalid TASKPILOT_MAX_IDLE_POLLS={}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[scheduler]
max_idle_polls = 5

[review]
acceptance_threshold = 90

[backend]
command = "llm"
args = ["-m", "small"]
"#
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.scheduler.max_idle_polls, 5);
        assert_eq!(cfg.scheduler.idle_poll_interval_ms, 500);
        assert!(cfg.scheduler.reject_cyclic_plans);
        assert_eq!(cfg.review.acceptance_threshold, 90);
        assert_eq!(cfg.review.max_iterations, 3);
        assert_eq!(cfg.planner.retry.max_attempts, 3);
        assert_eq!(cfg.backend.command.as_deref(), Some("llm"));
        assert_eq!(cfg.backend.args, vec!["-m", "small"]);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\nmax_idle_polls = \"many\"").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_task_timeout_clamped() {
        let mut cfg = AppConfig::default();
        cfg.scheduler.task_timeout_secs = 0;
        assert_eq!(cfg.scheduler.effective_task_timeout_secs(), 1);
        cfg.scheduler.task_timeout_secs = 99_999;
        assert_eq!(cfg.scheduler.effective_task_timeout_secs(), 3600);
    }
}
