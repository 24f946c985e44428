use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default stepflow data directory: ~/.stepflow
pub fn get_stepflow_data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".stepflow"))
}

/// Load configuration with an optional explicit path.
///
/// Priority: `explicit` > ~/.stepflow/config.toml > ./config.toml > defaults,
/// then environment overrides on top.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let cfg = match explicit {
        Some(path) => load_from_path(path)?,
        None => load_default()?,
    };
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_stepflow_data_dir()?;
    let user_config = data_dir.join("config.toml");
    let local_config = Path::new("config.toml");

    let cfg = if user_config.exists() {
        read_config(&user_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    finalize(cfg, Some(&data_dir))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }
    let cfg = read_config(path)?;
    finalize(cfg, get_stepflow_data_dir().ok().as_deref())
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}

fn finalize(mut cfg: AppConfig, data_dir: Option<&Path>) -> anyhow::Result<AppConfig> {
    let dir_unset = cfg
        .logging
        .directory
        .as_ref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if dir_unset {
        if let Some(data_dir) = data_dir {
            cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
        }
    }

    cfg.tools.expand_env();
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
pub fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(v) = env_value("STEPFLOW_LOG_LEVEL") {
        cfg.logging.level = v;
    }

    if let Some(v) = env_value("STEPFLOW_MAX_PARALLEL") {
        let n: usize = v
            .parse()
            .map_err(|_| anyhow::anyhow!("STEPFLOW_MAX_PARALLEL must be a number, got '{v}'"))?;
        cfg.executor.max_parallel = (n > 0).then_some(n);
    }

    if let Some(v) = env_value("STEPFLOW_UNKNOWN_TOOL") {
        cfg.executor.unknown_tool = v.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }

    if let Some(v) = env_value("STEPFLOW_HTTP_PORT") {
        cfg.http_server.port = v
            .parse()
            .map_err(|_| anyhow::anyhow!("STEPFLOW_HTTP_PORT must be a port number, got '{v}'"))?;
    }

    Ok(())
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::UnknownToolPolicy;
    use std::io::Write;
    use std::sync::Mutex;

    // Env overrides are process-global; serialize the tests that read or set them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_load_from_path_reads_sections() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"
directory = "/tmp/stepflow-logs"

[executor]
max_parallel = 2
progress_bar = true

[http_server]
port = 9191
"#
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.executor.max_parallel, Some(2));
        assert!(cfg.executor.progress_bar);
        assert_eq!(cfg.logging.directory.as_deref(), Some("/tmp/stepflow-logs"));
        assert_eq!(cfg.http_server.port, 9191);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[executor\nmax_parallel = ").unwrap();
        let err = load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut cfg = AppConfig::default();

        std::env::set_var("STEPFLOW_UNKNOWN_TOOL", "placeholder");
        std::env::set_var("STEPFLOW_MAX_PARALLEL", "0");
        apply_env_overrides(&mut cfg).unwrap();
        std::env::remove_var("STEPFLOW_UNKNOWN_TOOL");
        std::env::remove_var("STEPFLOW_MAX_PARALLEL");

        assert_eq!(cfg.executor.unknown_tool, UnknownToolPolicy::Placeholder);
        assert_eq!(cfg.executor.max_parallel, None);
    }

    #[test]
    fn test_bad_env_port_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut cfg = AppConfig::default();
        std::env::set_var("STEPFLOW_HTTP_PORT", "eighty");
        let res = apply_env_overrides(&mut cfg);
        std::env::remove_var("STEPFLOW_HTTP_PORT");
        assert!(res.is_err());
    }
}
