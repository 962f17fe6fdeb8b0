use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Endpoint used when neither a flag, the environment nor a profile names one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8090/fhir";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub data_dir: Option<PathBuf>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

/// Settings for one run. Resolved once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub server_url: Url,
    pub data_dir: PathBuf,
    pub timeout: Option<Duration>,
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".octofhir"))
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("loader.toml"))
}

pub fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let cfg: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let all = load_all_from(&config_path()?)?;
    Ok(all.get(profile).cloned().unwrap_or_default())
}

pub fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

/// Apply a `config set` key to a profile.
pub fn set_value(config: &mut ProfileConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "server" => {
            parse_server_url(value)?;
            config.server = Some(value.to_string());
        }
        "data_dir" => config.data_dir = Some(PathBuf::from(value)),
        other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, data_dir"),
    }
    Ok(())
}

pub fn parse_server_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid server URL \"{raw}\""))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Server URL must use http or https, got \"{}\"", url.scheme());
    }
    Ok(url)
}

/// Merge flag/env values over the stored profile.
///
/// `cli_server` and `cli_data_dir` already carry the environment fallback
/// (clap reads `FHIR_SERVER_URL` / `FHIR_DATA_DIR`), so precedence is
/// flag > env > profile > built-in default.
pub fn resolve(
    cli_server: Option<&str>,
    cli_data_dir: Option<&Path>,
    timeout_secs: Option<u64>,
    profile: &ProfileConfig,
) -> Result<LoaderConfig> {
    let server = cli_server
        .or(profile.server.as_deref())
        .unwrap_or(DEFAULT_SERVER_URL);
    let server_url = parse_server_url(server)?;

    let data_dir = match cli_data_dir {
        Some(dir) => dir.to_path_buf(),
        None => profile.data_dir.clone().context(
            "No data directory configured. Use --data-dir, set FHIR_DATA_DIR, or run: octofhir-loader config set data_dir <path>",
        )?,
    };

    Ok(LoaderConfig {
        server_url,
        data_dir,
        timeout: timeout_secs.map(Duration::from_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_cli_over_profile() {
        let profile = ProfileConfig {
            server: Some("http://profile.example/fhir".into()),
            data_dir: Some(PathBuf::from("/profile/data")),
        };
        let cfg = resolve(
            Some("https://cli.example/fhir"),
            Some(Path::new("/cli/data")),
            Some(15),
            &profile,
        )
        .unwrap();
        assert_eq!(cfg.server_url.as_str(), "https://cli.example/fhir");
        assert_eq!(cfg.data_dir, PathBuf::from("/cli/data"));
        assert_eq!(cfg.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_resolve_falls_back_to_profile_then_default() {
        let profile = ProfileConfig {
            server: None,
            data_dir: Some(PathBuf::from("/profile/data")),
        };
        let cfg = resolve(None, None, None, &profile).unwrap();
        assert_eq!(cfg.server_url.as_str(), DEFAULT_SERVER_URL);
        assert_eq!(cfg.data_dir, PathBuf::from("/profile/data"));
        assert!(cfg.timeout.is_none());
    }

    #[test]
    fn test_resolve_requires_data_dir() {
        let err = resolve(None, None, None, &ProfileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No data directory configured"));
    }

    #[test]
    fn test_parse_server_url_rejects_non_http() {
        assert!(parse_server_url("ftp://example.org/fhir").is_err());
        assert!(parse_server_url("not a url").is_err());
        assert!(parse_server_url("http://localhost:8090/fhir").is_ok());
    }

    #[test]
    fn test_set_value_validates_keys() {
        let mut cfg = ProfileConfig::default();
        set_value(&mut cfg, "data_dir", "/data/synthea").unwrap();
        set_value(&mut cfg, "server", "http://localhost:8090/fhir").unwrap();
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/data/synthea")));
        assert_eq!(cfg.server.as_deref(), Some("http://localhost:8090/fhir"));

        let err = set_value(&mut cfg, "format", "json").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
        assert!(set_value(&mut cfg, "server", "nope").is_err());
    }

    #[test]
    fn test_profiles_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("loader.toml");
        assert!(load_all_from(&path).unwrap().is_empty());

        let staging = ProfileConfig {
            server: Some("http://staging/fhir".into()),
            data_dir: None,
        };
        save_profile_to(&path, "staging", &staging).unwrap();
        save_profile_to(&path, "default", &ProfileConfig::default()).unwrap();

        let all = load_all_from(&path).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("staging"), Some(&staging));
    }
}
