use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiTheme {
    #[default]
    Classic,
    Cyberpunk,
    NeonNoir,
    SolarFlare,
    ForestZen,
}

impl UiTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Cyberpunk => "cyberpunk",
            Self::NeonNoir => "neon-noir",
            Self::SolarFlare => "solar-flare",
            Self::ForestZen => "forest-zen",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Classic => Self::Cyberpunk,
            Self::Cyberpunk => Self::NeonNoir,
            Self::NeonNoir => Self::SolarFlare,
            Self::SolarFlare => Self::ForestZen,
            Self::ForestZen => Self::Classic,
        }
    }
}

impl FromStr for UiTheme {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "cyberpunk" => Ok(Self::Cyberpunk),
            "neon-noir" | "neonnoir" => Ok(Self::NeonNoir),
            "solar-flare" | "solarflare" => Ok(Self::SolarFlare),
            "forest-zen" | "forestzen" => Ok(Self::ForestZen),
            other => Err(ConfigError::UnknownTheme(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown theme `{0}` (expected classic, cyberpunk, neon-noir, solar-flare or forest-zen)")]
    UnknownTheme(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: UiTheme,
    pub auto_scroll: bool,
    pub min_visible_messages: usize,
    pub log_tail: usize,
    pub show_commands: bool,
    pub show_parameters: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: UiTheme::Classic,
            auto_scroll: true,
            min_visible_messages: 3,
            log_tail: 200,
            show_commands: true,
            show_parameters: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `TERN_LOG` is unset.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tern").join("config.toml"))
    }

    pub fn log_file(&self) -> PathBuf {
        self.logging.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("tern")
                .join("tern.log")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, Config::default());
        assert!(config.ui.auto_scroll);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[ui]\ntheme = \"neon-noir\"\nmin_visible_messages = 5\n\n[logging]\nlevel = \"debug\""
        )
        .expect("write");

        let config = Config::load(file.path()).expect("load");
        assert_eq!(config.ui.theme, UiTheme::NeonNoir);
        assert_eq!(config.ui.min_visible_messages, 5);
        assert_eq!(config.ui.log_tail, 200);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn malformed_file_is_reported_with_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[ui\ntheme = ").expect("write");

        let err = Config::load(file.path()).expect_err("parse error");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn theme_names_parse_and_cycle() {
        assert_eq!("Solar-Flare".parse::<UiTheme>().ok(), Some(UiTheme::SolarFlare));
        assert_eq!("forestzen".parse::<UiTheme>().ok(), Some(UiTheme::ForestZen));
        assert!("mauve".parse::<UiTheme>().is_err());

        let mut theme = UiTheme::Classic;
        for _ in 0..5 {
            theme = theme.next();
        }
        assert_eq!(theme, UiTheme::Classic);
    }
}
