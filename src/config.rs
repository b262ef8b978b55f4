use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LATENCY_MS: u64 = 300;
const COMMENT_LATENCY_MS: u64 = 500;

/// Runtime settings, read from the environment at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    /// Simulated latency for video accessors.
    pub latency: Duration,
    /// Simulated latency for comment fetch and post.
    pub comment_latency: Duration,
    pub autoplay: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            comment_latency: Duration::from_millis(COMMENT_LATENCY_MS),
            autoplay: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = std::env::var_os("SHORTFEED_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(ms) = std::env::var("SHORTFEED_LATENCY_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.latency = Duration::from_millis(ms);
            config.comment_latency = Duration::from_millis(ms);
        }

        config.autoplay = std::env::var("SHORTFEED_AUTOPLAY")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME") {
        return Some(PathBuf::from(dir).join("shortfeed"));
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join("Library/Application Support/ShortFeed"));
        }
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return Some(PathBuf::from(home).join(".local/share/shortfeed"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn defaults_match_mock_latencies() {
        let config = AppConfig::default();
        assert_eq!(config.latency, Duration::from_millis(300));
        assert_eq!(config.comment_latency, Duration::from_millis(500));
        assert!(!config.autoplay);
    }
}
