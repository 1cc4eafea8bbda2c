use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REMOTE_KEY: &str = "quiz_config";
pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Where and how the remote-config document holding the quiz is fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    /// Parameter whose string value carries the quiz JSON.
    pub key: String,
    /// Transport-level timeout on the HTTP client.
    pub timeout: Duration,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: DEFAULT_REMOTE_KEY.into(),
            timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    /// `None` disables the remote source so the local quiz is always used.
    pub remote: Option<RemoteConfig>,
    /// `None` serves the quiz bundled into the binary.
    pub fallback_path: Option<PathBuf>,
    pub db_url: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            remote: None,
            fallback_path: None,
            db_url: DEFAULT_DB_URL.into(),
        }
    }
}

impl QuizConfig {
    /// Read `QUIZ_*` variables from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable lookup. Blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let remote = var("QUIZ_REMOTE_URL").map(|url| {
            let mut remote = RemoteConfig::new(url);
            if let Some(key) = var("QUIZ_REMOTE_KEY") {
                remote.key = key;
            }
            if let Some(secs) = var("QUIZ_REMOTE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
                remote.timeout = Duration::from_secs(secs);
            }
            remote
        });

        Self {
            remote,
            fallback_path: var("QUIZ_FALLBACK_PATH").map(PathBuf::from),
            db_url: var("QUIZ_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into()),
        }
    }
}
