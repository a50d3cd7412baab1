use crate::GiziCareError;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_DETECTOR_URL: &str = "http://localhost:5001";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub detector_url: String,
    /// Where the session token and detection hand-off are kept.
    pub state_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, GiziCareError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, GiziCareError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api_url = get("GIZICARE_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        let detector_url = get("GIZICARE_DETECTOR_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DETECTOR_URL.into());
        for (name, url) in [("GIZICARE_API_URL", &api_url), ("GIZICARE_DETECTOR_URL", &detector_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GiziCareError::Config(format!(
                    "{name} must be an http(s) URL, got {url}"
                )));
            }
        }
        let state_dir = match get("GIZICARE_STATE_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => get("HOME")
                .map(|home| PathBuf::from(home).join(".gizicare"))
                .unwrap_or_else(|| PathBuf::from(".gizicare")),
        };
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            detector_url: detector_url.trim_end_matches('/').to_string(),
            state_dir,
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }

    pub fn handoff_path(&self) -> PathBuf {
        self.state_dir.join("detected_foods.json")
    }
}
