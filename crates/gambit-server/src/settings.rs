//! Server configuration from environment variables.

use std::path::PathBuf;

use gambit_media::MediaConfig;

/// Everything the binary needs to start, with local-dev defaults so
/// `cargo run` works out of the box.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Directory for the file-backed store.
    pub data_dir: PathBuf,
    /// Media vendor connection settings.
    pub media: MediaConfig,
    /// Vendor preset applied to every video join credential.
    pub video_preset: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl ServerSettings {
    /// Reads settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: var_or("GAMBIT_BIND_ADDR", "127.0.0.1:8080"),
            data_dir: PathBuf::from(var_or("GAMBIT_DATA_DIR", "./data")),
            media: MediaConfig {
                base_url: var_or(
                    "GAMBIT_MEDIA_URL",
                    "http://127.0.0.1:9090/v2",
                ),
                api_key: var_or("GAMBIT_MEDIA_API_KEY", "dev-key"),
                app_id: var_or("GAMBIT_MEDIA_APP_ID", "dev-app"),
            },
            video_preset: var_or("GAMBIT_VIDEO_PRESET", "group_call"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        // Env vars are process-global, so only assert on keys this
        // test suite never sets.
        let settings = ServerSettings::from_env();
        assert!(!settings.bind_addr.is_empty());
        assert!(!settings.video_preset.is_empty());
    }
}
