use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

pub const DEFAULT_API_BASE_URL: &str = "https://datalearnai.up.railway.app";
pub const DEFAULT_CODE: &str = "import pandas as pd\n";

/// Output pane height bounds, in terminal rows.
pub const MIN_OUTPUT_HEIGHT: u16 = 5;
pub const MAX_OUTPUT_HEIGHT: u16 = 25;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    overrides: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    /// Load defaults, then the rc file at `config_path`, then the environment.
    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read .codepadrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    if let Some((k, v)) = parse_line(&line) {
                        map.insert(k, v);
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, overrides: HashMap::new(), config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overrides.get(key) {
            return Some(v.clone());
        }
        // ENV next
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Override a value in memory; wins over env and rc file (used for CLI flags).
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.overrides.insert(key.to_string(), value.into());
    }

    pub fn api_base_url(&self) -> String {
        let url = self
            .get("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if url == "default" || url.trim().is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            url.trim_end_matches('/').to_string()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn state_path(&self) -> PathBuf {
        self.get("STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join("state"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.get("LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("codepad").join("codepad.log"))
    }

    pub fn default_code(&self) -> String {
        self.get("DEFAULT_CODE")
            .map(|s| s.replace("\\n", "\n"))
            .unwrap_or_else(|| DEFAULT_CODE.to_string())
    }

    pub fn output_height(&self) -> u16 {
        self.get_u64("OUTPUT_HEIGHT")
            .map(|h| h.min(u16::MAX as u64) as u16)
            .unwrap_or(10)
            .clamp(MIN_OUTPUT_HEIGHT, MAX_OUTPUT_HEIGHT)
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "API_BASE_URL",
        "REQUEST_TIMEOUT",
        "STATE_PATH",
        "LOG_PATH",
        "DEFAULT_CODE",
        "OUTPUT_HEIGHT",
    ];

    KEYS.contains(&k) || k.starts_with("CODEPAD_")
}

fn config_dir() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("codepad")
}

fn default_config_path() -> PathBuf {
    config_dir().join(".codepadrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("API_BASE_URL".into(), "default".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("OUTPUT_HEIGHT".into(), "10".into());
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_line_skips_comments_and_blanks() {
        assert_eq!(parse_line("# comment"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("no_equals"), None);
        assert_eq!(
            parse_line(" OUTPUT_HEIGHT = 12 "),
            Some(("OUTPUT_HEIGHT".to_string(), "12".to_string()))
        );
    }

    #[test]
    fn test_rc_file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".codepadrc");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "# codepad").unwrap();
        writeln!(f, "CODEPAD_TEST_ONLY_KEY=from-file").unwrap();
        writeln!(f, "REQUEST_TIMEOUT=7").unwrap();
        drop(f);

        let cfg = Config::load_from(path);
        assert_eq!(cfg.get("CODEPAD_TEST_ONLY_KEY").as_deref(), Some("from-file"));
        if env::var("REQUEST_TIMEOUT").is_err() {
            assert_eq!(cfg.request_timeout(), Duration::from_secs(7));
        }
    }

    #[test]
    fn test_base_url_default_and_trailing_slash() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.codepadrc"));
        cfg.set("API_BASE_URL", "default");
        assert_eq!(cfg.api_base_url(), DEFAULT_API_BASE_URL);
        cfg.set("API_BASE_URL", "http://127.0.0.1:8000/");
        assert_eq!(cfg.api_base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_output_height_is_clamped() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.codepadrc"));
        cfg.set("OUTPUT_HEIGHT", "1");
        assert_eq!(cfg.output_height(), MIN_OUTPUT_HEIGHT);
        cfg.set("OUTPUT_HEIGHT", "400");
        assert_eq!(cfg.output_height(), MAX_OUTPUT_HEIGHT);
    }
}
