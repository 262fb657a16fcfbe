use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::error::Result;

/// Runtime configuration, overlaid from a flat `key=value` file.
///
/// Unknown keys are ignored; missing keys keep their defaults; a missing
/// file means the defaults are used as-is.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_ip: String,
    pub server_port: u16,
    pub thread_num: usize,
    pub queue_size: usize,

    pub data_dir: PathBuf,
    pub en_stopwords_file: PathBuf,
    pub cn_stopwords_file: PathBuf,

    pub max_edit_distance: usize,
    pub default_recommend_k: usize,
    pub default_search_top_n: usize,
    pub max_summary_length: usize,
    pub simhash_top_k: usize,
    pub simhash_threshold: u32,

    pub recommend_cache_size: usize,
    pub edit_distance_cache_size: usize,
    pub search_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_ip: "0.0.0.0".to_string(),
            server_port: 8080,
            thread_num: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            queue_size: 100,

            data_dir: PathBuf::from("data"),
            en_stopwords_file: PathBuf::from("corpus/stopwords/en_stopwords.txt"),
            cn_stopwords_file: PathBuf::from("corpus/stopwords/cn_stopwords.txt"),

            max_edit_distance: 3,
            default_recommend_k: 10,
            default_search_top_n: 5,
            max_summary_length: 200,
            simhash_top_k: 10_000,
            simhash_threshold: 3,

            recommend_cache_size: 500,
            edit_distance_cache_size: 2000,
            search_cache_size: 200,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist. Malformed lines are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Config::default();

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                info!(path = %path.display(), "config file not found, using defaults");
                return Ok(config);
            }
        };

        let mut applied = 0usize;
        for (line_number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!(line = line_number + 1, "malformed config line: {}", line);
                continue;
            };

            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                warn!(line = line_number + 1, "empty key in config line: {}", line);
                continue;
            }

            if config.apply(key, value) {
                applied += 1;
            }
        }

        info!(path = %path.display(), applied, "config loaded");
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> bool {
        fn parse<T: std::str::FromStr>(key: &str, value: &str, slot: &mut T) -> bool {
            match value.parse() {
                Ok(parsed) => {
                    *slot = parsed;
                    true
                }
                Err(_) => {
                    warn!(key, value, "unparsable config value, keeping default");
                    false
                }
            }
        }

        match key {
            "server_ip" => {
                self.server_ip = value.to_string();
                true
            }
            "server_port" => parse(key, value, &mut self.server_port),
            "thread_num" => parse(key, value, &mut self.thread_num),
            "queue_size" => parse(key, value, &mut self.queue_size),
            "data_dir" => {
                self.data_dir = PathBuf::from(value);
                true
            }
            "en_stopwords_file" => {
                self.en_stopwords_file = PathBuf::from(value);
                true
            }
            "cn_stopwords_file" => {
                self.cn_stopwords_file = PathBuf::from(value);
                true
            }
            "max_edit_distance" => parse(key, value, &mut self.max_edit_distance),
            "default_recommend_k" => parse(key, value, &mut self.default_recommend_k),
            "default_search_top_n" => parse(key, value, &mut self.default_search_top_n),
            "max_summary_length" => parse(key, value, &mut self.max_summary_length),
            "simhash_top_k" => parse(key, value, &mut self.simhash_top_k),
            "simhash_threshold" => parse(key, value, &mut self.simhash_threshold),
            "recommend_cache_size" => parse(key, value, &mut self.recommend_cache_size),
            "edit_distance_cache_size" => parse(key, value, &mut self.edit_distance_cache_size),
            "search_cache_size" => parse(key, value, &mut self.search_cache_size),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_file_missing() {
        let config = Config::load(Path::new("/nonexistent/search.conf")).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.default_recommend_k, 10);
        assert_eq!(config.max_edit_distance, 3);
    }

    #[test]
    fn overlay_and_skip_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "server_port = 9001").unwrap();
        writeln!(file, "this line has no equals sign").unwrap();
        writeln!(file, "max_summary_length=120").unwrap();
        writeln!(file, "unknown_key=42").unwrap();
        file.flush().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server_port, 9001);
        assert_eq!(config.max_summary_length, 120);
        // untouched keys keep defaults
        assert_eq!(config.queue_size, 100);
    }

    #[test]
    fn bad_value_keeps_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server_port = not-a-number").unwrap();
        file.flush().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server_port, 8080);
    }
}
