use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "redis_addr_default")]
    pub redis_addr: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_addr: redis_addr_default(),
            log_level: log_level_default(),
        }
    }
}

impl Config {
    fn get_config_dir() -> anyhow::Result<path::PathBuf> {
        let config_dir = if let Ok(xdg_path) = env::var("XDG_CONFIG_HOME") {
            path::PathBuf::from(&xdg_path)
        } else {
            path::Path::new(&env::var("HOME").unwrap()).join(".config")
        };

        let dir = config_dir.join("pagefetch");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        Ok(dir)
    }

    pub fn from_path() -> anyhow::Result<Self> {
        let file_path = if let Ok(cfg_path) = env::var("PAGEFETCH_CFG_PATH") {
            path::PathBuf::from(cfg_path)
        } else {
            Self::get_config_dir()
                .with_context(|| "fail to open config directory")?
                .join("config.toml")
        };

        if !file_path.exists() {
            anyhow::bail!("Config file not found in {file_path:?}");
        }
        let content = fs::read_to_string(file_path).with_context(|| "fail to read config file")?;

        toml::from_str(&content).with_context(|| "fail to parse config from toml")
    }
}

fn redis_addr_default() -> String {
    "redis://localhost:6379".to_string()
}

fn log_level_default() -> String {
    "INFO".to_string()
}

#[test]
fn validate_file_correctness() {
    let config = r#"
        redis_addr = "redis://localhost"
        log_level = "DEBUG"
    "#;
    let path = env::temp_dir().join("pagefetch-test-config.toml");
    fs::write(&path, config).unwrap();
    std::env::set_var("PAGEFETCH_CFG_PATH", &path);

    let config = Config::from_path().unwrap();
    assert_eq!(config.redis_addr, "redis://localhost");
    assert_eq!(config.log_level, "DEBUG");

    fs::remove_file(path).unwrap();
}

#[test]
fn validate_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.redis_addr, "redis://localhost:6379");
    assert_eq!(config.log_level, "INFO");
}
