//! 配置文件读写（config.yml）。
//!
//! 默认配置带字段注释写出；用户文件与默认值合并，缺字段时回写补全。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

const CONFIG_FILE: &str = "config.yml";

const FIELDS: &[FieldMeta] = &[
    FieldMeta {
        name: "save_dir",
        description: "下载输出目录（每个系列在其下建立独立文件夹）",
    },
    FieldMeta {
        name: "request_timeout_secs",
        description: "HTTP 请求超时（秒）",
    },
    FieldMeta {
        name: "user_agent",
        description: "HTTP 请求 User-Agent",
    },
    FieldMeta {
        name: "download_retries",
        description: "单集下载的最大尝试次数",
    },
    FieldMeta {
        name: "retry_pause_secs",
        description: "下载重试之间的等待时间（秒）",
    },
    FieldMeta {
        name: "probe_cache_ttl_secs",
        description: "基址探测结果的缓存时间（秒）",
    },
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub save_dir: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub download_retries: u32,
    pub retry_pause_secs: u64,
    pub probe_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: ".".to_string(),
            request_timeout_secs: 15,
            // 与站点播放页一致的移动端 UA，部分 CDN 会校验。
            user_agent: "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Mobile Safari/537.36".to_string(),
            download_retries: 3,
            retry_pause_secs: 2,
            probe_cache_ttl_secs: 600,
        }
    }
}

impl Config {
    pub fn save_dir(&self) -> PathBuf {
        PathBuf::from(&self.save_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_secs(self.retry_pause_secs)
    }

    pub fn probe_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.probe_cache_ttl_secs.max(1))
    }
}

pub fn load_or_create(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    if !path.exists() {
        let default_config = Config::default();
        write_with_comments(&default_config, &path)?;
        return Ok(default_config);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let user_yaml: Value = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    let mut merged = serde_yaml::to_value(Config::default())
        .map_err(|err| ConfigError::Validation(err.to_string()))?;
    let rewrite = has_missing_fields(&user_yaml);
    merge_values(&mut merged, user_yaml);

    let config: Config =
        serde_yaml::from_value(merged).map_err(|err| ConfigError::Validation(err.to_string()))?;

    if rewrite {
        write_with_comments(&config, &path)?;
    }

    Ok(config)
}

pub fn write_with_comments(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let value =
        serde_yaml::to_value(config).map_err(|err| ConfigError::Validation(err.to_string()))?;
    let Value::Mapping(mapping) = value else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut lines = Vec::new();
    for field in FIELDS {
        if !field.description.is_empty() {
            lines.push(format!("# {}", field.description));
        }
        let key = Value::String(field.name.to_string());
        let val = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let yaml_line = serde_yaml::to_string(&serde_yaml::Mapping::from_iter([(key, val)]))
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        lines.push(yaml_line.trim().to_string());
    }
    lines.push(String::new());

    fs::write(path, lines.join("\n")).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn has_missing_fields(user_yaml: &Value) -> bool {
    let Value::Mapping(map) = user_yaml else {
        return true;
    };
    FIELDS
        .iter()
        .any(|field| !map.contains_key(Value::String(field.name.to_string())))
}

fn merge_values(default: &mut Value, user: Value) {
    match (default, user) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, user_val) in src {
                if let Some(dest_val) = dest.get_mut(&key) {
                    merge_values(dest_val, user_val);
                } else {
                    dest.insert(key, user_val);
                }
            }
        }
        (dest, other) => {
            *dest = other;
        }
    }
}
