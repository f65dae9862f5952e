//! 配置源
//!
//! 运行时核心配置与声明清单的加载，按文件扩展名选择 TOML 或 JSON 解析

use crate::builder::LoggingConfig;
use di_abstractions::{ContainerSpec, DeclarationManifest};
use infrastructure_common::{ConfigError, ConfigResult, SessionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 根据文件扩展名判断格式
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// 运行时核心配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// 日志设置
    #[serde(default)]
    pub logging: LoggingSettings,
    /// 全局容器布局
    #[serde(default)]
    pub global: Option<ContainerLayout>,
    /// 会话容器布局（按创建顺序）
    #[serde(default)]
    pub sessions: Vec<SessionLayout>,
}

impl CoreConfig {
    /// 生成容器构造描述，全局容器在前
    pub fn container_specs(&self) -> Vec<ContainerSpec> {
        let global = self
            .global
            .iter()
            .map(|layout| ContainerSpec::global().request_all(layout.services.iter().map(String::as_str)));

        let sessions = self.sessions.iter().map(|layout| {
            ContainerSpec::session(SessionId::new(&layout.id))
                .request_all(layout.services.iter().map(String::as_str))
        });

        global.chain(sessions).collect()
    }
}

/// 日志设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 是否由运行时核心初始化日志
    pub enabled: bool,
    /// 日志级别，未设置时使用 `RUST_LOG`
    pub level: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingSettings {
    /// 转换为日志配置
    pub fn to_logging_config(&self) -> ConfigResult<LoggingConfig> {
        let mut config = LoggingConfig {
            show_target: self.show_target,
            show_thread_ids: self.show_thread_ids,
            show_file: self.show_file,
            show_line_number: self.show_line_number,
            json_format: self.json_format,
            ..LoggingConfig::default()
        };

        match &self.level {
            Some(level) => {
                config.level = tracing::Level::from_str(level).map_err(|e| ConfigError::InvalidValue {
                    key: "logging.level".to_string(),
                    message: e.to_string(),
                })?;
                config.prefer_env_filter = false;
            }
            None => config.prefer_env_filter = true,
        }

        Ok(config)
    }
}

/// 容器布局
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLayout {
    /// 请求的服务名称
    #[serde(default)]
    pub services: Vec<String>,
}

/// 会话容器布局
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLayout {
    /// 会话标识
    pub id: String,
    /// 请求的服务名称
    #[serde(default)]
    pub services: Vec<String>,
}

/// 按格式解析配置文本
pub fn parse_document<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        }),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        }),
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let format = ConfigFormat::from_path(path)?;
    debug!("读取配置文件: {} ({:?})", path.display(), format);
    let content = std::fs::read_to_string(path)?;
    parse_document(&content, format)
}

/// 加载运行时核心配置
pub fn load_core_config<P: AsRef<Path>>(path: P) -> ConfigResult<CoreConfig> {
    let path = path.as_ref();
    let config: CoreConfig = load_document(path)?;
    info!(
        "加载核心配置: {}, 会话容器 {} 个",
        path.display(),
        config.sessions.len()
    );
    Ok(config)
}

/// 加载声明清单
pub fn load_manifest<P: AsRef<Path>>(path: P) -> ConfigResult<DeclarationManifest> {
    let path = path.as_ref();
    let manifest: DeclarationManifest = load_document(path)?;
    info!("加载声明清单: {}, 服务 {} 个", path.display(), manifest.services.len());
    Ok(manifest)
}
