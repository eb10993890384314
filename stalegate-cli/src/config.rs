//! CLI 配置
//!
//! `stalegate.json` 的结构：网关配置、构建命令、模块搜索根目录和日志配置。
//! 文件不存在时全部使用默认值。

use serde::Deserialize;
use stalegate_config::{GatekeeperConfig, Target};
use stalegate_loader::CommandSpec;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::error::CliError;
use crate::logging::LogFormat;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "stalegate.json";

/// `stalegate.json` 结构
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 网关配置
    pub gatekeeper: GatekeeperConfig,
    /// 外部构建命令
    pub command: Option<CommandConfig>,
    /// 模块搜索根目录（相对于配置文件所在目录）
    pub roots: Vec<PathBuf>,
    /// 日志配置
    pub log: LogSection,
}

/// 构建命令配置
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// 可执行文件
    pub program: PathBuf,
    /// 参数模板
    #[serde(default)]
    pub args: Vec<String>,
    /// 产物扩展名
    pub artifact_extension: Option<String>,
}

impl CommandConfig {
    pub fn to_spec(&self) -> CommandSpec {
        let mut spec = CommandSpec::new(self.program.clone(), self.args.clone());
        if let Some(ext) = &self.artifact_extension {
            spec.artifact_extension = ext.clone();
        }
        spec
    }
}

/// 配置文件中的日志部分
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// 全局级别
    pub level: Option<String>,
    /// 输出格式
    pub format: Option<String>,
    /// 按组件覆盖级别，键为 `store` / `tracker` / `hooks` / `installer` / `cli`
    pub targets: HashMap<String, String>,
}

impl CliConfig {
    /// 读取配置文件
    ///
    /// 文件不存在时返回默认配置；`roots` 为空时使用配置文件所在目录。
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        // 存储按绝对路径记录快照，根目录必须是绝对路径
        let base = std::path::absolute(base).map_err(|source| CliError::Path {
            path: base.to_path_buf(),
            source,
        })?;

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str::<CliConfig>(&content).map_err(|source| CliError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            CliConfig::default()
        };

        if config.roots.is_empty() {
            config.roots.push(base);
        } else {
            config.roots = config.roots.iter().map(|r| base.join(r)).collect();
        }
        Ok(config)
    }
}

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub format: LogFormat,
    /// 按组件覆盖的级别
    pub overrides: HashMap<&'static str, Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            format: LogFormat::Compact,
            overrides: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// 由配置文件的日志部分构建
    pub fn from_section(section: &LogSection) -> Result<Self, CliError> {
        let mut config = LogConfig::default();
        if let Some(level) = &section.level {
            config.global = parse_log_level(level)?;
        }
        if let Some(format) = &section.format {
            config.format = parse_log_format(format)?;
        }
        for (name, level) in &section.targets {
            let target = Target::ALL
                .iter()
                .find(|t| t.as_str() == name)
                .ok_or_else(|| CliError::UnknownLogTarget(name.clone()))?;
            config.overrides.insert(target.target(), parse_log_level(level)?);
        }
        Ok(config)
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: Target) -> Level {
        self.overrides
            .get(target.target())
            .copied()
            .unwrap_or(self.global)
    }
}

/// Parse log level string
pub fn parse_log_level(s: &str) -> Result<Level, CliError> {
    match s.to_lowercase().as_str() {
        "silent" | "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(CliError::InvalidLogLevel(s.to_string())),
    }
}

/// Parse log format string
pub fn parse_log_format(s: &str) -> Result<LogFormat, CliError> {
    match s.to_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        _ => Err(CliError::InvalidLogFormat(s.to_string())),
    }
}
