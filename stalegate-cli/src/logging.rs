//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现按组件的日志控制。日志写到 stderr，
//! stdout 只留给命令输出。

use stalegate_config::Target;
use std::io;
use std::path::Path;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LogConfig;
use crate::error::CliError;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 由日志配置构建过滤器
pub fn targets(log_config: &LogConfig) -> Targets {
    Target::ALL
        .iter()
        .fold(Targets::new().with_default(log_config.global), |targets, t| {
            targets.with_target(t.target(), log_config.level_for(*t))
        })
}

/// 使用指定日志配置初始化日志系统
///
/// 指定文件时同时输出到 stderr 和文件。
pub fn init_with_file(log_config: &LogConfig, file: Option<&Path>) -> Result<(), CliError> {
    let targets = targets(log_config);

    if let Some(path) = file {
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CliError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;

        let stderr_layer = create_format_layer(log_config.format, io::stderr)
            .with_filter(targets.clone());
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file_handle))
            .with_filter(targets);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        let stderr_layer = create_format_layer(log_config.format, io::stderr).with_filter(targets);
        tracing_subscriber::registry().with(stderr_layer).init();
    }
    Ok(())
}

/// Create formatter layer based on format
fn create_format_layer<S, W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_targets_apply_overrides() {
        let mut config = LogConfig::default();
        config.global = Level::WARN;
        config
            .overrides
            .insert(Target::Tracker.target(), Level::DEBUG);

        let targets = targets(&config);

        assert!(targets.would_enable("stalegate::tracker", &Level::DEBUG));
        assert!(!targets.would_enable("stalegate::store", &Level::DEBUG));
        assert!(targets.would_enable("stalegate::store", &Level::WARN));
        assert!(!targets.would_enable("some::other", &Level::INFO));
    }
}
