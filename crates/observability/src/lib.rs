//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus recorder 安装与渲染
//! - 分发 / 注入指标记录
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, ObservabilityConfig};
//!
//! let handle = init_with_config(ObservabilityConfig::default())?;
//! // ... dispatch ...
//! if let Some(handle) = handle {
//!     println!("{}", handle.render());
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_dispatch, record_entry_outcome, record_noscript_injected, record_script_injected,
    record_script_load_failure, record_trigger_absorbed, record_trigger_received, EntryOutcome,
};

/// 初始化可观测性（Tracing，不安装指标 recorder）
///
/// - Tracing: Pretty 格式，支持 RUST_LOG 环境变量
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default()).map(|_| ())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 是否安装 Prometheus recorder
    pub install_metrics: bool,
    /// 默认日志级别
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            install_metrics: false,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 使用自定义配置初始化
///
/// 返回 Prometheus handle（仅当 `install_metrics` 为 true）。
pub fn init_with_config(config: ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    // 1. Initialize Tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 2. Install Prometheus recorder (if enabled)
    let handle = if config.install_metrics {
        Some(init_metrics_only()?)
    } else {
        None
    };

    tracing::info!(
        log_format = ?config.log_format,
        metrics = config.install_metrics,
        "Observability initialized"
    );

    Ok(handle)
}

/// 仅安装 Prometheus recorder（不初始化 Tracing）
///
/// 用于 Tracing 已由其他模块初始化的场景。返回的 handle 可随时渲染文本格式指标。
pub fn init_metrics_only() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    tracing::debug!("Prometheus recorder installed");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(!config.install_metrics);
        assert_eq!(config.default_log_level, "info");
        assert!(matches!(config.log_format, LogFormat::Pretty));
    }
}
