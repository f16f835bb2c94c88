//! 分发指标记录模块
//!
//! 基于 `metrics` facade 记录触发、分发、注入相关指标；未安装 recorder 时为空操作。

use metrics::{counter, histogram};

/// Roster 条目执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// 谓词为真，效果已发起
    Ran,
    /// 谓词为假，跳过
    Skipped,
    /// 效果返回错误或 panic
    Failed,
}

impl EntryOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ran => "ran",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// 记录触发到达（无论是否被吸收）
pub fn record_trigger_received(source: &str) {
    counter!(
        "snippet_loader_triggers_received_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// 记录已被 fired 标志吸收的重复触发
pub fn record_trigger_absorbed(source: &str) {
    counter!(
        "snippet_loader_triggers_absorbed_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// 记录一次完整分发
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch;
///
/// record_dispatch("scroll", 12, 3.5);
/// ```
pub fn record_dispatch(source: &str, entries: usize, duration_ms: f64) {
    counter!(
        "snippet_loader_dispatch_total",
        "source" => source.to_string()
    )
    .increment(1);
    histogram!("snippet_loader_dispatch_entries").record(entries as f64);
    histogram!("snippet_loader_dispatch_duration_ms").record(duration_ms);
}

/// 记录单个 roster 条目结果
pub fn record_entry_outcome(entry: &str, outcome: EntryOutcome) {
    counter!(
        "snippet_loader_entries_total",
        "entry" => entry.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// 记录脚本注入
pub fn record_script_injected(placement: &str) {
    counter!(
        "snippet_loader_scripts_injected_total",
        "placement" => placement.to_string()
    )
    .increment(1);
}

/// 记录 noscript 注入
pub fn record_noscript_injected(placement: &str) {
    counter!(
        "snippet_loader_noscript_injected_total",
        "placement" => placement.to_string()
    )
    .increment(1);
}

/// 记录脚本加载失败
pub fn record_script_load_failure(src: &str) {
    counter!(
        "snippet_loader_script_load_failures_total",
        "src" => src.to_string()
    )
    .increment(1);
}
