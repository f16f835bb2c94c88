//! # Page Sim
//!
//! 内存页面宿主，实现 `HostEnvironment` 的全部能力。
//!
//! 负责：
//! - 文档树 (head / body / footer) 与 HTML 渲染
//! - 事件监听表与同步事件投递
//! - 基于 tokio 的定时器与空闲回调（测试中配合暂停时钟使用虚拟时间）
//! - 脚本加载模拟（成功 / 失败）
//! - window 全局命名空间

mod dom;
mod page;

pub use dom::{Document, Node};
pub use page::{LoadOutcome, LoadRecord, PageOptions, ScriptInfo, SimulatedPage};

use std::time::Duration;

/// Let every task woken at the current instant run to completion
///
/// Used after advancing a paused clock so timer and idle tasks scheduled for
/// that instant have executed before assertions run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Advance virtual time by `duration`, then settle
pub async fn run_for(duration: Duration) {
    tokio::time::sleep(duration).await;
    settle().await;
}
