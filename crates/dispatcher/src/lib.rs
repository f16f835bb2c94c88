//! # Dispatcher
//!
//! 延迟分发模块。
//!
//! 负责：
//! - 注册交互监听与兜底定时器（可经空闲回调延后）
//! - 首个触发源通过 CAS 赢得分发，其余触发被吸收
//! - 撤销全部监听与定时器后按固定顺序遍历 roster
//! - 隔离单个条目的错误与 panic，不影响后续条目

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod state;

pub use contracts::{ActionEntry, Roster, TriggerKind, TriggerSource};
pub use dispatcher::{DeferredDispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, DispatchSnapshot};
pub use registry::TriggerRegistration;
pub use report::{DispatchReport, FailedEntry};
pub use state::Phase;
