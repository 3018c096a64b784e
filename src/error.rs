//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the timer wheel library.
/// 时间轮库的主要错误类型。
///
/// Only configuration can fail. Scheduling and advancing treat violated
/// preconditions as programmer errors and panic instead.
/// 只有配置会失败。调度与推进把违反前置条件视为编程错误，直接 panic。
#[derive(Debug, Error)]
pub enum TimerError {
    /// The requested number of wheel levels cannot be honored.
    /// 请求的时间轮层数无法满足。
    #[error("invalid wheel depth {depth}: {reason}")]
    InvalidDepth {
        /// The rejected depth.
        /// 被拒绝的层数。
        depth: usize,
        /// Why it was rejected.
        /// 拒绝的原因。
        reason: &'static str,
    },
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, TimerError>;
