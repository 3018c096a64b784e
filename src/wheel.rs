//! 时间轮模块
//! Timer Wheel Module
//!
//! 该模块实现了分层时间轮：固定宽度的多层槽位环、把事件从粗层搬向细层的
//! 级联算法、到期事件的派发协议以及"距下一事件还有多久"的查询。
//!
//! This module implements the hierarchical timer wheel: the fixed-width
//! multi-level slot rings, the cascade algorithm moving events from coarser
//! to finer levels, the dispatch protocol for expired events, and the
//! "ticks until the next event" query.

pub mod core;
pub mod stats;

mod slot;


pub use self::core::{TimerContext, TimerWheel};
pub use self::stats::WheelStats;
