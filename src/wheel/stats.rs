//! 时间轮统计信息
//! Timer wheel statistics

/// 时间轮统计信息快照。诊断用途。
/// A snapshot of timer wheel statistics. For diagnostics.
#[derive(Debug, Clone)]
pub struct WheelStats {
    /// 层数
    /// Number of levels
    pub depth: usize,
    /// 总槽位数
    /// Total number of slots
    pub total_slots: usize,
    /// 含有效事件的槽位数
    /// Number of slots holding live events
    pub occupied_slots: usize,
    /// 有效的已调度事件数
    /// Number of live scheduled events
    pub scheduled_events: usize,
    /// 等待清扫的陈旧条目数
    /// Number of stale entries awaiting sweep
    pub stale_entries: usize,
    /// 单个槽位内最多的有效事件数
    /// Largest number of live events in any one slot
    pub max_slot_depth: usize,
    /// 当前 tick
    /// Current tick
    pub current_tick: u64,
}

impl std::fmt::Display for WheelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WheelStats {{ slots: {}/{}, events: {}, stale: {}, max_slot: {}, tick: {} }}",
            self.occupied_slots,
            self.total_slots,
            self.scheduled_events,
            self.stale_entries,
            self.max_slot_depth,
            self.current_tick
        )
    }
}
