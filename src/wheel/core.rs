//! 时间轮核心实现
//! Timer wheel core implementation

use crate::config::{WheelConfig, SLOTS_PER_LEVEL, SLOT_BITS, SLOT_MASK};
use crate::event::{EventCore, TimerEvent};
use crate::wheel::slot::{Slot, SlotEntry};
use crate::wheel::stats::WheelStats;
use std::rc::Rc;
use tracing::{debug, trace};

/// 分层时间轮。
/// Hierarchical timer wheel.
///
/// 时钟只认抽象 tick，由宿主通过 [`advance`](TimerWheel::advance) 驱动前进。
/// 事件按延迟的数量级放入相应层级：第 0 层每槽位 1 个 tick，第 `L` 层每槽位
/// `256^L` 个 tick。时钟扫进某个粗层槽位时，槽内事件被级联到更细的层，直到
/// 在第 0 层到期派发。一个事件从插入到派发至多被触碰 `depth` 次。
/// The clock knows only abstract ticks, driven by the host through
/// [`advance`](TimerWheel::advance). Events land on the level matching the
/// magnitude of their delay: level 0 holds one tick per slot, level `L` holds
/// `256^L`. When the clock sweeps into a coarser slot its events are cascaded
/// to finer levels until they expire out of level 0. An event is touched at
/// most `depth` times between insert and dispatch.
///
/// 时间轮不是线程安全的；跨线程共享需要外部串行化。
/// The wheel is not thread-safe; sharing it across threads requires external
/// serialization.
#[derive(Debug)]
pub struct TimerWheel {
    /// 当前绝对 tick，单调不减
    /// Current absolute tick, monotonically non-decreasing
    now: u64,
    /// 最大可调度延迟（`256^depth - 1`）
    /// Maximum schedulable delay (`256^depth - 1`)
    horizon: u64,
    /// 每层一个 256 槽位的环
    /// One 256-slot ring per level
    levels: Vec<Vec<Slot>>,
}

impl TimerWheel {
    /// 以默认配置创建时间轮（5 层，起始 tick 为 0）。
    /// Create a wheel with the default configuration (5 levels, starting at
    /// tick 0).
    pub fn new() -> Self {
        Self::with_config(WheelConfig::default())
    }

    /// 以校验过的配置创建时间轮。
    /// Create a wheel from a validated configuration.
    pub fn with_config(config: WheelConfig) -> Self {
        let mut levels = Vec::with_capacity(config.depth);
        for _ in 0..config.depth {
            let mut slots = Vec::with_capacity(SLOTS_PER_LEVEL);
            slots.resize_with(SLOTS_PER_LEVEL, Slot::default);
            levels.push(slots);
        }
        Self {
            now: config.start_tick,
            horizon: config.horizon(),
            levels,
        }
    }

    /// 当前绝对 tick。
    /// The current absolute tick.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// 层数。
    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// 最大可调度延迟。
    /// Maximum schedulable delay.
    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// 以相对延迟调度事件，事件将于 `now() + delay` 派发。
    /// Schedule an event with a relative delay; it fires at `now() + delay`.
    ///
    /// 仍处于调度状态的事件被先行取消：一个事件至多按最后一次调度触发一次。
    /// A still-scheduled event is cancelled first: an event fires at most
    /// once, per its latest schedule.
    ///
    /// # Panics
    ///
    /// `delay` 为 0 或超出 [`horizon`](TimerWheel::horizon) 时 panic——这是
    /// 调用方的契约错误而非可恢复状况。要"下一次推进就触发"，用延迟 1。
    /// Panics when `delay` is 0 or beyond [`horizon`](TimerWheel::horizon) —
    /// a caller contract violation, not a recoverable condition. For "on the
    /// next advance", use delay 1.
    pub fn schedule(&mut self, event: &TimerEvent, delay: u64) {
        self.schedule_core(event.core(), delay);
    }

    pub(crate) fn schedule_core(&mut self, core: &Rc<EventCore>, delay: u64) {
        assert!(delay >= 1, "schedule: delay must be at least one tick");
        assert!(
            delay <= self.horizon,
            "schedule: delay {delay} is beyond the wheel horizon {}",
            self.horizon
        );
        let deadline = self.now + delay;
        // 进入新代数即隐式取消之前的调度
        // Entering a new generation implicitly cancels any previous schedule
        let generation = core.set_scheduled(deadline);
        self.insert(core, generation, deadline);
    }

    /// 将事件调度到 `[now + min_delay, now + max_delay]` 内的某个 tick。
    /// Schedule an event for some tick within
    /// `[now + min_delay, now + max_delay]`.
    ///
    /// 到期 tick 取窗口内最粗的槽位边界，让短视界的请求聚拢到同一个槽位；
    /// 事件已调度在窗口内时不做任何事。
    /// The expiry tick is the coarsest slot boundary inside the window, so
    /// short-horizon requests coalesce into a shared slot; nothing happens
    /// when the event is already scheduled inside the window.
    ///
    /// # Panics
    ///
    /// 要求 `1 <= min_delay <= max_delay <= horizon()`。
    /// Requires `1 <= min_delay <= max_delay <= horizon()`.
    pub fn schedule_in_range(&mut self, event: &TimerEvent, min_delay: u64, max_delay: u64) {
        assert!(
            min_delay >= 1,
            "schedule_in_range: min_delay must be at least one tick"
        );
        assert!(min_delay <= max_delay, "schedule_in_range: empty window");
        assert!(
            max_delay <= self.horizon,
            "schedule_in_range: max_delay {max_delay} is beyond the wheel horizon {}",
            self.horizon
        );

        if let Some(at) = event.scheduled_at() {
            let current = at - self.now;
            if current >= min_delay && current <= max_delay {
                trace!(deadline = at, "event already scheduled inside the window");
                return;
            }
        }

        let earliest = self.now + min_delay;
        let latest = self.now + max_delay;
        let mut deadline = latest;
        // 逐层尝试更粗的槽位边界，越出窗口起点即停
        // Try coarser slot boundaries level by level, stopping once one falls
        // before the window
        for level in 1..self.levels.len() {
            let span_bits = SLOT_BITS * level as u32;
            let candidate = (latest >> span_bits) << span_bits;
            if candidate < earliest {
                break;
            }
            deadline = candidate;
        }
        self.schedule_core(event.core(), deadline - self.now);
    }

    /// 将时钟前进 `ticks` 个 tick，逐 tick 派发所有到期事件。
    /// Advance the clock by `ticks`, dispatching every expired event tick by
    /// tick.
    ///
    /// 每个 tick 内：时钟先前进（回调里看到的 [`now`](TimerWheel::now) 即事件
    /// 所属的 tick）；第 0 层回绕时，回绕各粗层的当前槽位自深向浅级联；随后
    /// 第 0 层当前槽位被整体取走、依序派发。槽内按插入顺序（FIFO）派发，本
    /// tick 级联进来的事件排在槽内原有事件之后。
    /// Within each tick: the clock moves first (callbacks observe
    /// [`now`](TimerWheel::now) as the tick they belong to); when level 0
    /// wraps, the current slot of every wrapped coarser level cascades,
    /// deepest first; then the level-0 current slot is stolen and dispatched
    /// in order. Dispatch within a slot is FIFO by insertion; events promoted
    /// during this tick run after events already resident in the slot.
    ///
    /// 回调内可以调度新事件、取消其他事件（包括本批尚未派发的）或重新调度
    /// 自身；在回调内再调用 `advance` 是契约错误。回调的 panic 原样向外传播：
    /// 当前事件已被摘下，本批剩余事件不再派发，时间轮保持一致。
    /// Callbacks may schedule new events, cancel other events (including ones
    /// still pending in this batch), or reschedule themselves; re-entering
    /// `advance` from a callback is a contract violation. A panicking
    /// callback propagates: the firing event is already unlinked, the rest of
    /// the batch goes undispatched, and the wheel stays consistent.
    ///
    /// # Panics
    ///
    /// 单次调用的 `ticks` 不得超过 [`horizon`](TimerWheel::horizon)；更大的
    /// 跳跃请分段推进。
    /// `ticks` may not exceed [`horizon`](TimerWheel::horizon) per call;
    /// split larger jumps.
    pub fn advance(&mut self, ticks: u64) {
        assert!(
            ticks <= self.horizon,
            "advance: {ticks} ticks exceeds the wheel horizon {}",
            self.horizon
        );
        let mut dispatched = 0usize;
        for _ in 0..ticks {
            self.now += 1;
            if self.now & SLOT_MASK == 0 {
                self.cascade_wrapped();
            }
            dispatched += self.dispatch_current();
        }
        if dispatched > 0 {
            debug!(ticks, now = self.now, dispatched, "advance dispatched expired timers");
        }
    }

    /// 距下一个事件触发还有多少 tick，以 `max` 封顶。
    /// Ticks until the next event fires, capped at `max`.
    ///
    /// 没有事件或最近的事件在 `max` 之外时返回 `max`；`max` 为 0 时无条件
    /// 返回 0。自细向粗逐层从当前位置向前扫描：每层第一个含有效事件的槽位
    /// 给出该层的最小到期，答案取跨层最小值——粗层上可能挂着比细层更近的
    /// 到期（还没级联下来），所以不能在细层首个命中就返回。某层最近可表示
    /// 的到期已不早于当前界限时整层跳过，槽位起点越过界限时该层停扫，因此
    /// 总开销与已调度事件数无关，至多 `depth × 256` 个槽位。
    /// Returns `max` when nothing is due within it; `max = 0` returns 0
    /// unconditionally. Scans each level forward from its current position,
    /// finest first: the first slot with a live event bounds that level's
    /// minimum, and the answer is the minimum across levels — a coarser level
    /// may hold a nearer deadline than a finer one (not yet cascaded down),
    /// so returning on the first fine-level hit would be wrong. A level whose
    /// nearest representable expiry already reaches the bound is skipped
    /// whole, and a level stops once slot base offsets pass the bound, so the
    /// cost is independent of the number of scheduled events: at most
    /// `depth × 256` slots.
    pub fn ticks_to_next_event(&self, max: u64) -> u64 {
        let mut best = max;
        for (level, slots) in self.levels.iter().enumerate() {
            let span_bits = SLOT_BITS * level as u32;
            let span = 1u64 << span_bits;
            let into_slot = self.now & (span - 1);
            // 该层最近的可表示到期从下一槽位边界开始；到达界限后更粗的层只会更远
            // The nearest expiry this level can hold starts at the next slot
            // boundary; once that reaches the bound, coarser levels are
            // farther still
            if span - into_slot >= best {
                break;
            }
            let position = ((self.now >> span_bits) & SLOT_MASK) as usize;
            for step in 1..=SLOTS_PER_LEVEL {
                let reach = (step as u64).saturating_mul(span) - into_slot;
                if reach > best {
                    break;
                }
                let slot = (position + step) & (SLOTS_PER_LEVEL - 1);
                if let Some(deadline) = slots[slot].earliest_deadline() {
                    best = best.min(deadline - self.now);
                    break;
                }
            }
        }
        best
    }

    /// 取消所有已调度事件并清空全部槽位。
    /// Cancel every scheduled event and empty all slots.
    pub fn clear(&mut self) {
        let mut cancelled = 0usize;
        for level in &mut self.levels {
            for slot in level {
                for entry in slot.steal() {
                    if let Some((core, _)) = entry.resolve() {
                        core.clear_scheduled();
                        cancelled += 1;
                    }
                }
            }
        }
        if cancelled > 0 {
            debug!(cancelled, "cleared scheduled timer events");
        }
    }

    /// 统计信息快照。诊断用的全量扫描。
    /// Statistics snapshot. A full diagnostic scan.
    pub fn stats(&self) -> WheelStats {
        let mut occupied_slots = 0;
        let mut scheduled_events = 0;
        let mut stale_entries = 0;
        let mut max_slot_depth = 0;
        for level in &self.levels {
            for slot in level {
                let (live, stale) = slot.census();
                if live > 0 {
                    occupied_slots += 1;
                    max_slot_depth = max_slot_depth.max(live);
                }
                scheduled_events += live;
                stale_entries += stale;
            }
        }
        WheelStats {
            depth: self.levels.len(),
            total_slots: self.levels.len() * SLOTS_PER_LEVEL,
            occupied_slots,
            scheduled_events,
            stale_entries,
            max_slot_depth,
            current_tick: self.now,
        }
    }

    /// 按绝对到期 tick 插入条目。级联重插走同一条路径，允许 `deadline == now`
    /// （落进本 tick 正要派发的槽位）。
    /// Insert an entry by absolute expiry tick. Cascade re-insertion takes
    /// the same path and may see `deadline == now` (landing in the slot being
    /// dispatched this tick).
    fn insert(&mut self, core: &Rc<EventCore>, generation: u64, deadline: u64) {
        let delay = deadline - self.now;
        let level = self.level_for(delay);
        let slot = ((deadline >> (SLOT_BITS * level as u32)) & SLOT_MASK) as usize;
        self.levels[level][slot].push(SlotEntry::new(Rc::downgrade(core), generation));
        trace!(deadline, level, slot, "timer event inserted");
    }

    /// 能唯一解析该延迟的最细层级：最小的 `L` 满足 `delay < 256^(L+1)`。
    /// The finest level resolving the delay: the smallest `L` with
    /// `delay < 256^(L+1)`.
    fn level_for(&self, delay: u64) -> usize {
        let mut level = 0;
        let mut magnitude = delay >> SLOT_BITS;
        while magnitude != 0 && level + 1 < self.levels.len() {
            magnitude >>= SLOT_BITS;
            level += 1;
        }
        level
    }

    /// 本 tick 回绕的所有粗层自深向浅级联各自的当前槽位。
    /// Cascade the current slot of every coarser level that wrapped this
    /// tick, deepest first.
    fn cascade_wrapped(&mut self) {
        let mut top = 1;
        while top + 1 < self.levels.len()
            && self.now & ((1u64 << (SLOT_BITS * (top as u32 + 1))) - 1) == 0
        {
            top += 1;
        }
        for level in (1..=top).rev() {
            self.cascade_level(level);
        }
    }

    /// 级联：取走该层当前槽位，按剩余延迟把仍然有效的事件重插到更细的层。
    /// Cascade: steal the level's current slot and re-insert each live event
    /// at a finer level by its remaining delay.
    fn cascade_level(&mut self, level: usize) {
        let slot = ((self.now >> (SLOT_BITS * level as u32)) & SLOT_MASK) as usize;
        if self.levels[level][slot].is_empty() {
            return;
        }
        let stolen = self.levels[level][slot].steal();
        let mut promoted = 0usize;
        for entry in &stolen {
            let Some((core, deadline)) = entry.resolve() else {
                continue;
            };
            debug_assert!(deadline >= self.now, "cascaded event is overdue");
            debug_assert!(
                deadline - self.now < 1u64 << (SLOT_BITS * level as u32),
                "cascaded event does not fit below level {level}"
            );
            self.insert(&core, entry.generation(), deadline);
            promoted += 1;
        }
        if promoted > 0 {
            trace!(level, slot, promoted, "promoted timer events to finer levels");
        }
    }

    /// 派发第 0 层当前槽位。槽位先被整体取走再执行回调，回调期间的取消与
    /// 重调度因此不会干扰本批遍历。
    /// Dispatch the level-0 current slot. The slot is stolen before any
    /// callback runs, so cancellation and rescheduling during callbacks
    /// cannot disturb the walk.
    fn dispatch_current(&mut self) -> usize {
        let slot = (self.now & SLOT_MASK) as usize;
        if self.levels[0][slot].is_empty() {
            return 0;
        }
        let stolen = self.levels[0][slot].steal();
        let mut dispatched = 0usize;
        for entry in &stolen {
            let Some((core, deadline)) = entry.resolve() else {
                continue;
            };
            debug_assert_eq!(deadline, self.now, "dispatching event outside its tick");
            // 先摘下再执行：回调里的重新调度会落到未来的槽位
            // Unlink before running: a reschedule from the callback lands in
            // a future slot
            core.clear_scheduled();
            trace!(deadline, "dispatching timer event");
            let mut ctx = TimerContext {
                wheel: self,
                core: &core,
            };
            core.invoke(&mut ctx);
            dispatched += 1;
        }
        dispatched
    }
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerWheel {
    /// 析构时取消所有仍在轮上的事件。
    /// Teardown cancels every event still on the wheel.
    fn drop(&mut self) {
        self.clear();
    }
}

/// 正在派发的事件的回调上下文。
/// Callback context for the event being dispatched.
///
/// 借出时间轮本身（调度新事件、读取时钟），并允许重新调度当前事件。
/// Lends out the wheel itself (to schedule new events or read the clock) and
/// allows rescheduling the firing event.
pub struct TimerContext<'a> {
    wheel: &'a mut TimerWheel,
    core: &'a Rc<EventCore>,
}

impl TimerContext<'_> {
    /// 时间轮。
    /// The wheel.
    pub fn wheel(&mut self) -> &mut TimerWheel {
        self.wheel
    }

    /// 当前 tick，即本事件所属的 tick。
    /// The current tick — the tick this event belongs to.
    pub fn now(&self) -> u64 {
        self.wheel.now
    }

    /// 重新调度正在触发的事件，`delay` 个 tick 后再次派发。
    /// Reschedule the firing event to be dispatched again `delay` ticks from
    /// now.
    ///
    /// # Panics
    ///
    /// 延迟契约同 [`TimerWheel::schedule`]。
    /// Same delay contract as [`TimerWheel::schedule`].
    pub fn reschedule(&mut self, delay: u64) {
        self.wheel.schedule_core(self.core, delay);
    }
}
