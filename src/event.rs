//! 定时器事件定义
//! Timer Event Definitions
//!
//! 该模块定义了由调用方持有的定时器事件句柄及其与时间轮共享的核心状态。
//!
//! This module defines the caller-owned timer event handle and the core state
//! it shares with the wheel.

use crate::wheel::TimerContext;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// 定时器回调的类型别名
/// Type alias for timer callbacks
pub type TimerCallback = Box<dyn FnMut(&mut TimerContext<'_>)>;

/// 事件的共享核心。句柄与时间轮槽位通过它同步调度状态。
/// Shared core of an event. The owner handle and wheel slots synchronize the
/// scheduling state through it.
pub(crate) struct EventCore {
    /// 处于调度状态时的绝对到期 tick
    /// Absolute expiry tick while scheduled
    deadline: Cell<Option<u64>>,
    /// 每次调度或取消时递增；槽位条目凭它判断自身是否仍然有效
    /// Bumped on every schedule or cancel; slot entries use it to tell
    /// whether they are still live
    generation: Cell<u64>,
    /// 到期时调用的回调
    /// Callback invoked on expiry
    callback: RefCell<TimerCallback>,
}

impl EventCore {
    fn new(callback: TimerCallback) -> Rc<Self> {
        Rc::new(Self {
            deadline: Cell::new(None),
            generation: Cell::new(0),
            callback: RefCell::new(callback),
        })
    }

    pub(crate) fn deadline(&self) -> Option<u64> {
        self.deadline.get()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// 进入调度状态并返回新的代数。旧的槽位条目自此失效。
    /// Enter the scheduled state and return the new generation. Any older
    /// slot entry goes stale from here on.
    pub(crate) fn set_scheduled(&self, deadline: u64) -> u64 {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        self.deadline.set(Some(deadline));
        generation
    }

    /// 离开调度状态。未调度时为空操作。
    /// Leave the scheduled state. A no-op while inactive.
    pub(crate) fn clear_scheduled(&self) -> bool {
        if self.deadline.take().is_some() {
            self.generation.set(self.generation.get().wrapping_add(1));
            true
        } else {
            false
        }
    }

    /// 调用回调。调度状态必须已在此之前清除。
    /// Invoke the callback. The scheduled state must have been cleared first.
    pub(crate) fn invoke(&self, ctx: &mut TimerContext<'_>) {
        let mut callback = self.callback.borrow_mut();
        (*callback)(ctx);
    }
}

/// 一次性定时器事件。由调用方持有；任一时刻至多挂在一个时间轮槽位上。
/// A one-shot timer event. Owned by the caller; linked to at most one wheel
/// slot at any moment.
///
/// 事件创建后处于未调度状态。经 [`TimerWheel::schedule`] 进入调度状态，在
/// 到期派发、[`cancel`](TimerEvent::cancel) 或句柄被丢弃时回到未调度状态。
/// 需要在回调里调度其他事件时，把句柄放进 `Rc` 再让回调捕获克隆即可。
/// An event starts inactive. It becomes scheduled through
/// [`TimerWheel::schedule`] and returns to inactive when dispatched,
/// [`cancel`](TimerEvent::cancel)led, or dropped. To schedule an event from
/// another event's callback, wrap the handle in an `Rc` and capture a clone.
///
/// [`TimerWheel::schedule`]: crate::wheel::TimerWheel::schedule
pub struct TimerEvent {
    core: Rc<EventCore>,
}

impl TimerEvent {
    /// 用任意可调用对象创建事件。
    /// Create an event carrying a general callable.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&mut TimerContext<'_>) + 'static,
    {
        Self {
            core: EventCore::new(Box::new(callback)),
        }
    }

    /// 创建绑定到接收者对象某个固定操作的事件。
    /// Create an event bound to a fixed operation of a receiver object.
    ///
    /// 事件只持有接收者的弱引用：接收者销毁后该操作不再被调用。把事件作为
    /// 接收者的成员存放，接收者的销毁就顺带取消了事件。
    /// The event holds only a weak reference to the receiver: once the
    /// receiver is gone the action is no longer invoked. Store the event
    /// inside the receiver and the receiver's destruction cancels it.
    pub fn with_receiver<R>(
        receiver: &Rc<RefCell<R>>,
        action: fn(&mut R, &mut TimerContext<'_>),
    ) -> Self
    where
        R: 'static,
    {
        let receiver = Rc::downgrade(receiver);
        Self::new(move |ctx| {
            if let Some(target) = receiver.upgrade() {
                let mut target = target.borrow_mut();
                action(&mut target, ctx);
            }
        })
    }

    /// 当前是否处于调度状态。
    /// Whether the event is currently scheduled.
    pub fn active(&self) -> bool {
        self.core.deadline().is_some()
    }

    /// 处于调度状态时的绝对到期 tick。
    /// The absolute expiry tick while scheduled.
    pub fn scheduled_at(&self) -> Option<u64> {
        self.core.deadline()
    }

    /// 取消事件。未调度时为空操作；可重复调用。
    /// Cancel the event. A no-op while inactive; may be called repeatedly.
    ///
    /// 取消立即生效：被取消的事件一定不会触发。正在执行自身回调的事件已被
    /// 时间轮摘下，此时调用只是空操作。
    /// Cancellation is immediate: a cancelled event never fires. An event
    /// running its own callback has already been unlinked by the wheel, so
    /// calling this from there is a no-op.
    pub fn cancel(&self) {
        if let Some(deadline) = self.core.deadline() {
            self.core.clear_scheduled();
            trace!(deadline, "timer event cancelled");
        }
    }

    pub(crate) fn core(&self) -> &Rc<EventCore> {
        &self.core
    }
}

impl Drop for TimerEvent {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEvent")
            .field("scheduled_at", &self.core.deadline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_event_is_inactive() {
        let event = TimerEvent::new(|_| {});
        assert!(!event.active());
        assert_eq!(event.scheduled_at(), None);
    }

    #[test]
    fn cancel_is_a_no_op_while_inactive() {
        let event = TimerEvent::new(|_| {});
        event.cancel();
        event.cancel();
        assert!(!event.active());
    }

    #[test]
    fn state_transitions_advance_the_generation() {
        let event = TimerEvent::new(|_| {});
        let core = event.core();
        let first = core.set_scheduled(10);
        assert_eq!(core.deadline(), Some(10));
        assert!(core.clear_scheduled());
        let second = core.set_scheduled(20);
        assert_ne!(first, second, "a stale entry must never match again");
        assert!(core.clear_scheduled());
        assert_eq!(core.deadline(), None);
    }
}
