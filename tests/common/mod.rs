//! 集成测试的共享辅助工具。
//! Shared helpers for the integration tests.

use kestrel_wheel::TimerEvent;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Once;

/// Helper to initialize tracing for tests.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("trace")
            .with_test_writer()
            .init();
    });
}

/// 一个统计自身触发次数的事件。放进 `Rc` 以便回调能捕获克隆来交叉调度。
/// An event that counts its own firings. Wrapped in an `Rc` so callbacks can
/// capture clones for cross-scheduling.
pub fn counting_event() -> (Rc<TimerEvent>, Rc<Cell<u64>>) {
    let count = Rc::new(Cell::new(0));
    let event = TimerEvent::new({
        let count = Rc::clone(&count);
        move |_| count.set(count.get() + 1)
    });
    (Rc::new(event), count)
}
