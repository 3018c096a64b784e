//! `ticks_to_next_event` 查询与范围调度。
//! The `ticks_to_next_event` query and range scheduling.

mod common;

use common::{counting_event, init_tracing};
use kestrel_wheel::TimerWheel;

#[test]
fn empty_wheel_reports_the_cap() {
    init_tracing();
    let wheel = TimerWheel::new();
    assert_eq!(wheel.ticks_to_next_event(100), 100);
    assert_eq!(wheel.ticks_to_next_event(0), 0);
}

#[test]
fn finds_deadlines_across_levels_and_positions() {
    let mut wheel = TimerWheel::new();
    let (event, _count) = counting_event();
    let (near_event, _near_count) = counting_event();

    // 同一组检查从多个轮位置各跑一遍
    // Run the same checks from a range of wheel positions
    for _ in 0..10 {
        wheel.schedule(&event, 1);
        assert_eq!(wheel.ticks_to_next_event(100), 1);

        wheel.schedule(&event, 20);
        assert_eq!(wheel.ticks_to_next_event(100), 20);

        // 上限压过更远的到期
        // The cap wins over a farther deadline
        wheel.schedule(&event, 150);
        assert_eq!(wheel.ticks_to_next_event(100), 100);

        // 上一层的到期也能被精确找到
        // A deadline one level up is found exactly
        wheel.schedule(&event, 280);
        assert_eq!(wheel.ticks_to_next_event(100), 100);
        assert_eq!(wheel.ticks_to_next_event(1000), 280);

        // 内层更早的到期遮蔽外层的
        // An earlier deadline on the inner wheel shadows the outer one
        for near in 1..256u64 {
            wheel.schedule(&near_event, near);
            assert_eq!(wheel.ticks_to_next_event(1000), near);
        }

        event.cancel();
        near_event.cancel();
        wheel.advance(32);
    }
}

#[test]
fn the_nearer_of_two_wheels_wins() {
    let mut wheel = TimerWheel::new();
    let (slow, _slow_count) = counting_event();
    let (fast, _fast_count) = counting_event();

    for _ in 0..20 {
        // 第 1 层的到期隔着半圈依然可见
        // A level-1 deadline stays visible through a partial rotation
        wheel.schedule(&slow, 270);
        wheel.advance(128);
        assert_eq!(wheel.ticks_to_next_event(512), 270 - 128);

        wheel.schedule(&fast, 250);
        assert_eq!(wheel.ticks_to_next_event(512), 270 - 128);

        wheel.schedule(&fast, 10);
        assert_eq!(wheel.ticks_to_next_event(512), 10);

        slow.cancel();
        fast.cancel();
        wheel.advance(32);
    }
}

#[test]
fn range_scheduling_fires_inside_the_window() {
    let mut wheel = TimerWheel::new();
    let (event, count) = counting_event();

    wheel.schedule_in_range(&event, 5, 10);
    assert!(matches!(event.scheduled_at(), Some(at) if (5..=10).contains(&at)));

    wheel.advance(4);
    assert_eq!(count.get(), 0);
    wheel.advance(6);
    assert_eq!(count.get(), 1);
}

#[test]
fn range_scheduling_keeps_an_in_window_deadline() {
    let mut wheel = TimerWheel::new();
    let (event, _count) = counting_event();
    wheel.schedule(&event, 7);
    wheel.schedule_in_range(&event, 5, 10);
    assert_eq!(event.scheduled_at(), Some(7));
}

#[test]
fn range_scheduling_coalesces_on_coarse_boundaries() {
    let mut wheel = TimerWheel::new();
    let (first, _first_count) = counting_event();
    let (second, _second_count) = counting_event();
    wheel.advance(300);

    // 两个窗口都含 tick 512，即其中的第 1 层槽位边界
    // Both windows contain tick 512, the level-1 slot boundary inside them
    wheel.schedule_in_range(&first, 100, 300);
    wheel.schedule_in_range(&second, 150, 280);
    assert_eq!(first.scheduled_at(), Some(512));
    assert_eq!(second.scheduled_at(), Some(512));
}
