#![deny(clippy::expect_used, clippy::unwrap_used)]

//! # Hierarchical Timer Wheel
//!
//! A hierarchical timer wheel for one-shot events on an abstract tick clock.
//! The host drives the clock; the wheel places each event on the level that
//! matches the magnitude of its delay and cascades it toward level 0 as time
//! sweeps past, so scheduling, cancellation, and expiry all stay O(1)
//! amortized across deadlines spanning many orders of magnitude.
//!
//! # 分层时间轮
//!
//! 面向抽象 tick 时钟上一次性事件的分层时间轮。宿主驱动时钟前进；时间轮按
//! 延迟的数量级把事件放到对应层级，并在时钟扫过时逐层级联到第 0 层，使得
//! 调度、取消与到期在跨越多个数量级的延迟上均为摊还 O(1)。
//!
//! ## Features (特性)
//!
//! - **Abstract ticks**: no wall clock, no I/O — the host supplies time.
//!   （抽象 tick：不涉及墙钟与 I/O，时间由宿主提供。）
//! - **Caller-owned events**: an event handle can be cancelled, dropped, or
//!   rescheduled at any point, including from inside callbacks.
//!   （事件由调用方持有：句柄可随时取消、丢弃或重新调度，回调内亦然。）
//! - **Single-threaded**: callbacks run inline during [`TimerWheel::advance`];
//!   sharing across threads requires external serialization.
//!   （单线程：回调在 [`TimerWheel::advance`] 内同步执行；跨线程共享需外部串行化。）
//!
//! ## Quick start (快速开始)
//!
//! ```
//! use kestrel_wheel::{TimerEvent, TimerWheel};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut wheel = TimerWheel::new();
//! let fired = Rc::new(Cell::new(false));
//! let event = TimerEvent::new({
//!     let fired = Rc::clone(&fired);
//!     move |_| fired.set(true)
//! });
//!
//! wheel.schedule(&event, 5);
//! assert_eq!(wheel.ticks_to_next_event(100), 5);
//!
//! wheel.advance(5);
//! assert!(fired.get());
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod wheel;

pub use config::WheelConfig;
pub use error::{Result, TimerError};
pub use event::TimerEvent;
pub use wheel::{TimerContext, TimerWheel, WheelStats};
