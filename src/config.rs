//! 定义了时间轮的几何常量与可配置参数。
//! Defines the geometry constants and configurable parameters of the timer wheel.

use crate::error::{Result, TimerError};

/// Number of address bits one wheel level consumes from a tick value.
/// 一层时间轮从 tick 值中消耗的地址位数。
pub const SLOT_BITS: u32 = 8;

/// Number of slots in each wheel level (one ring).
/// 每层时间轮（一个环）的槽位数量。
pub const SLOTS_PER_LEVEL: usize = 1 << SLOT_BITS;

/// Mask extracting a slot index from a tick value.
/// 从 tick 值中提取槽位索引的掩码。
pub(crate) const SLOT_MASK: u64 = (SLOTS_PER_LEVEL as u64) - 1;

/// The minimum supported number of levels.
/// 支持的最小层数。
pub const MIN_DEPTH: usize = 5;

/// The maximum supported number of levels. `256^8 = 2^64` exhausts the tick space.
/// 支持的最大层数。`256^8 = 2^64` 用尽整个 tick 空间。
pub const MAX_DEPTH: usize = 8;

/// A structure containing all configurable parameters for a timer wheel.
///
/// 包含时间轮所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct WheelConfig {
    /// Number of hierarchical levels. Level `L` covers `256^L` ticks per slot,
    /// so the schedulable horizon is `256^depth - 1` ticks.
    /// 分层层数。第 `L` 层每个槽位覆盖 `256^L` 个 tick，
    /// 可调度视界为 `256^depth - 1` 个 tick。
    pub depth: usize,

    /// The tick value the wheel's clock starts at.
    /// 时间轮时钟的起始 tick 值。
    pub start_tick: u64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            depth: MIN_DEPTH,
            start_tick: 0,
        }
    }
}

impl WheelConfig {
    /// Start building a configuration.
    /// 开始构建配置。
    pub fn builder() -> WheelConfigBuilder {
        WheelConfigBuilder::default()
    }

    /// The maximum schedulable delay: `256^depth - 1` ticks.
    /// 最大可调度延迟：`256^depth - 1` 个 tick。
    pub fn horizon(&self) -> u64 {
        if self.depth >= MAX_DEPTH {
            u64::MAX
        } else {
            (1u64 << (SLOT_BITS * self.depth as u32)) - 1
        }
    }
}

/// Builder for [`WheelConfig`]. `build()` validates the geometry.
///
/// [`WheelConfig`] 的构建器。`build()` 负责校验几何参数。
#[derive(Debug, Default)]
pub struct WheelConfigBuilder {
    depth: Option<usize>,
    start_tick: Option<u64>,
}

impl WheelConfigBuilder {
    /// Set the number of levels, valid in `5..=8`.
    /// 设置层数，合法范围 `5..=8`。
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Set the initial clock value.
    /// 设置时钟初始值。
    pub fn start_tick(mut self, start_tick: u64) -> Self {
        self.start_tick = Some(start_tick);
        self
    }

    /// Validate and build the configuration.
    /// 校验并构建配置。
    pub fn build(self) -> Result<WheelConfig> {
        let depth = self.depth.unwrap_or(MIN_DEPTH);
        if depth < MIN_DEPTH {
            return Err(TimerError::InvalidDepth {
                depth,
                reason: "a wheel needs at least 5 levels",
            });
        }
        if depth > MAX_DEPTH {
            return Err(TimerError::InvalidDepth {
                depth,
                reason: "more than 8 levels exceeds the 64-bit tick space",
            });
        }
        Ok(WheelConfig {
            depth,
            start_tick: self.start_tick.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_five_levels_from_zero() {
        let config = WheelConfig::default();
        assert_eq!(config.depth, MIN_DEPTH);
        assert_eq!(config.start_tick, 0);
        assert_eq!(config.horizon(), (1u64 << 40) - 1);
    }

    #[test]
    fn builder_rejects_shallow_and_oversized_wheels() {
        assert!(matches!(
            WheelConfig::builder().depth(4).build(),
            Err(TimerError::InvalidDepth { depth: 4, .. })
        ));
        assert!(matches!(
            WheelConfig::builder().depth(9).build(),
            Err(TimerError::InvalidDepth { depth: 9, .. })
        ));
    }

    #[test]
    fn full_depth_covers_the_whole_tick_space() {
        let config = match WheelConfig::builder().depth(MAX_DEPTH).build() {
            Ok(config) => config,
            Err(err) => panic!("depth 8 should validate: {err}"),
        };
        assert_eq!(config.horizon(), u64::MAX);
    }
}
