//! 节奏控制 - 业务能力层
//!
//! 在两次远程调用之间插入随机等待，避免触发风控。等待是顺序阻塞的，不做并发。

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::info;

use crate::config::{Config, MAX_WAIT_SECS};

/// 随机等待区间 `[min, max]`（秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingController {
    min_secs: f64,
    max_secs: f64,
}

impl PacingController {
    /// 区间会被规整为 `0 <= min <= max <= MAX_WAIT_SECS`，NaN 按 0 处理
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let min_secs = clamp_secs(min_secs);
        let max_secs = clamp_secs(max_secs).max(min_secs);
        Self { min_secs, max_secs }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.wait_time_min, config.wait_time_max)
    }

    /// 不等待（测试用）
    pub fn immediate() -> Self {
        Self::new(0.0, 0.0)
    }

    /// 在区间内均匀抽取一次等待时长
    pub fn next_delay(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rand::thread_rng().gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// 抽取并等待，返回实际等待时长
    pub async fn pause(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            info!("等待 {:.1} 秒后继续...", delay.as_secs_f64());
            sleep(delay).await;
        }
        delay
    }
}

fn clamp_secs(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_WAIT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_interval() {
        let pacing = PacingController::new(15.0, 20.0);
        for _ in 0..200 {
            let secs = pacing.next_delay().as_secs_f64();
            assert!((15.0..=20.0).contains(&secs), "{} out of range", secs);
        }
    }

    #[test]
    fn test_degenerate_interval() {
        assert_eq!(PacingController::new(3.0, 3.0).next_delay(), Duration::from_secs(3));
        // 上限小于下限时按下限处理
        assert_eq!(PacingController::new(5.0, 1.0).next_delay(), Duration::from_secs(5));
        assert_eq!(PacingController::new(-2.0, 0.0).next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_out_of_range_interval_is_clamped() {
        let max = Duration::from_secs_f64(MAX_WAIT_SECS);
        assert_eq!(PacingController::new(f64::INFINITY, f64::INFINITY).next_delay(), max);
        assert_eq!(PacingController::new(1e20, 1e20).next_delay(), max);
        assert!(PacingController::new(0.0, f64::INFINITY).next_delay() <= max);
        assert_eq!(PacingController::new(f64::NAN, f64::NAN).next_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_immediate_pause() {
        assert_eq!(PacingController::immediate().pause().await, Duration::ZERO);
    }
}
