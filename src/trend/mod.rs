//! 趋势判定

pub mod classifier;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use classifier::{MomentumSnapshot, TrendClassifier};

use crate::error::{Result, SignalError};
use crate::indicators::MACD_STANDARD;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    StrongBullish,
    Bullish,
    StrongBearish,
    Bearish,
    Sideways,
    Undetermined,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendLabel::StrongBullish => "strong_bullish",
            TrendLabel::Bullish => "bullish",
            TrendLabel::StrongBearish => "strong_bearish",
            TrendLabel::Bearish => "bearish",
            TrendLabel::Sideways => "sideways",
            TrendLabel::Undetermined => "undetermined",
        };
        write!(f, "{}", s)
    }
}

/// 判定依据
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendReason {
    /// 最近 `stale_after` 根K线内没有新的 pivot
    Stale,
    /// 高点或低点不足两个
    InsufficientPivots,
    HigherHighsHigherLows,
    LowerHighsLowerLows,
    /// 高低点方向互相矛盾
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRationale {
    pub reason: TrendReason,
    /// H[-1] 与 H[-2] 比较：Some(true) 更高，Some(false) 更低，相等或不足为 None
    pub higher_highs: Option<bool>,
    pub higher_lows: Option<bool>,
    pub bars_since_last_pivot: Option<usize>,
    /// 动能（MACD 柱 + 长期均线）确认；未评估时为 None
    pub momentum_confirmed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendVerdict {
    pub label: TrendLabel,
    pub rationale: TrendRationale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// 超过这么多根K线没有新 pivot 视为横盘
    pub stale_after: usize,
    /// 强趋势确认用的 EMA 周期
    pub long_ema: usize,
    /// 强趋势确认用的 MACD 名称（取柱状图）
    pub momentum_macd: String,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            stale_after: 50,
            long_ema: 100,
            momentum_macd: MACD_STANDARD.to_string(),
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stale_after == 0 {
            return Err(SignalError::InvalidParameter(
                "trend stale_after 必须 >= 1".to_string(),
            ));
        }
        if self.long_ema == 0 {
            return Err(SignalError::InvalidParameter(
                "trend long_ema 必须 >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
