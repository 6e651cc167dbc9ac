use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SignalError>;

/// 信号引擎错误
#[derive(Error, Debug)]
pub enum SignalError {
    /// K线数据不合法（OHLC 约束或时间戳顺序被破坏）
    #[error(transparent)]
    InvalidCandle(#[from] InvalidCandleError),

    /// 参数错误
    #[error("参数错误: {0}")]
    InvalidParameter(String),

    /// ta 指标构造失败
    #[error("指标错误: {0}")]
    Indicator(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 单根K线违反的约束
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CandleViolation {
    /// high < max(open, close, low)
    HighBelowBody,
    /// low > min(open, close, high)
    LowAboveBody,
    /// 价格或成交量不是有限数
    NonFinite,
    /// 成交量或最低价为负
    Negative,
    /// 时间戳没有严格递增
    NonIncreasingTimestamp { prev_ts: i64, ts: i64 },
    /// 构造时缺少字段
    Incomplete,
}

impl fmt::Display for CandleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandleViolation::HighBelowBody => write!(f, "high 低于 open/close/low"),
            CandleViolation::LowAboveBody => write!(f, "low 高于 open/close/high"),
            CandleViolation::NonFinite => write!(f, "存在非有限数值"),
            CandleViolation::Negative => write!(f, "low 或 volume 为负数"),
            CandleViolation::NonIncreasingTimestamp { prev_ts, ts } => {
                write!(f, "时间戳未严格递增: {} -> {}", prev_ts, ts)
            }
            CandleViolation::Incomplete => write!(f, "K线字段不完整"),
        }
    }
}

/// 非法K线，构造 `CandleSeries` 时快速失败
#[derive(Error, Debug, Clone, PartialEq)]
#[error("K线非法 (index={index}): {violation}")]
pub struct InvalidCandleError {
    pub index: usize,
    pub violation: CandleViolation,
}

impl InvalidCandleError {
    pub fn new(index: usize, violation: CandleViolation) -> Self {
        Self { index, violation }
    }
}

/// 把 ta 的构造错误转换为 SignalError
pub fn ta_err(what: &str, err: ta::errors::TaError) -> SignalError {
    SignalError::Indicator(format!("{}: {:?}", what, err))
}
