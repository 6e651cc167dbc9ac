//! ZigZag 摆动点识别
//!
//! 规则：
//! - 局部候选：`[i-depth, i+depth]` 窗口内的最高价/最低价，并列时取最早的一根
//! - 确认：只接受当前寻找的类型，且相对上一个 pivot 的涨跌幅 >= `deviation_pct`
//! - 回溯：同类候选在上一个 pivot 的 `backstep` 根以内且更极端时替换它，否则忽略

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Pivot, PivotKind, PivotSequence};
use crate::error::{Result, SignalError};
use crate::types::{Candle, CandleSeries};

/// ZigZag 参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZigZagParams {
    /// 局部极值窗口的半宽（K线数）
    pub depth: usize,
    /// 最小反转幅度（百分比，5.0 即 5%）
    pub deviation_pct: f64,
    /// 同类 pivot 的最小间隔
    pub backstep: usize,
}

impl Default for ZigZagParams {
    fn default() -> Self {
        Self {
            depth: 12,
            deviation_pct: 5.0,
            backstep: 3,
        }
    }
}

impl ZigZagParams {
    pub fn new(depth: usize, deviation_pct: f64, backstep: usize) -> Self {
        Self {
            depth,
            deviation_pct,
            backstep,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(SignalError::InvalidParameter(
                "zigzag depth 必须 >= 1".to_string(),
            ));
        }
        if !self.deviation_pct.is_finite() || self.deviation_pct <= 0.0 {
            return Err(SignalError::InvalidParameter(format!(
                "zigzag deviation_pct 必须 > 0, 实际 {}",
                self.deviation_pct
            )));
        }
        Ok(())
    }

    /// 能识别出 pivot 的最少K线数
    pub fn min_candles(&self) -> usize {
        2 * self.depth + 1
    }
}

pub struct ZigZagDetector {
    params: ZigZagParams,
}

impl ZigZagDetector {
    pub fn new(params: ZigZagParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn detect(&self, series: &CandleSeries) -> PivotSequence {
        self.detect_candles(series.candles())
    }

    /// 单次从左到右扫描
    pub fn detect_candles(&self, candles: &[Candle]) -> PivotSequence {
        let depth = self.params.depth;
        if candles.len() < self.params.min_candles() {
            return PivotSequence::default();
        }

        let mut state = ScanState {
            params: &self.params,
            // 种子：第一根收盘价，只作参考，不输出
            reference: candles[0].c,
            seeking: None,
            pivots: Vec::new(),
        };

        for i in depth..candles.len() - depth {
            let high = is_local_extreme(candles, i, depth, PivotKind::High);
            let low = is_local_extreme(candles, i, depth, PivotKind::Low);

            // 同一根K线最多产生一次 pivot 事件，先测当前寻找的类型
            let order = match state.seeking {
                Some(PivotKind::Low) => [PivotKind::Low, PivotKind::High],
                _ => [PivotKind::High, PivotKind::Low],
            };
            for kind in order {
                let is_candidate = match kind {
                    PivotKind::High => high,
                    PivotKind::Low => low,
                };
                if is_candidate && state.offer(&candles[i], i, kind) {
                    break;
                }
            }
        }

        debug!(
            "zigzag 完成: candles={}, depth={}, deviation={}%, backstep={}, pivots={}",
            candles.len(),
            depth,
            self.params.deviation_pct,
            self.params.backstep,
            state.pivots.len()
        );
        PivotSequence::from_detector(state.pivots)
    }
}

struct ScanState<'a> {
    params: &'a ZigZagParams,
    reference: f64,
    seeking: Option<PivotKind>,
    pivots: Vec<Pivot>,
}

impl ScanState<'_> {
    /// 处理一个候选，返回是否产生了 pivot 事件（新增或替换）
    fn offer(&mut self, candle: &Candle, index: usize, kind: PivotKind) -> bool {
        let price = match kind {
            PivotKind::High => candle.h,
            PivotKind::Low => candle.l,
        };

        if let Some(last) = self.pivots.last_mut() {
            if last.kind == kind {
                // 同类：回溯窗口内更极端则替换，否则忽略
                if index - last.index <= self.params.backstep
                    && kind.more_extreme(price, last.price)
                {
                    last.index = index;
                    last.ts = candle.ts;
                    last.price = price;
                    self.reference = price;
                    return true;
                }
                return false;
            }
        }

        if self.reference <= 0.0 {
            return false;
        }
        let move_pct = match kind {
            PivotKind::High => (price - self.reference) / self.reference * 100.0,
            PivotKind::Low => (self.reference - price) / self.reference * 100.0,
        };
        if move_pct < self.params.deviation_pct {
            return false;
        }

        self.pivots.push(Pivot {
            index,
            ts: candle.ts,
            price,
            kind,
        });
        self.reference = price;
        self.seeking = Some(kind.opposite());
        true
    }
}

/// 窗口内极值，并列取最早：左侧严格更优，右侧不劣于
fn is_local_extreme(candles: &[Candle], i: usize, depth: usize, kind: PivotKind) -> bool {
    let value = |c: &Candle| match kind {
        PivotKind::High => c.h,
        PivotKind::Low => c.l,
    };
    let current = value(&candles[i]);
    let left_ok = candles[i - depth..i]
        .iter()
        .all(|c| kind.more_extreme(current, value(c)));
    let right_ok = candles[i + 1..=i + depth]
        .iter()
        .all(|c| !kind.more_extreme(value(c), current));
    left_ok && right_ok
}
