use std::collections::VecDeque;

use ta::indicators::{Maximum, Minimum};
use ta::{Next, Reset};

use crate::error::{ta_err, Result};
use crate::types::{Candle, IndicatorSeries};

/// 中轨：`window` 根K线最高价与最低价的中点，整体前移 `shift` 根（一目均衡表 Span B 的算法）
#[derive(Debug, Clone)]
pub struct MidChannelIndicator {
    window: usize,
    shift: usize,
    max: Maximum,
    min: Minimum,
    seen: usize,
    /// 尚未到期输出的中点（长度 <= shift）
    pending: VecDeque<Option<f64>>,
}

impl MidChannelIndicator {
    pub fn new(window: usize, shift: usize) -> Result<Self> {
        Ok(Self {
            window,
            shift,
            max: Maximum::new(window).map_err(|e| ta_err("MidChannel max", e))?,
            min: Minimum::new(window).map_err(|e| ta_err("MidChannel min", e))?,
            seen: 0,
            pending: VecDeque::with_capacity(shift + 1),
        })
    }
}

impl Next<&Candle> for MidChannelIndicator {
    type Output = Option<f64>;

    /// 返回当前K线位置上（已前移）的中轨值
    fn next(&mut self, candle: &Candle) -> Option<f64> {
        let highest = self.max.next(candle);
        let lowest = self.min.next(candle);
        self.seen += 1;
        let mid = if self.seen >= self.window {
            Some((highest + lowest) / 2.0)
        } else {
            None
        };

        self.pending.push_back(mid);
        if self.pending.len() > self.shift {
            self.pending.pop_front().flatten()
        } else {
            None
        }
    }
}

impl Reset for MidChannelIndicator {
    fn reset(&mut self) {
        self.max.reset();
        self.min.reset();
        self.seen = 0;
        self.pending.clear();
    }
}

pub fn mid_channel_series(
    candles: &[Candle],
    window: usize,
    shift: usize,
) -> Result<IndicatorSeries> {
    let mut indicator = MidChannelIndicator::new(window, shift)?;
    let values = candles.iter().map(|c| indicator.next(c)).collect();
    Ok(IndicatorSeries::new(
        format!("mid_channel{}_{}", window, shift),
        values,
    ))
}
