use ta::indicators::{FastStochastic, SimpleMovingAverage};
use ta::Next;

use crate::error::{ta_err, Result};
use crate::types::{Candle, IndicatorSeries};

/// 随机指标 %K / %D
#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

pub struct StochasticIndicator {}

impl StochasticIndicator {
    /// %K：收盘价在 `k_window` 区间高低点中的位置（区间为 0 时取 50）
    /// %D：%K 的 `d_window` 简单均线，只对已定义的 %K 计算
    pub fn calculate(
        candles: &[Candle],
        k_window: usize,
        d_window: usize,
    ) -> Result<StochasticSeries> {
        let mut fast =
            FastStochastic::new(k_window).map_err(|e| ta_err("Stochastic %K", e))?;
        let raw_k: Vec<f64> = candles.iter().map(|c| fast.next(c)).collect();
        let k = IndicatorSeries::from_raw(
            format!("stoch_k{}", k_window),
            raw_k,
            k_window.saturating_sub(1),
        );

        let mut sma =
            SimpleMovingAverage::new(d_window).map_err(|e| ta_err("Stochastic %D", e))?;
        let mut fed = 0usize;
        let d_values = k
            .values
            .iter()
            .map(|k_value| {
                let k_value = (*k_value)?;
                fed += 1;
                let d = sma.next(k_value);
                if fed >= d_window {
                    Some(d)
                } else {
                    None
                }
            })
            .collect();
        let d = IndicatorSeries::new(format!("stoch_d{}", d_window), d_values);

        Ok(StochasticSeries { k, d })
    }
}
