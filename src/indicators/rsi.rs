use ta::{Next, Reset};

use crate::types::IndicatorSeries;

/// Wilder 平滑（TradingView 的 ta.rma）
///
/// 前 `length` 个输入用 SMA 作为种子，之后 `(prev * (n - 1) + x) / n`。
#[derive(Debug, Clone)]
struct WilderRma {
    length: usize,
    seed_sum: f64,
    seed_count: usize,
    current: Option<f64>,
}

impl WilderRma {
    fn new(length: usize) -> Self {
        Self {
            length,
            seed_sum: 0.0,
            seed_count: 0,
            current: None,
        }
    }

    fn next(&mut self, value: f64) -> Option<f64> {
        match self.current {
            None => {
                self.seed_sum += value;
                self.seed_count += 1;
                if self.seed_count >= self.length {
                    self.current = Some(self.seed_sum / self.length as f64);
                }
            }
            Some(prev) => {
                let n = self.length as f64;
                self.current = Some((prev * (n - 1.0) + value) / n);
            }
        }
        self.current
    }

    fn reset(&mut self) {
        self.seed_sum = 0.0;
        self.seed_count = 0;
        self.current = None;
    }
}

/// RSI（Wilder），未满 `length` 个价格变化前输出 `None`
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    up_rma: WilderRma,
    down_rma: WilderRma,
    prev_value: Option<f64>,
}

impl RsiIndicator {
    pub fn new(length: usize) -> Self {
        Self {
            up_rma: WilderRma::new(length),
            down_rma: WilderRma::new(length),
            prev_value: None,
        }
    }
}

impl Next<f64> for RsiIndicator {
    type Output = Option<f64>;

    /// rsi = down == 0 ? 100 : up == 0 ? 0 : 100 - 100 / (1 + up / down)
    fn next(&mut self, value: f64) -> Option<f64> {
        let prev = self.prev_value.replace(value)?;
        let change = value - prev;
        let up = if change > 0.0 { change } else { 0.0 };
        let down = if change < 0.0 { -change } else { 0.0 };

        let up_avg = self.up_rma.next(up)?;
        let down_avg = self.down_rma.next(down)?;

        let rsi = if down_avg == 0.0 {
            100.0
        } else if up_avg == 0.0 {
            0.0
        } else {
            100.0 - (100.0 / (1.0 + up_avg / down_avg))
        };
        Some(rsi)
    }
}

impl Reset for RsiIndicator {
    fn reset(&mut self) {
        self.up_rma.reset();
        self.down_rma.reset();
        self.prev_value = None;
    }
}

pub fn rsi_name(period: usize) -> String {
    format!("rsi{}", period)
}

pub fn rsi_series(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut rsi = RsiIndicator::new(period);
    let values = closes.iter().map(|&c| rsi.next(c)).collect();
    IndicatorSeries::new(rsi_name(period), values)
}
