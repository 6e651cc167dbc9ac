use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::error::{ta_err, Result};
use crate::types::IndicatorSeries;

pub fn ema_name(window: usize) -> String {
    format!("ema{}", window)
}

/// EMA 序列，前 `window-1` 根未定义
pub fn ema_series(closes: &[f64], window: usize) -> Result<IndicatorSeries> {
    let mut ema = ExponentialMovingAverage::new(window).map_err(|e| ta_err("EMA", e))?;
    let raw = closes.iter().map(|&c| ema.next(c)).collect();
    Ok(IndicatorSeries::from_raw(
        ema_name(window),
        raw,
        window.saturating_sub(1),
    ))
}
