use serde::{Deserialize, Serialize};
use ta::indicators::MovingAverageConvergenceDivergence;
use ta::Next;

use super::config::MacdParams;
use crate::error::{ta_err, Result};
use crate::types::IndicatorSeries;

/// 一组 MACD 的三条线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub params: MacdParams,
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub struct MacdSimpleIndicator {}

impl MacdSimpleIndicator {
    pub fn calculate_macd(closes: &[f64], params: &MacdParams) -> Result<MacdSeries> {
        let mut macd =
            MovingAverageConvergenceDivergence::new(params.fast, params.slow, params.signal)
                .map_err(|e| ta_err("MACD", e))?;

        let mut macd_line = Vec::with_capacity(closes.len());
        let mut signal_line = Vec::with_capacity(closes.len());
        let mut histogram = Vec::with_capacity(closes.len());
        for &price in closes {
            let out = macd.next(price);
            macd_line.push(out.macd);
            signal_line.push(out.signal);
            histogram.push(out.histogram);
        }

        let name = &params.name;
        Ok(MacdSeries {
            macd: IndicatorSeries::from_raw(
                format!("macd_{}", name),
                macd_line,
                params.macd_warmup(),
            ),
            signal: IndicatorSeries::from_raw(
                format!("macd_{}_signal", name),
                signal_line,
                params.signal_warmup(),
            ),
            histogram: IndicatorSeries::from_raw(
                format!("macd_{}_hist", name),
                histogram,
                params.signal_warmup(),
            ),
            params: params.clone(),
        })
    }
}
