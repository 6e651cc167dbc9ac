//! 平台区（水平支撑/阻力）识别
//!
//! 在平滑序列（中轨）上滑动固定窗口，窗口内 `(max - min) / mean` 低于容差即视为平台。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SignalError};
use crate::types::IndicatorSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatZoneConfig {
    /// 窗口长度（K线数）
    pub window: usize,
    /// 容差（百分比，0.05 即 0.05%）
    pub tolerance_pct: f64,
    /// 去重时中心价保留的小数位
    pub price_precision: u32,
}

impl Default for FlatZoneConfig {
    fn default() -> Self {
        Self {
            window: 15,
            tolerance_pct: 0.05,
            price_precision: 8,
        }
    }
}

impl FlatZoneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(SignalError::InvalidParameter(format!(
                "flat_zone window 必须 >= 2, 实际 {}",
                self.window
            )));
        }
        if !self.tolerance_pct.is_finite() || self.tolerance_pct <= 0.0 {
            return Err(SignalError::InvalidParameter(format!(
                "flat_zone tolerance_pct 必须 > 0, 实际 {}",
                self.tolerance_pct
            )));
        }
        if self.price_precision > 12 {
            return Err(SignalError::InvalidParameter(format!(
                "flat_zone price_precision 最多 12 位, 实际 {}",
                self.price_precision
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatZone {
    pub center_price: f64,
    pub start_index: usize,
    pub end_index: usize,
}

pub struct FlatZoneDetector {
    config: FlatZoneConfig,
}

impl FlatZoneDetector {
    pub fn new(config: FlatZoneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 按 start_index 升序返回，中心价相同（按精度取整后）的只保留第一个
    pub fn detect(&self, series: &IndicatorSeries) -> Vec<FlatZone> {
        let window = self.config.window;
        let mut zones = Vec::new();
        let mut seen = BTreeSet::new();

        let mut i = 0;
        while i + window <= series.len() {
            match self.flat_mean(&series.values[i..i + window]) {
                Some(mean) => {
                    let center_price = self.round_price(mean);
                    if seen.insert(self.price_key(center_price)) {
                        zones.push(FlatZone {
                            center_price,
                            start_index: i,
                            end_index: i + window - 1,
                        });
                    }
                    // 跳过整个窗口，避免重叠
                    i += window;
                }
                None => i += 1,
            }
        }

        debug!(
            "平台区识别: series={}, window={}, tolerance={}%, zones={}",
            series.name,
            window,
            self.config.tolerance_pct,
            zones.len()
        );
        zones
    }

    /// 末尾窗口本身是平台时，返回其均值（最近的关键价位）
    pub fn latest_flat_level(&self, series: &IndicatorSeries) -> Option<f64> {
        let window = self.config.window;
        if series.len() < window {
            return None;
        }
        self.flat_mean(&series.values[series.len() - window..])
            .map(|mean| self.round_price(mean))
    }

    /// 窗口全部已定义、均值为正且离散度低于容差时返回均值
    fn flat_mean(&self, values: &[Option<f64>]) -> Option<f64> {
        let mut sum = 0.0;
        let mut max = f64::MIN;
        let mut min = f64::MAX;
        for value in values {
            let v = (*value)?;
            sum += v;
            max = max.max(v);
            min = min.min(v);
        }
        let mean = sum / values.len() as f64;
        if mean <= 0.0 {
            return None;
        }
        let dispersion = (max - min) / mean;
        if dispersion < self.config.tolerance_pct / 100.0 {
            Some(mean)
        } else {
            None
        }
    }

    fn round_price(&self, price: f64) -> f64 {
        let factor = 10f64.powi(self.config.price_precision as i32);
        (price * factor).round() / factor
    }

    fn price_key(&self, price: f64) -> String {
        format!("{:.*}", self.config.price_precision as usize, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(window: usize, tolerance_pct: f64) -> FlatZoneConfig {
        FlatZoneConfig {
            window,
            tolerance_pct,
            ..FlatZoneConfig::default()
        }
    }

    fn defined(values: &[f64]) -> IndicatorSeries {
        IndicatorSeries::new("mid", values.iter().map(|&v| Some(v)).collect())
    }

    #[test]
    fn constant_series_yields_zone_at_constant() {
        // ±0.01% 的抖动
        let values: Vec<f64> = (0..60)
            .map(|i| 250.0 * (1.0 + if i % 2 == 0 { 0.0001 } else { -0.0001 }))
            .collect();
        let detector = FlatZoneDetector::new(config(15, 0.1)).unwrap();
        let zones = detector.detect(&defined(&values));
        assert!(!zones.is_empty());
        assert_relative_eq!(zones[0].center_price, 250.0, max_relative = 1e-4);
        assert_eq!(zones[0].start_index, 0);
        assert_eq!(zones[0].end_index, 14);
        assert_relative_eq!(
            detector.latest_flat_level(&defined(&values)).unwrap(),
            250.0,
            max_relative = 1e-4
        );
    }

    #[test]
    fn zones_do_not_overlap_and_are_deduplicated() {
        let mut values = vec![100.0; 30];
        values.extend((0..10).map(|i| 100.0 + i as f64 * 5.0));
        values.extend(vec![200.0; 20]);
        let detector = FlatZoneDetector::new(config(10, 0.05)).unwrap();
        let zones = detector.detect(&defined(&values));
        // 100 的三个窗口只保留一个，200 一个
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].center_price, 100.0);
        assert_eq!(zones[1].center_price, 200.0);
        for pair in zones.windows(2) {
            assert!(pair[0].end_index < pair[1].start_index);
        }
    }

    #[test]
    fn undefined_values_are_skipped() {
        let mut series = defined(&[10.0; 20]);
        for v in series.values.iter_mut().take(8) {
            *v = None;
        }
        let detector = FlatZoneDetector::new(config(5, 0.05)).unwrap();
        let zones = detector.detect(&series);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].start_index, 8);
    }

    #[test]
    fn trending_series_has_no_zone() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let detector = FlatZoneDetector::new(FlatZoneConfig::default()).unwrap();
        assert!(detector.detect(&defined(&values)).is_empty());
        assert!(detector.latest_flat_level(&defined(&values)).is_none());
    }

    #[test]
    fn detection_is_idempotent() {
        let values: Vec<f64> = (0..80).map(|i| if i < 40 { 50.0 } else { 60.0 }).collect();
        let series = defined(&values);
        let detector = FlatZoneDetector::new(config(15, 0.05)).unwrap();
        assert_eq!(detector.detect(&series), detector.detect(&series));
    }

    #[test]
    fn rejects_bad_config() {
        assert!(FlatZoneDetector::new(config(1, 0.05)).is_err());
        assert!(FlatZoneDetector::new(config(15, 0.0)).is_err());
    }
}
