use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ta::{Close, High, Low, Open, Volume};

use crate::error::{CandleViolation, InvalidCandleError, Result};

/// K线（毫秒时间戳 + OHLCV）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Candle {
    pub(crate) ts: i64,
    pub(crate) o: f64,
    pub(crate) h: f64,
    pub(crate) l: f64,
    pub(crate) c: f64,
    pub(crate) v: f64,
}

impl Candle {
    pub fn builder() -> CandleBuilder {
        CandleBuilder::new()
    }
    pub fn ts(&self) -> i64 {
        self.ts
    }
    pub fn o(&self) -> f64 {
        self.o
    }
    pub fn h(&self) -> f64 {
        self.h
    }
    pub fn l(&self) -> f64 {
        self.l
    }
    pub fn c(&self) -> f64 {
        self.c
    }
    pub fn v(&self) -> f64 {
        self.v
    }

    /// 时间戳转换为 UTC 时间
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts).single()
    }

    /// 检查单根K线的 OHLC 约束
    pub fn check(&self) -> std::result::Result<(), CandleViolation> {
        let values = [self.o, self.h, self.l, self.c, self.v];
        if values.iter().any(|x| !x.is_finite()) {
            return Err(CandleViolation::NonFinite);
        }
        if self.l < 0.0 || self.v < 0.0 {
            return Err(CandleViolation::Negative);
        }
        if self.h < self.o || self.h < self.c || self.h < self.l {
            return Err(CandleViolation::HighBelowBody);
        }
        if self.l > self.o || self.l > self.c {
            return Err(CandleViolation::LowAboveBody);
        }
        Ok(())
    }
}

impl Open for Candle {
    fn open(&self) -> f64 {
        self.o
    }
}

impl High for Candle {
    fn high(&self) -> f64 {
        self.h
    }
}

impl Low for Candle {
    fn low(&self) -> f64 {
        self.l
    }
}

impl Close for Candle {
    fn close(&self) -> f64 {
        self.c
    }
}

impl Volume for Candle {
    fn volume(&self) -> f64 {
        self.v
    }
}

#[derive(Debug, Default)]
pub struct CandleBuilder {
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
    ts: Option<i64>,
}

impl CandleBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn ts(mut self, val: i64) -> Self {
        self.ts = Some(val);
        self
    }
    pub fn o(mut self, val: f64) -> Self {
        self.o = Some(val);
        self
    }
    pub fn h(mut self, val: f64) -> Self {
        self.h = Some(val);
        self
    }
    pub fn l(mut self, val: f64) -> Self {
        self.l = Some(val);
        self
    }
    pub fn c(mut self, val: f64) -> Self {
        self.c = Some(val);
        self
    }
    pub fn v(mut self, val: f64) -> Self {
        self.v = Some(val);
        self
    }

    /// 构建并校验K线；volume 缺省为 0
    pub fn build(self) -> std::result::Result<Candle, CandleViolation> {
        if let (Some(o), Some(h), Some(l), Some(c), Some(ts)) =
            (self.o, self.h, self.l, self.c, self.ts)
        {
            let candle = Candle {
                ts,
                o,
                h,
                l,
                c,
                v: self.v.unwrap_or(0.0),
            };
            candle.check()?;
            Ok(candle)
        } else {
            Err(CandleViolation::Incomplete)
        }
    }
}

/// 不可变的有序K线序列
///
/// 构造时校验每根K线以及时间戳严格递增，之后只读。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        let mut prev_ts: Option<i64> = None;
        for (index, candle) in candles.iter().enumerate() {
            candle
                .check()
                .map_err(|violation| InvalidCandleError::new(index, violation))?;
            if let Some(prev_ts) = prev_ts {
                if candle.ts <= prev_ts {
                    return Err(InvalidCandleError::new(
                        index,
                        CandleViolation::NonIncreasingTimestamp {
                            prev_ts,
                            ts: candle.ts,
                        },
                    )
                    .into());
                }
            }
            prev_ts = Some(candle.ts);
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.h).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.l).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.c).collect()
    }

    /// 读取 `[{ts, o, h, l, c, v}, ...]` 格式的 JSON 文件
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let candles: Vec<Candle> = serde_json::from_reader(BufReader::new(file))?;
        Self::new(candles)
    }
}

impl<'de> Deserialize<'de> for CandleSeries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let candles = Vec::<Candle>::deserialize(deserializer)?;
        CandleSeries::new(candles).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;

    fn candle(ts: i64, o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle::builder()
            .ts(ts)
            .o(o)
            .h(h)
            .l(l)
            .c(c)
            .v(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_high_below_close() {
        let res = Candle::builder()
            .ts(0)
            .o(10.0)
            .h(10.5)
            .l(9.0)
            .c(11.0)
            .build();
        assert_eq!(res, Err(CandleViolation::HighBelowBody));
    }

    #[test]
    fn builder_requires_prices() {
        let res = Candle::builder().ts(0).o(1.0).build();
        assert_eq!(res, Err(CandleViolation::Incomplete));
    }

    #[test]
    fn series_rejects_unordered_timestamps() {
        let candles = vec![
            candle(1_000, 10.0, 11.0, 9.0, 10.5),
            candle(1_000, 10.5, 11.5, 10.0, 11.0),
        ];
        match CandleSeries::new(candles) {
            Err(SignalError::InvalidCandle(err)) => {
                assert_eq!(err.index, 1);
                assert!(matches!(
                    err.violation,
                    CandleViolation::NonIncreasingTimestamp { .. }
                ));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn series_deserializes_ohlcv_objects() {
        let json = r#"[
            {"ts": 1700000000000, "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0},
            {"ts": 1700000060000, "o": 1.5, "h": 2.5, "l": 1.0, "c": 2.0, "v": 12.0}
        ]"#;
        let series: CandleSeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.5, 2.0]);
        assert!(series.last().and_then(|c| c.datetime()).is_some());
    }

    #[test]
    fn series_deserialize_validates() {
        let json = r#"[{"ts": 1, "o": 1.0, "h": 0.5, "l": 0.4, "c": 0.6, "v": 1.0}]"#;
        assert!(serde_json::from_str::<CandleSeries>(json).is_err());
    }
}
