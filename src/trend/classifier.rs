use tracing::debug;

use super::{TrendConfig, TrendLabel, TrendRationale, TrendReason, TrendVerdict};
use crate::error::Result;
use crate::indicators::IndicatorBank;
use crate::pivot::{PivotKind, PivotSequence};
use crate::types::CandleSeries;

/// 最后一根K线上的动能数据
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MomentumSnapshot {
    pub histogram: Option<f64>,
    pub close: Option<f64>,
    pub long_ma: Option<f64>,
}

impl MomentumSnapshot {
    pub fn from_bank(bank: &IndicatorBank, candles: &CandleSeries, config: &TrendConfig) -> Self {
        Self {
            histogram: bank
                .macd(&config.momentum_macd)
                .and_then(|m| m.histogram.last()),
            close: candles.last().map(|c| c.c()),
            long_ma: bank.ema(config.long_ema).and_then(|s| s.last()),
        }
    }

    /// 柱状图 > 0 且收盘价在长期均线之上
    pub fn confirms_bullish(&self) -> bool {
        match (self.histogram, self.close, self.long_ma) {
            (Some(h), Some(c), Some(ma)) => h > 0.0 && c > ma,
            _ => false,
        }
    }

    pub fn confirms_bearish(&self) -> bool {
        match (self.histogram, self.close, self.long_ma) {
            (Some(h), Some(c), Some(ma)) => h < 0.0 && c < ma,
            _ => false,
        }
    }
}

pub struct TrendClassifier {
    config: TrendConfig,
}

impl TrendClassifier {
    pub fn new(config: TrendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 优先级：横盘（过期） > 多头 > 空头 > 无法判定
    pub fn classify(
        &self,
        pivots: &PivotSequence,
        series_len: usize,
        momentum: &MomentumSnapshot,
    ) -> TrendVerdict {
        let bars_since_last_pivot = pivots
            .last()
            .map(|p| series_len.saturating_sub(1).saturating_sub(p.index));

        let mut rationale = TrendRationale {
            reason: TrendReason::InsufficientPivots,
            higher_highs: None,
            higher_lows: None,
            bars_since_last_pivot,
            momentum_confirmed: None,
        };

        let Some(bars) = bars_since_last_pivot else {
            return verdict(TrendLabel::Undetermined, rationale);
        };

        rationale.higher_highs = compare_last_two(pivots, PivotKind::High);
        rationale.higher_lows = compare_last_two(pivots, PivotKind::Low);

        if bars >= self.config.stale_after {
            rationale.reason = TrendReason::Stale;
            return verdict(TrendLabel::Sideways, rationale);
        }

        if pivots.count(PivotKind::High) < 2 || pivots.count(PivotKind::Low) < 2 {
            return verdict(TrendLabel::Undetermined, rationale);
        }

        match (rationale.higher_highs, rationale.higher_lows) {
            (Some(true), Some(true)) => {
                let strong = momentum.confirms_bullish();
                rationale.reason = TrendReason::HigherHighsHigherLows;
                rationale.momentum_confirmed = Some(strong);
                let label = if strong {
                    TrendLabel::StrongBullish
                } else {
                    TrendLabel::Bullish
                };
                verdict(label, rationale)
            }
            (Some(false), Some(false)) => {
                let strong = momentum.confirms_bearish();
                rationale.reason = TrendReason::LowerHighsLowerLows;
                rationale.momentum_confirmed = Some(strong);
                let label = if strong {
                    TrendLabel::StrongBearish
                } else {
                    TrendLabel::Bearish
                };
                verdict(label, rationale)
            }
            _ => {
                rationale.reason = TrendReason::Mixed;
                verdict(TrendLabel::Undetermined, rationale)
            }
        }
    }
}

fn verdict(label: TrendLabel, rationale: TrendRationale) -> TrendVerdict {
    debug!("趋势判定: {} ({:?})", label, rationale.reason);
    TrendVerdict { label, rationale }
}

/// 最近两个同类 pivot 的方向，相等时为 None
fn compare_last_two(pivots: &PivotSequence, kind: PivotKind) -> Option<bool> {
    let (prior, latest) = pivots.last_two(kind)?;
    if latest.price > prior.price {
        Some(true)
    } else if latest.price < prior.price {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::Pivot;

    fn seq(points: &[(usize, f64, PivotKind)]) -> PivotSequence {
        PivotSequence::from_pivots(
            points
                .iter()
                .map(|&(index, price, kind)| Pivot {
                    index,
                    ts: index as i64,
                    price,
                    kind,
                })
                .collect(),
        )
        .unwrap()
    }

    fn classifier() -> TrendClassifier {
        TrendClassifier::new(TrendConfig::default()).unwrap()
    }

    fn uptrend() -> PivotSequence {
        use PivotKind::*;
        seq(&[(5, 100.0, Low), (10, 110.0, High), (15, 104.0, Low), (20, 115.0, High)])
    }

    #[test]
    fn higher_highs_and_lows_are_bullish() {
        let v = classifier().classify(&uptrend(), 25, &MomentumSnapshot::default());
        assert_eq!(v.label, TrendLabel::Bullish);
        assert_eq!(v.rationale.reason, TrendReason::HigherHighsHigherLows);
        assert_eq!(v.rationale.momentum_confirmed, Some(false));
        assert_eq!(v.rationale.bars_since_last_pivot, Some(4));
    }

    #[test]
    fn momentum_upgrades_to_strong() {
        let momentum = MomentumSnapshot {
            histogram: Some(0.3),
            close: Some(116.0),
            long_ma: Some(108.0),
        };
        let v = classifier().classify(&uptrend(), 25, &momentum);
        assert_eq!(v.label, TrendLabel::StrongBullish);

        // 任何一项未定义都不升级
        let partial = MomentumSnapshot {
            long_ma: None,
            ..momentum
        };
        assert_eq!(
            classifier().classify(&uptrend(), 25, &partial).label,
            TrendLabel::Bullish
        );
    }

    #[test]
    fn lower_highs_and_lows_are_bearish() {
        use PivotKind::*;
        let pivots = seq(&[
            (5, 120.0, High),
            (10, 110.0, Low),
            (15, 115.0, High),
            (20, 100.0, Low),
        ]);
        let momentum = MomentumSnapshot {
            histogram: Some(-1.0),
            close: Some(99.0),
            long_ma: Some(110.0),
        };
        let v = classifier().classify(&pivots, 22, &momentum);
        assert_eq!(v.label, TrendLabel::StrongBearish);
        assert_eq!(
            classifier().classify(&pivots, 22, &MomentumSnapshot::default()).label,
            TrendLabel::Bearish
        );
    }

    #[test]
    fn mixed_shape_is_undetermined_not_sideways() {
        use PivotKind::*;
        let pivots = seq(&[(5, 100.0, Low), (10, 110.0, High), (15, 98.0, Low), (20, 115.0, High)]);
        let v = classifier().classify(&pivots, 25, &MomentumSnapshot::default());
        assert_eq!(v.label, TrendLabel::Undetermined);
        assert_eq!(v.rationale.reason, TrendReason::Mixed);
        assert_eq!(v.rationale.higher_highs, Some(true));
        assert_eq!(v.rationale.higher_lows, Some(false));
    }

    #[test]
    fn staleness_overrides_shape() {
        // 最后一个 pivot 在 20，序列长度 71 -> 已过去 50 根
        let v = classifier().classify(&uptrend(), 71, &MomentumSnapshot::default());
        assert_eq!(v.label, TrendLabel::Sideways);
        assert_eq!(v.rationale.reason, TrendReason::Stale);
        // 49 根时仍按形态判定
        let v = classifier().classify(&uptrend(), 70, &MomentumSnapshot::default());
        assert_eq!(v.label, TrendLabel::Bullish);
    }

    #[test]
    fn too_few_pivots_is_undetermined() {
        use PivotKind::*;
        let pivots = seq(&[(5, 100.0, Low), (10, 110.0, High), (15, 104.0, Low)]);
        let v = classifier().classify(&pivots, 20, &MomentumSnapshot::default());
        assert_eq!(v.label, TrendLabel::Undetermined);
        assert_eq!(v.rationale.reason, TrendReason::InsufficientPivots);

        let empty = PivotSequence::default();
        let v = classifier().classify(&empty, 20, &MomentumSnapshot::default());
        assert_eq!(v.label, TrendLabel::Undetermined);
        assert_eq!(v.rationale.bars_since_last_pivot, None);
    }
}
