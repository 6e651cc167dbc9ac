//! 价格与指标背离
//!
//! 只比较最近两个同类 pivot，并读取指标在这两根K线上的值。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pivot::{PivotKind, PivotSequence};
use crate::types::IndicatorSeries;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DivergenceKind {
    /// 常规背离：价格与指标方向相反，趋势可能衰竭
    Regular,
    /// 隐藏背离：低点处价格更低而指标更高，高点处价格更高而指标更低，趋势可能延续
    Hidden,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalBias {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceVerdict {
    pub kind: DivergenceKind,
    pub pivot_kind: PivotKind,
    /// 比较的指标序列名
    pub indicator: String,
    pub found: bool,
    /// 指标在两点之间上升为多，下降为空；未发现时为 None
    pub bias: Option<SignalBias>,
    /// (较早, 较近) 两个 pivot 的下标，未发现时为 None
    pub pivot_indices: Option<(usize, usize)>,
}

impl DivergenceVerdict {
    fn not_found(kind: DivergenceKind, pivot_kind: PivotKind, indicator: &IndicatorSeries) -> Self {
        Self {
            kind,
            pivot_kind,
            indicator: indicator.name.clone(),
            found: false,
            bias: None,
            pivot_indices: None,
        }
    }
}

pub struct DivergenceDetector {}

impl DivergenceDetector {
    /// 同类 pivot 不足两个或指标未定义时返回 `found = false`
    pub fn detect(
        pivots: &PivotSequence,
        indicator: &IndicatorSeries,
        kind: DivergenceKind,
        pivot_kind: PivotKind,
    ) -> DivergenceVerdict {
        let mut verdict = DivergenceVerdict::not_found(kind, pivot_kind, indicator);

        let Some((prior, latest)) = pivots.last_two(pivot_kind) else {
            return verdict;
        };
        let (Some(ind_prior), Some(ind_latest)) =
            (indicator.get(prior.index), indicator.get(latest.index))
        else {
            return verdict;
        };

        let price_higher = latest.price > prior.price;
        let price_lower = latest.price < prior.price;
        let ind_higher = ind_latest > ind_prior;
        let ind_lower = ind_latest < ind_prior;

        let found = match (kind, pivot_kind) {
            (DivergenceKind::Regular, _) => {
                (price_higher && ind_lower) || (price_lower && ind_higher)
            }
            (DivergenceKind::Hidden, PivotKind::Low) => price_lower && ind_higher,
            (DivergenceKind::Hidden, PivotKind::High) => price_higher && ind_lower,
        };

        if found {
            verdict.found = true;
            verdict.bias = Some(if ind_higher {
                SignalBias::Bullish
            } else {
                SignalBias::Bearish
            });
            verdict.pivot_indices = Some((prior.index, latest.index));
            debug!(
                "发现{:?}背离: {} @ {:?} pivots ({} -> {})",
                kind, indicator.name, pivot_kind, prior.index, latest.index
            );
        }
        verdict
    }
}
