//! 摆动高低点（Pivot）

pub mod zigzag;

use serde::{Deserialize, Serialize};

pub use zigzag::{ZigZagDetector, ZigZagParams};

use crate::error::{Result, SignalError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PivotKind {
    High,
    Low,
}

impl PivotKind {
    pub fn opposite(self) -> Self {
        match self {
            PivotKind::High => PivotKind::Low,
            PivotKind::Low => PivotKind::High,
        }
    }

    /// `a` 是否比 `b` 更极端（高点更高 / 低点更低）
    pub fn more_extreme(self, a: f64, b: f64) -> bool {
        match self {
            PivotKind::High => a > b,
            PivotKind::Low => a < b,
        }
    }
}

/// 已确认的摆动点
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub index: usize,
    pub ts: i64,
    pub price: f64,
    pub kind: PivotKind,
}

/// 高低点交替、下标严格递增的摆动点序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PivotSequence {
    pivots: Vec<Pivot>,
}

impl PivotSequence {
    /// 从外部构造（例如测试或回放），会校验交替与递增
    pub fn from_pivots(pivots: Vec<Pivot>) -> Result<Self> {
        for pair in pivots.windows(2) {
            if pair[0].kind == pair[1].kind {
                return Err(SignalError::InvalidParameter(format!(
                    "pivot 类型必须交替: index {} 与 {} 同为 {:?}",
                    pair[0].index, pair[1].index, pair[1].kind
                )));
            }
            if pair[0].index >= pair[1].index {
                return Err(SignalError::InvalidParameter(format!(
                    "pivot 下标必须递增: {} -> {}",
                    pair[0].index, pair[1].index
                )));
            }
        }
        Ok(Self { pivots })
    }

    pub(crate) fn from_detector(pivots: Vec<Pivot>) -> Self {
        Self { pivots }
    }

    pub fn pivots(&self) -> &[Pivot] {
        &self.pivots
    }

    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    pub fn last(&self) -> Option<&Pivot> {
        self.pivots.last()
    }

    pub fn of_kind(&self, kind: PivotKind) -> impl Iterator<Item = &Pivot> + '_ {
        self.pivots.iter().filter(move |p| p.kind == kind)
    }

    pub fn highs(&self) -> Vec<&Pivot> {
        self.of_kind(PivotKind::High).collect()
    }

    pub fn lows(&self) -> Vec<&Pivot> {
        self.of_kind(PivotKind::Low).collect()
    }

    /// 倒数第 `n` 个（0 为最近）指定类型的 pivot
    pub fn last_of(&self, kind: PivotKind, n: usize) -> Option<&Pivot> {
        self.pivots.iter().rev().filter(|p| p.kind == kind).nth(n)
    }

    /// 最近两个同类 pivot，返回 (较早, 较近)
    pub fn last_two(&self, kind: PivotKind) -> Option<(&Pivot, &Pivot)> {
        let latest = self.last_of(kind, 0)?;
        let prior = self.last_of(kind, 1)?;
        Some((prior, latest))
    }

    pub fn count(&self, kind: PivotKind) -> usize {
        self.of_kind(kind).count()
    }
}
