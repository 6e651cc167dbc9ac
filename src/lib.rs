//! # Quant Signal
//!
//! K线技术分析引擎：指标、ZigZag 摆动点、趋势判定、背离、平台区。
//! 输入一段已清洗的K线，输出确定性的结构化结果。

pub mod app_config;
pub mod batch;
pub mod divergence;
pub mod error;
pub mod flat_zone;
pub mod indicators;
pub mod pivot;
pub mod report;
pub mod trend;
pub mod types;

pub use batch::{analyze_batch, AnalysisRequest, BatchOutcome};
pub use divergence::{DivergenceDetector, DivergenceKind, DivergenceVerdict, SignalBias};
pub use error::{CandleViolation, InvalidCandleError, Result, SignalError};
pub use flat_zone::{FlatZone, FlatZoneConfig, FlatZoneDetector};
pub use indicators::{IndicatorBank, IndicatorConfig, MacdParams};
pub use pivot::{Pivot, PivotKind, PivotSequence, ZigZagDetector, ZigZagParams};
pub use report::{analyze, analyze_with, AnalysisOptions, AnalysisResult, ReportComposer};
pub use trend::{TrendClassifier, TrendConfig, TrendLabel, TrendReason, TrendVerdict};
pub use types::{Candle, CandleBuilder, CandleSeries, IndicatorSeries};
