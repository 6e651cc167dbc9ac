//! 分析入口与结果汇总

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app_config::env::{env_parse, env_parse_or};
use crate::divergence::{DivergenceDetector, DivergenceKind, DivergenceVerdict, SignalBias};
use crate::error::Result;
use crate::flat_zone::{FlatZone, FlatZoneDetector};
use crate::indicators::{IndicatorBank, IndicatorConfig, MACD_NOISE, MACD_STRUCTURAL};
use crate::pivot::{Pivot, PivotKind, PivotSequence, ZigZagDetector, ZigZagParams};
use crate::trend::{MomentumSnapshot, TrendClassifier, TrendConfig, TrendVerdict};
use crate::types::CandleSeries;

/// 一次分析的全部参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// 主 ZigZag：趋势判定与 RSI 常规背离
    pub zigzag: ZigZagParams,
    /// 次级 ZigZag：MACD 隐藏背离；None 时复用主序列
    pub minor_zigzag: Option<ZigZagParams>,
    pub indicators: IndicatorConfig,
    pub trend: TrendConfig,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            zigzag: ZigZagParams::default(),
            minor_zigzag: Some(ZigZagParams::new(5, 5.0, 3)),
            indicators: IndicatorConfig::default(),
            trend: TrendConfig::default(),
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<()> {
        self.zigzag.validate()?;
        if let Some(minor) = &self.minor_zigzag {
            minor.validate()?;
        }
        self.indicators.validate()?;
        self.trend.validate()
    }

    /// 用环境变量覆盖参数；MINOR_ZIGZAG_DEPTH=0 关闭次级 ZigZag
    pub fn from_env(base: Self) -> Self {
        let mut options = base;
        options.zigzag.depth = env_parse_or("ZIGZAG_DEPTH", options.zigzag.depth);
        options.zigzag.deviation_pct =
            env_parse_or("ZIGZAG_DEVIATION", options.zigzag.deviation_pct);
        options.zigzag.backstep = env_parse_or("ZIGZAG_BACKSTEP", options.zigzag.backstep);
        if let Some(depth) = env_parse::<usize>("MINOR_ZIGZAG_DEPTH") {
            options.minor_zigzag = options.minor_zigzag_with_depth(depth);
        }
        options.trend.stale_after = env_parse_or("TREND_STALE_AFTER", options.trend.stale_after);
        let flat_zone = &mut options.indicators.flat_zone;
        flat_zone.window = env_parse_or("FLAT_ZONE_WINDOW", flat_zone.window);
        flat_zone.tolerance_pct = env_parse_or("FLAT_ZONE_TOLERANCE_PCT", flat_zone.tolerance_pct);
        options
    }

    pub fn minor_zigzag_with_depth(&self, depth: usize) -> Option<ZigZagParams> {
        if depth == 0 {
            return None;
        }
        let base = self.minor_zigzag.unwrap_or_else(|| {
            ZigZagParams::new(depth, self.zigzag.deviation_pct, self.zigzag.backstep)
        });
        Some(ZigZagParams { depth, ..base })
    }
}

/// 结构化分析结果（不含任何文案）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub trend: TrendVerdict,
    pub last_high: Option<Pivot>,
    pub last_low: Option<Pivot>,
    pub prior_high: Option<Pivot>,
    pub prior_low: Option<Pivot>,
    /// 价格与 RSI 的常规背离（主序列高点或低点）
    pub regular_divergence: bool,
    /// 价格与快 MACD 柱的隐藏背离（次级序列低点或高点）
    pub hidden_divergence: bool,
    pub flat_zones: Vec<FlatZone>,
    pub insufficient_data: bool,
    /// 最近两个高点中较高者
    pub key_resistance: Option<f64>,
    /// 最近两个低点中较低者
    pub key_support: Option<f64>,
    pub current_price: Option<f64>,
    /// 收盘价与长期 EMA、结构 MACD 同向时给出
    pub structural_bias: Option<SignalBias>,
    pub latest_flat_level: Option<f64>,
    pub divergences: Vec<DivergenceVerdict>,
    pub bars_since_last_pivot: Option<usize>,
    pub indicators_ready: bool,
}

/// 汇总所需的各阶段输出
#[derive(Debug, Clone)]
pub struct ReportInputs<'a> {
    pub series_len: usize,
    /// ZigZag 窗口与指标预热中较大者
    pub min_candles: usize,
    pub pivots: &'a PivotSequence,
    pub trend: TrendVerdict,
    pub divergences: Vec<DivergenceVerdict>,
    pub flat_zones: Vec<FlatZone>,
    pub latest_flat_level: Option<f64>,
    pub current_price: Option<f64>,
    pub structural_bias: Option<SignalBias>,
    pub indicators_ready: bool,
}

pub struct ReportComposer {}

impl ReportComposer {
    /// 纯汇总，不会失败；缺失的输入体现在 `insufficient_data` 与 None 字段上
    pub fn compose(inputs: ReportInputs<'_>) -> AnalysisResult {
        let pivots = inputs.pivots;
        let last_high = pivots.last_of(PivotKind::High, 0).copied();
        let prior_high = pivots.last_of(PivotKind::High, 1).copied();
        let last_low = pivots.last_of(PivotKind::Low, 0).copied();
        let prior_low = pivots.last_of(PivotKind::Low, 1).copied();

        let key_resistance = [last_high, prior_high]
            .iter()
            .flatten()
            .map(|p| p.price)
            .reduce(f64::max);
        let key_support = [last_low, prior_low]
            .iter()
            .flatten()
            .map(|p| p.price)
            .reduce(f64::min);

        let insufficient_data =
            inputs.series_len < inputs.min_candles || last_high.is_none() || last_low.is_none();

        let regular_divergence = inputs
            .divergences
            .iter()
            .any(|d| d.kind == DivergenceKind::Regular && d.found);
        let hidden_divergence = inputs
            .divergences
            .iter()
            .any(|d| d.kind == DivergenceKind::Hidden && d.found);

        AnalysisResult {
            bars_since_last_pivot: inputs.trend.rationale.bars_since_last_pivot,
            trend: inputs.trend,
            last_high,
            last_low,
            prior_high,
            prior_low,
            regular_divergence,
            hidden_divergence,
            flat_zones: inputs.flat_zones,
            insufficient_data,
            key_resistance,
            key_support,
            current_price: inputs.current_price,
            structural_bias: inputs.structural_bias,
            latest_flat_level: inputs.latest_flat_level,
            divergences: inputs.divergences,
            indicators_ready: inputs.indicators_ready,
        }
    }
}

/// 默认趋势参数、无次级 ZigZag 的分析
pub fn analyze(
    candles: &CandleSeries,
    params: ZigZagParams,
    indicator_config: &IndicatorConfig,
) -> Result<AnalysisResult> {
    let options = AnalysisOptions {
        zigzag: params,
        minor_zigzag: None,
        indicators: indicator_config.clone(),
        trend: TrendConfig::default(),
    };
    analyze_with(candles, &options)
}

/// 完整分析；只有参数非法时返回错误
pub fn analyze_with(candles: &CandleSeries, options: &AnalysisOptions) -> Result<AnalysisResult> {
    options.validate()?;

    let bank = IndicatorBank::compute(candles, &options.indicators)?;

    let major = ZigZagDetector::new(options.zigzag)?.detect(candles);
    let minor = match options.minor_zigzag {
        Some(params) => ZigZagDetector::new(params)?.detect(candles),
        None => major.clone(),
    };
    debug!("pivot 数量: major={}, minor={}", major.len(), minor.len());

    let classifier = TrendClassifier::new(options.trend.clone())?;
    let momentum = MomentumSnapshot::from_bank(&bank, candles, &options.trend);
    let trend = classifier.classify(&major, candles.len(), &momentum);

    let mut divergences = Vec::with_capacity(4);
    for pivot_kind in [PivotKind::High, PivotKind::Low] {
        divergences.push(DivergenceDetector::detect(
            &major,
            &bank.rsi,
            DivergenceKind::Regular,
            pivot_kind,
        ));
    }
    match bank.macd(MACD_NOISE) {
        Some(noise) => {
            for pivot_kind in [PivotKind::Low, PivotKind::High] {
                divergences.push(DivergenceDetector::detect(
                    &minor,
                    &noise.histogram,
                    DivergenceKind::Hidden,
                    pivot_kind,
                ));
            }
        }
        None => debug!("未配置 {} MACD，跳过隐藏背离", MACD_NOISE),
    }

    let flat_detector = FlatZoneDetector::new(options.indicators.flat_zone.clone())?;
    let flat_zones = flat_detector.detect(&bank.mid_channel);
    let latest_flat_level = flat_detector.latest_flat_level(&bank.mid_channel);

    let min_candles = options
        .zigzag
        .min_candles()
        .max(options.indicators.max_warmup());
    let result = ReportComposer::compose(ReportInputs {
        series_len: candles.len(),
        min_candles,
        pivots: &major,
        trend,
        divergences,
        flat_zones,
        latest_flat_level,
        current_price: candles.last().map(|c| c.c()),
        structural_bias: structural_bias(&bank, &momentum),
        indicators_ready: bank.ready_at_end(),
    });

    if result.insufficient_data {
        warn!(
            "数据不足: candles={}, 需要至少 {} 根, pivots={}",
            candles.len(),
            min_candles,
            major.len()
        );
    }
    Ok(result)
}

/// 收盘价在长期 EMA 之上且结构 MACD > 0 为多，反之为空
fn structural_bias(bank: &IndicatorBank, momentum: &MomentumSnapshot) -> Option<SignalBias> {
    let close = momentum.close?;
    let long_ma = momentum.long_ma?;
    let line = bank.macd(MACD_STRUCTURAL)?.macd.last()?;
    if close > long_ma && line > 0.0 {
        Some(SignalBias::Bullish)
    } else if close < long_ma && line < 0.0 {
        Some(SignalBias::Bearish)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::{TrendLabel, TrendReason, TrendRationale};
    use crate::types::Candle;

    fn pivot(index: usize, price: f64, kind: PivotKind) -> Pivot {
        Pivot {
            index,
            ts: index as i64,
            price,
            kind,
        }
    }

    fn undetermined() -> TrendVerdict {
        TrendVerdict {
            label: TrendLabel::Undetermined,
            rationale: TrendRationale {
                reason: TrendReason::InsufficientPivots,
                higher_highs: None,
                higher_lows: None,
                bars_since_last_pivot: None,
                momentum_confirmed: None,
            },
        }
    }

    #[test]
    fn compose_without_pivots_is_insufficient() {
        let empty = PivotSequence::default();
        let result = ReportComposer::compose(ReportInputs {
            series_len: 100,
            min_candles: 25,
            pivots: &empty,
            trend: undetermined(),
            divergences: vec![],
            flat_zones: vec![],
            latest_flat_level: None,
            current_price: Some(10.0),
            structural_bias: None,
            indicators_ready: false,
        });
        assert!(result.insufficient_data);
        assert!(result.last_high.is_none());
        assert!(result.key_support.is_none());
        assert!(!result.regular_divergence);
    }

    #[test]
    fn key_levels_come_from_last_two_pivots() {
        use PivotKind::*;
        let pivots = PivotSequence::from_pivots(vec![
            pivot(2, 90.0, Low),
            pivot(6, 130.0, High),
            pivot(10, 95.0, Low),
            pivot(14, 120.0, High),
            pivot(18, 100.0, Low),
        ])
        .unwrap();
        let result = ReportComposer::compose(ReportInputs {
            series_len: 25,
            min_candles: 7,
            pivots: &pivots,
            trend: undetermined(),
            divergences: vec![],
            flat_zones: vec![],
            latest_flat_level: None,
            current_price: Some(101.0),
            structural_bias: None,
            indicators_ready: false,
        });
        assert!(!result.insufficient_data);
        assert_eq!(result.key_resistance, Some(130.0));
        assert_eq!(result.key_support, Some(95.0));
        assert_eq!(result.last_low.map(|p| p.index), Some(18));
        assert_eq!(result.prior_low.map(|p| p.index), Some(10));
        assert_eq!(result.prior_high.map(|p| p.price), Some(130.0));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = AnalysisOptions {
            minor_zigzag: Some(ZigZagParams::new(0, 5.0, 3)),
            ..AnalysisOptions::default()
        };
        assert!(options.validate().is_err());
        assert!(AnalysisOptions::default().validate().is_ok());
    }

    #[test]
    fn minor_depth_zero_disables_minor() {
        let options = AnalysisOptions::default();
        assert_eq!(options.minor_zigzag_with_depth(0), None);
        assert_eq!(options.minor_zigzag_with_depth(8).map(|p| p.depth), Some(8));
    }

    #[test]
    fn env_overrides_options() {
        std::env::set_var("ZIGZAG_DEPTH", "7");
        std::env::set_var("ZIGZAG_DEVIATION", "3.5");
        std::env::set_var("ZIGZAG_BACKSTEP", "oops");
        std::env::set_var("TREND_STALE_AFTER", "20");
        std::env::set_var("FLAT_ZONE_WINDOW", "9");
        std::env::set_var("MINOR_ZIGZAG_DEPTH", "0");
        let options = AnalysisOptions::from_env(AnalysisOptions::default());
        std::env::set_var("MINOR_ZIGZAG_DEPTH", "4");
        let with_minor = AnalysisOptions::from_env(AnalysisOptions::default());
        for key in [
            "ZIGZAG_DEPTH",
            "ZIGZAG_DEVIATION",
            "ZIGZAG_BACKSTEP",
            "TREND_STALE_AFTER",
            "FLAT_ZONE_WINDOW",
            "MINOR_ZIGZAG_DEPTH",
        ] {
            std::env::remove_var(key);
        }

        assert_eq!(options.zigzag.depth, 7);
        assert_eq!(options.zigzag.deviation_pct, 3.5);
        // 解析失败保留原值
        assert_eq!(options.zigzag.backstep, 3);
        assert_eq!(options.trend.stale_after, 20);
        assert_eq!(options.indicators.flat_zone.window, 9);
        assert_eq!(options.minor_zigzag, None);
        assert_eq!(with_minor.minor_zigzag, Some(ZigZagParams::new(4, 5.0, 3)));
    }

    fn trending(n: usize, start: f64, step: f64) -> CandleSeries {
        let candles = (0..n)
            .map(|i| {
                let c = start + step * i as f64;
                Candle::builder()
                    .ts(1_700_000_000_000 + i as i64 * 60_000)
                    .o(c)
                    .h(c + 1.0)
                    .l(c - 1.0)
                    .c(c)
                    .v(1.0)
                    .build()
                    .unwrap()
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    fn bias_of(candles: &CandleSeries) -> (Option<SignalBias>, MomentumSnapshot, IndicatorBank) {
        let bank = IndicatorBank::compute(candles, &IndicatorConfig::default()).unwrap();
        let momentum = MomentumSnapshot::from_bank(&bank, candles, &TrendConfig::default());
        (structural_bias(&bank, &momentum), momentum, bank)
    }

    #[test]
    fn structural_bias_follows_long_ema_and_macd() {
        let (up, _, _) = bias_of(&trending(300, 100.0, 0.5));
        assert_eq!(up, Some(SignalBias::Bullish));

        let (down, momentum, bank) = bias_of(&trending(300, 400.0, -0.5));
        assert_eq!(down, Some(SignalBias::Bearish));

        // 收盘价在均线之上但结构 MACD 仍为负：不给方向
        let mixed = MomentumSnapshot {
            close: momentum.long_ma.map(|ma| ma + 10.0),
            ..momentum
        };
        assert_eq!(structural_bias(&bank, &mixed), None);

        // 长期 EMA 未定义
        let (short, _, _) = bias_of(&trending(60, 100.0, 0.5));
        assert_eq!(short, None);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: AnalysisOptions =
            serde_json::from_str(r#"{"zigzag": {"depth": 4}, "minor_zigzag": null}"#).unwrap();
        assert_eq!(options.zigzag.depth, 4);
        assert_eq!(options.zigzag.deviation_pct, 5.0);
        assert_eq!(options.minor_zigzag, None);
        assert_eq!(options.trend.stale_after, 50);
    }
}
