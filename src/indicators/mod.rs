//! 技术指标：趋势（EMA）、动量（MACD、RSI、随机指标）、中轨

pub mod config;
pub mod ema;
pub mod macd;
pub mod mid_channel;
pub mod rsi;
pub mod stochastic;

use std::collections::BTreeMap;

use tracing::debug;

pub use config::{IndicatorConfig, MacdParams, MACD_NOISE, MACD_STANDARD, MACD_STRUCTURAL};
pub use ema::{ema_name, ema_series};
pub use macd::{MacdSeries, MacdSimpleIndicator};
pub use mid_channel::{mid_channel_series, MidChannelIndicator};
pub use rsi::{rsi_series, RsiIndicator};
pub use stochastic::{StochasticIndicator, StochasticSeries};

use crate::error::Result;
use crate::types::{CandleSeries, IndicatorSeries};

/// 一次分析所需的全部指标，每条序列都与K线等长
#[derive(Debug, Clone)]
pub struct IndicatorBank {
    len: usize,
    emas: BTreeMap<usize, IndicatorSeries>,
    macd: BTreeMap<String, MacdSeries>,
    pub rsi: IndicatorSeries,
    pub stoch_k: IndicatorSeries,
    pub stoch_d: IndicatorSeries,
    pub mid_channel: IndicatorSeries,
}

impl IndicatorBank {
    /// 先校验配置，再逐个计算；历史不足的指标整条未定义
    pub fn compute(candles: &CandleSeries, config: &IndicatorConfig) -> Result<Self> {
        config.validate()?;

        let closes = candles.closes();
        let mut emas = BTreeMap::new();
        for &window in &config.ema_windows {
            emas.insert(window, ema_series(&closes, window)?);
        }

        let mut macd = BTreeMap::new();
        for params in &config.macd {
            macd.insert(
                params.name.clone(),
                MacdSimpleIndicator::calculate_macd(&closes, params)?,
            );
        }

        let rsi = rsi_series(&closes, config.rsi_period);
        let stoch = StochasticIndicator::calculate(
            candles.candles(),
            config.stoch_k_window,
            config.stoch_d_window,
        )?;
        let mid_channel = mid_channel_series(
            candles.candles(),
            config.mid_channel_window,
            config.mid_channel_shift,
        )?;

        let bank = Self {
            len: candles.len(),
            emas,
            macd,
            rsi,
            stoch_k: stoch.k,
            stoch_d: stoch.d,
            mid_channel,
        };
        debug!(
            "指标计算完成: candles={}, series={}, ready={}",
            bank.len,
            bank.all_series().len(),
            bank.ready_at_end()
        );
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ema(&self, window: usize) -> Option<&IndicatorSeries> {
        self.emas.get(&window)
    }

    pub fn macd(&self, name: &str) -> Option<&MacdSeries> {
        self.macd.get(name)
    }

    /// 所有序列（EMA 按周期、MACD 按名字排序）
    pub fn all_series(&self) -> Vec<&IndicatorSeries> {
        let mut out: Vec<&IndicatorSeries> = self.emas.values().collect();
        for m in self.macd.values() {
            out.push(&m.macd);
            out.push(&m.signal);
            out.push(&m.histogram);
        }
        out.push(&self.rsi);
        out.push(&self.stoch_k);
        out.push(&self.stoch_d);
        out.push(&self.mid_channel);
        out
    }

    /// 最后一根K线上所有指标都已定义
    pub fn ready_at_end(&self) -> bool {
        self.len > 0 && self.all_series().iter().all(|s| s.last().is_some())
    }
}
