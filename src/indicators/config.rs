use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::flat_zone::FlatZoneConfig;

/// MACD 参数（带名字，便于下游按名字取用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub name: String,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl MacdParams {
    pub fn new(name: impl Into<String>, fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            name: name.into(),
            fast,
            slow,
            signal,
        }
    }

    /// MACD 线的预热长度
    pub fn macd_warmup(&self) -> usize {
        self.slow.saturating_sub(1)
    }

    /// 信号线/柱状图的预热长度
    pub fn signal_warmup(&self) -> usize {
        (self.slow + self.signal).saturating_sub(2)
    }
}

pub const MACD_NOISE: &str = "noise";
pub const MACD_STANDARD: &str = "standard";
pub const MACD_STRUCTURAL: &str = "structural";

/// 指标配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// EMA 周期
    pub ema_windows: Vec<usize>,
    /// 多组 MACD
    pub macd: Vec<MacdParams>,
    /// RSI 周期（Wilder）
    pub rsi_period: usize,
    /// 随机指标 %K 窗口
    pub stoch_k_window: usize,
    /// %D 平滑窗口
    pub stoch_d_window: usize,
    /// 中轨回看窗口
    pub mid_channel_window: usize,
    /// 中轨前移K线数
    pub mid_channel_shift: usize,
    /// 平台区检测
    pub flat_zone: FlatZoneConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_windows: vec![20, 50, 100],
            macd: vec![
                MacdParams::new(MACD_NOISE, 3, 6, 2),
                MacdParams::new(MACD_STANDARD, 12, 26, 9),
                MacdParams::new(MACD_STRUCTURAL, 48, 104, 36),
            ],
            rsi_period: 14,
            stoch_k_window: 5,
            stoch_d_window: 3,
            mid_channel_window: 52,
            mid_channel_shift: 26,
            flat_zone: FlatZoneConfig::default(),
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ema_windows.iter().any(|&w| w == 0) {
            return Err(SignalError::InvalidParameter(
                "EMA 周期必须大于0".to_string(),
            ));
        }
        for (i, p) in self.macd.iter().enumerate() {
            if p.fast == 0 || p.slow == 0 || p.signal == 0 {
                return Err(SignalError::InvalidParameter(format!(
                    "MACD[{}] 周期必须大于0",
                    p.name
                )));
            }
            if p.fast >= p.slow {
                return Err(SignalError::InvalidParameter(format!(
                    "MACD[{}] fast({}) 必须小于 slow({})",
                    p.name, p.fast, p.slow
                )));
            }
            if self.macd[..i].iter().any(|q| q.name == p.name) {
                return Err(SignalError::InvalidParameter(format!(
                    "MACD 名称重复: {}",
                    p.name
                )));
            }
        }
        let windows = [
            ("rsi_period", self.rsi_period),
            ("stoch_k_window", self.stoch_k_window),
            ("stoch_d_window", self.stoch_d_window),
            ("mid_channel_window", self.mid_channel_window),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(SignalError::InvalidParameter(format!("{} 必须大于0", name)));
        }
        self.flat_zone.validate()
    }

    /// 所有指标都能在最后一根K线上给出值所需的最少K线数
    pub fn max_warmup(&self) -> usize {
        let ema = self.ema_windows.iter().copied().max().unwrap_or(1);
        let macd = self
            .macd
            .iter()
            .map(|p| p.signal_warmup() + 1)
            .max()
            .unwrap_or(1);
        let rsi = self.rsi_period + 1;
        let stoch = self.stoch_k_window + self.stoch_d_window - 1;
        let mid = self.mid_channel_window + self.mid_channel_shift;
        [ema, macd, rsi, stoch, mid].into_iter().max().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = IndicatorConfig::default();
        assert!(config.validate().is_ok());
        // structural MACD: 104 + 36 - 1
        assert_eq!(config.max_warmup(), 139);
    }

    #[test]
    fn rejects_inverted_macd() {
        let mut config = IndicatorConfig::default();
        config.macd.push(MacdParams::new("bad", 26, 12, 9));
        assert!(matches!(
            config.validate(),
            Err(SignalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_duplicate_macd_names() {
        let mut config = IndicatorConfig::default();
        config.macd.push(MacdParams::new(MACD_NOISE, 5, 10, 3));
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: IndicatorConfig = serde_json::from_str(r#"{"rsi_period": 9}"#).unwrap();
        assert_eq!(config.rsi_period, 9);
        assert_eq!(config.ema_windows, vec![20, 50, 100]);
    }
}
