pub mod candle;
pub mod indicator_series;

pub use candle::{Candle, CandleBuilder, CandleSeries};
pub use indicator_series::IndicatorSeries;
