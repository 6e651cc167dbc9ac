use serde::{Deserialize, Serialize};

/// 与K线逐根对齐的指标序列
///
/// `None` 表示预热期内尚未定义的值，调用方不能把它当作 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// 由原始输出构造，前 `warmup` 个值置为未定义
    pub fn from_raw(name: impl Into<String>, raw: Vec<f64>, warmup: usize) -> Self {
        let values = raw
            .into_iter()
            .enumerate()
            .map(|(i, x)| if i < warmup || !x.is_finite() { None } else { Some(x) })
            .collect();
        Self::new(name, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_is_undefined_not_zero() {
        let s = IndicatorSeries::from_raw("ema3", vec![1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(1), None);
        assert_eq!(s.get(2), Some(3.0));
        assert_eq!(s.first_defined(), Some(2));
        assert_eq!(s.defined_count(), 2);
        assert_eq!(s.get(10), None);
    }

    #[test]
    fn nan_is_undefined() {
        let s = IndicatorSeries::from_raw("x", vec![1.0, f64::NAN], 0);
        assert_eq!(s.last(), None);
    }
}
