use std::env;
use std::str::FromStr;

use tracing::warn;

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

/// 读取并解析环境变量；不存在或解析失败时返回默认值（解析失败会打 warn）
pub fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(key) {
        Ok(v) => match v.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("环境变量 {} 的值无法解析: {:?}, 使用默认值", key, v);
                default
            }
        },
        Err(_) => default,
    }
}

/// 读取可选的解析值：不存在或解析失败时为 None
pub fn env_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    let v = env::var(key).ok()?;
    match v.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("环境变量 {} 的值无法解析: {:?}, 忽略", key, v);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 每个测试使用独立的变量名，避免并行测试互相影响
    #[test]
    fn parse_or_falls_back_on_garbage() {
        env::set_var("QS_TEST_PARSE_OR", "not-a-number");
        assert_eq!(env_parse_or("QS_TEST_PARSE_OR", 7usize), 7);
        env::set_var("QS_TEST_PARSE_OR", " 12 ");
        assert_eq!(env_parse_or("QS_TEST_PARSE_OR", 7usize), 12);
        env::remove_var("QS_TEST_PARSE_OR");
    }

    #[test]
    fn missing_parse_is_none() {
        assert_eq!(env_parse::<f64>("QS_TEST_MISSING_VALUE"), None);
        assert_eq!(env_or_default("QS_TEST_MISSING_VALUE", "x"), "x");
    }
}
