//! 多品种/多周期并行分析
//!
//! 每个请求在 blocking 线程池里独立计算，并发数由信号量限制。

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::report::{analyze_with, AnalysisOptions, AnalysisResult};
use crate::types::CandleSeries;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub interval: String,
    pub candles: CandleSeries,
}

impl AnalysisRequest {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        candles: CandleSeries,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            candles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub symbol: String,
    pub interval: String,
    /// 成功为分析结果，失败为错误信息
    pub result: std::result::Result<AnalysisResult, String>,
}

/// 默认并发：CPU 核数
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// 并行分析，结果顺序与请求顺序一致；单个请求失败不影响其他请求
pub async fn analyze_batch(
    requests: Vec<AnalysisRequest>,
    options: AnalysisOptions,
    max_workers: Option<usize>,
) -> Vec<BatchOutcome> {
    let workers = max_workers.unwrap_or_else(default_workers).max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    let options = Arc::new(options);

    let tasks = requests.into_iter().map(|request| {
        let semaphore = Arc::clone(&semaphore);
        let options = Arc::clone(&options);
        async move {
            let symbol = request.symbol.clone();
            let interval = request.interval.clone();

            let result = match semaphore.acquire_owned().await {
                Ok(permit) => {
                    let handle = tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        analyze_with(&request.candles, &options)
                    });
                    match handle.await {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(e) => Err(format!("分析任务异常退出: {}", e)),
                    }
                }
                Err(e) => Err(format!("获取并发许可失败: {}", e)),
            };

            match &result {
                Ok(r) => info!(
                    "分析完成: {} {} trend={} insufficient_data={}",
                    symbol, interval, r.trend.label, r.insufficient_data
                ),
                Err(e) => error!("分析失败: {} {}: {}", symbol, interval, e),
            }
            BatchOutcome {
                symbol,
                interval,
                result,
            }
        }
    });

    join_all(tasks).await
}
