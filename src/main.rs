use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use serde::Serialize;
use tracing::{error, info};

use quant_signal::app_config::log::setup_logging;
use quant_signal::{
    analyze_batch, AnalysisOptions, AnalysisRequest, AnalysisResult, BatchOutcome, CandleSeries,
};

#[derive(Parser, Debug)]
#[command(name = "quant_signal")]
#[command(about = "K线技术分析：趋势、关键价位、背离、平台区", long_about = None)]
struct Cli {
    /// K线 JSON 文件（[{ts,o,h,l,c,v}, ...]），可重复
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// 周期标签，只用于输出
    #[arg(long, default_value = "1H")]
    interval: String,

    /// ZigZag 窗口半宽
    #[arg(long)]
    depth: Option<usize>,

    /// ZigZag 最小反转幅度（百分比）
    #[arg(long)]
    deviation: Option<f64>,

    /// ZigZag 同类 pivot 最小间隔
    #[arg(long)]
    backstep: Option<usize>,

    /// 次级 ZigZag 窗口半宽，0 表示不使用
    #[arg(long)]
    minor_depth: Option<usize>,

    /// AnalysisOptions JSON 文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 最大并发数，默认 CPU 核数
    #[arg(long)]
    workers: Option<usize>,

    /// 格式化输出
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    /// 默认值 < 配置文件 < 环境变量 < 命令行
    fn options(&self) -> anyhow::Result<AnalysisOptions> {
        let base = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("无法打开配置文件 {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("配置文件格式错误 {}", path.display()))?
            }
            None => AnalysisOptions::default(),
        };

        let mut options = AnalysisOptions::from_env(base);
        if let Some(depth) = self.depth {
            options.zigzag.depth = depth;
        }
        if let Some(deviation) = self.deviation {
            options.zigzag.deviation_pct = deviation;
        }
        if let Some(backstep) = self.backstep {
            options.zigzag.backstep = backstep;
        }
        if let Some(depth) = self.minor_depth {
            options.minor_zigzag = options.minor_zigzag_with_depth(depth);
        }
        options.validate()?;
        Ok(options)
    }
}

/// 每个输入文件一条输出
#[derive(Serialize)]
struct Report<'a> {
    symbol: &'a str,
    interval: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn symbol_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _log_guards = setup_logging()?;

    let cli = Cli::parse();
    let options = cli.options()?;
    info!(
        "分析参数: zigzag={:?}, minor={:?}, stale_after={}",
        options.zigzag, options.minor_zigzag, options.trend.stale_after
    );

    // 读取失败的文件直接记为失败，不影响其他文件
    let mut requests = Vec::new();
    let mut failed: Vec<(usize, BatchOutcome)> = Vec::new();
    for (i, path) in cli.input.iter().enumerate() {
        let symbol = symbol_of(path);
        match CandleSeries::from_json_file(path) {
            Ok(candles) => requests.push((i, AnalysisRequest::new(symbol, &cli.interval, candles))),
            Err(e) => {
                error!("读取K线失败 {}: {}", path.display(), e);
                failed.push((
                    i,
                    BatchOutcome {
                        symbol,
                        interval: cli.interval.clone(),
                        result: Err(e.to_string()),
                    },
                ));
            }
        }
    }

    let (positions, requests): (Vec<usize>, Vec<AnalysisRequest>) = requests.into_iter().unzip();
    let outcomes = analyze_batch(requests, options, cli.workers).await;

    let mut all: Vec<(usize, BatchOutcome)> = positions.into_iter().zip(outcomes).collect();
    all.extend(failed);
    all.sort_by_key(|(i, _)| *i);

    for (_, outcome) in &all {
        let report = Report {
            symbol: &outcome.symbol,
            interval: &outcome.interval,
            result: outcome.result.as_ref().ok(),
            error: outcome.result.as_ref().err().map(String::as_str),
        };
        let json = if cli.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", json);
    }
    Ok(())
}
