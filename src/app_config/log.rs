use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, FmtSubscriber, Layer, Registry};

use super::env::env_or_default;

/// 日志输出的 guard，持有期间后台线程持续刷盘
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

// 设置日志
//
// APP_ENV=LOCAL（默认）输出到 stdout，级别取 LOG_LEVEL；
// 其他环境按天滚动写入 log_files/info.log 与 log_files/error.log
pub fn setup_logging() -> anyhow::Result<LogGuards> {
    let app_env = env_or_default("APP_ENV", "LOCAL");

    if app_env == "LOCAL" {
        let level = env_or_default("LOG_LEVEL", "info")
            .parse::<Level>()
            .unwrap_or(Level::INFO);
        // RUST_LOG 优先
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_ansi(true)
            .with_target(false)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .with_writer(std::io::stdout)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(LogGuards { _guards: vec![] });
    }

    let info_file = RollingFileAppender::new(Rotation::DAILY, "log_files", "info.log");
    let error_file = RollingFileAppender::new(Rotation::DAILY, "log_files", "error.log");

    let (info_non_blocking, info_guard) = tracing_appender::non_blocking(info_file);
    let (error_non_blocking, error_guard) = tracing_appender::non_blocking(error_file);

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .with_writer(info_non_blocking)
                .with_filter(EnvFilter::new("info")),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .with_writer(error_non_blocking)
                .with_filter(EnvFilter::new("error")),
        );

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(LogGuards {
        _guards: vec![info_guard, error_guard],
    })
}
