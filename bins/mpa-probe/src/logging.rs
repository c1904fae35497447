//! 日志初始化.
//!
//! 探测结果写 stdout, 日志写 stderr 与 `logs/{prefix}.{date}.log`.
//! 库里的 `log` 宏经 tracing-log 桥接进来.

use anyhow::{Context, Result};
use chrono::Local;
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const LOG_DIR: &str = "logs";

/// 设置后覆盖文件日志的过滤规则, 语法同 `RUST_LOG`
const LOG_ENV: &str = "MPA_LOG";

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 注册全局订阅者
///
/// stderr 默认只显示 warn 及以上, 文件默认 info. `verbosity` 每加一级
/// 两路同时放宽一级; `quiet` 时 stderr 只剩 error.
pub fn init(file_prefix: &str, verbosity: u8, quiet: bool) -> Result<()> {
    std::fs::create_dir_all(LOG_DIR).context("创建日志目录失败")?;
    let appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build(LOG_DIR)
        .context("创建日志文件失败")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let stderr_filter = EnvFilter::new(if quiet {
        "error"
    } else {
        level_for(verbosity, "warn")
    });
    let file_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity, "info")));

    Registry::default()
        .with(
            fmt::Layer::default()
                .with_writer(std::io::stderr)
                .event_format(LineFormat::STDERR)
                .with_filter(stderr_filter),
        )
        .with(
            fmt::Layer::default()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(LineFormat::FILE)
                .with_filter(file_filter),
        )
        .try_init()
        .context("注册日志订阅者失败")
}

fn level_for(verbosity: u8, default: &'static str) -> &'static str {
    match verbosity {
        0 => default,
        1 => "debug",
        _ => "trace",
    }
}

/// 单行日志格式
struct LineFormat {
    /// chrono 时间格式
    clock: &'static str,
    colored: bool,
    with_target: bool,
}

impl LineFormat {
    /// `12:00:00.123 WARN  消息`, 级别着色
    const STDERR: Self = Self {
        clock: "%H:%M:%S%.3f",
        colored: true,
        with_target: false,
    };

    /// `2026-01-01 12:00:00.123 INFO  mpa_format::reader 消息`
    const FILE: Self = Self {
        clock: "%Y-%m-%d %H:%M:%S%.3f",
        colored: false,
        with_target: true,
    };
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[36m",
        Level::TRACE => "\x1b[90m",
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write!(writer, "{} ", Local::now().format(self.clock))?;
        if self.colored {
            write!(writer, "{}{:<5}\x1b[0m ", level_color(*meta.level()), meta.level())?;
        } else {
            write!(writer, "{:<5} ", meta.level())?;
        }
        if self.with_target {
            write!(writer, "{} ", meta.target())?;
        }
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_日志级别() {
        assert_eq!(level_for(0, "warn"), "warn");
        assert_eq!(level_for(0, "info"), "info");
        assert_eq!(level_for(1, "warn"), "debug");
        assert_eq!(level_for(2, "info"), "trace");
        assert_eq!(level_for(5, "info"), "trace");
    }

    #[test]
    fn test_时间格式() {
        let stamp = Local::now().format(LineFormat::FILE.clock).to_string();
        assert_eq!(stamp.len(), "2026-01-01 12:00:00.123".len());
        let stamp = Local::now().format(LineFormat::STDERR.clock).to_string();
        assert_eq!(stamp.len(), "12:00:00.123".len());
    }
}
