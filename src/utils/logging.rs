//! # 日志初始化
//!
//! 初始化 `tracing-subscriber`，事件输出到 stderr，不与进度条和结果表格混在 stdout。
//!
//! ## 依赖关系
//! - 在 `main.rs` 中调用一次
//! - 使用 `tracing-subscriber` 的 EnvFilter

use crate::error::{Result, SgdiError};

use tracing_subscriber::EnvFilter;

/// 覆盖日志级别的环境变量
pub const LOG_ENV: &str = "SGDI_LOG";

/// 由 `-v` 次数得到默认级别
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// 初始化全局订阅者，`SGDI_LOG` 优先于 `-v`
pub fn init(verbosity: u8) -> Result<()> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| SgdiError::Other(format!("failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(7), "trace");
    }
}
