//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 按 `RUST_LOG` 初始化日志；未设置时 `verbose` 为真用 `debug`，否则 `info`
pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
