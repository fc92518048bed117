//! 日志初始化
//!
//! 过滤规则取自环境变量 `TEGO_LOG`（语法同 `RUST_LOG`），默认 `info`。

use crate::error::{translate_errors, TegoErrorHandle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TEGO_LOG";

/// 安装全局 fmt subscriber；已安装时返回 false
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        debug!("Logging initialized");
    }
    installed
}

/// 初始化日志，可重复调用
///
/// # Safety
/// - `error` 必须为空或是可写的指针位置
#[no_mangle]
pub unsafe extern "C" fn tego_initialize_logging(error: *mut *mut TegoErrorHandle) {
    translate_errors(error, (), || {
        init_logging();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_initialize_twice() {
        unsafe {
            let mut error = ptr::null_mut();
            tego_initialize_logging(&mut error);
            tego_initialize_logging(&mut error);
            assert!(error.is_null());
        }
        assert!(!init_logging());
    }
}
