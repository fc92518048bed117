//! Tego FFI - C ABI 导出层
//!
//! 为宿主应用提供 Tor 状态查询与控制的 C 接口
//!
//! 约定：
//! - 每个导出函数最后一个参数是可选的错误出参，失败时写入错误对象并返回哨兵值（0 / null / TEGO_FALSE）
//! - 错误对象通过 `tego_error_delete` 释放，返回的 JSON 字符串通过 `tego_free_string` 释放
//! - 上下文由持有协作者的宿主在 Rust 侧创建：`TegoContextHandle::into_raw(context)`

mod config;
mod context;
mod error;
mod logging;

pub use config::{TegoDaemonConfigHandle, TegoLaunchConfigHandle};
pub use context::TegoContextHandle;
pub use error::TegoErrorHandle;
pub use logging::init_logging;

use error::translate_errors;
use std::ffi::{c_char, CString};
use std::ptr;
use std::sync::OnceLock;
use tego_core::{bootstrap_tag_to_summary, Result, TegoError, TorBootstrapTag, BOOTSTRAP_TAGS};

/// C 侧布尔值（int32），非零即为真
pub type TegoBool = i32;
pub const TEGO_TRUE: TegoBool = 1;
pub const TEGO_FALSE: TegoBool = 0;

// ==================== 启动阶段 ====================

/// 以 NUL 结尾的摘要表，下标与 tag 序号一致
fn summaries() -> &'static [CString] {
    static SUMMARIES: OnceLock<Vec<CString>> = OnceLock::new();
    SUMMARIES.get_or_init(|| {
        BOOTSTRAP_TAGS
            .iter()
            .map(|entry| CString::new(entry.summary).unwrap_or_default())
            .collect()
    })
}

/// 启动阶段 tag → 人类可读摘要，无需上下文
///
/// # 返回
/// - 静态字符串，不需要释放；tag 不在 (invalid, count) 范围内时返回 null
///
/// # Safety
/// - `error` 必须为空或是可写的指针位置
#[no_mangle]
pub unsafe extern "C" fn tego_tor_bootstrap_tag_to_summary(
    tag: i32,
    error: *mut *mut TegoErrorHandle,
) -> *const c_char {
    translate_errors(error, ptr::null(), || {
        bootstrap_tag_to_summary(tag)?;
        let summary = summaries()
            .get(tag as usize)
            .ok_or_else(|| TegoError::invalid_argument(format!("bootstrap tag {} out of range", tag)))?;
        Ok(summary.as_ptr())
    })
}

/// tag 总数（含 invalid）
#[no_mangle]
pub extern "C" fn tego_tor_bootstrap_tag_count() -> i32 {
    TorBootstrapTag::COUNT as i32
}

// ==================== 内存管理 ====================

/// 释放由本库返回的字符串
///
/// # Safety
/// - `s` 必须是本库函数返回的字符串指针
/// - 只能调用一次
#[no_mangle]
pub unsafe extern "C" fn tego_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

// ==================== 版本信息 ====================

/// 获取库版本号
///
/// # 返回
/// - 返回静态版本字符串，不需要释放
#[no_mangle]
pub extern "C" fn tego_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// ==================== 内部辅助函数 ====================

pub(crate) fn json_to_cstring<T: serde::Serialize>(value: &T) -> Result<*mut c_char> {
    let json = serde_json::to_string(value)?;
    let json = CString::new(json).map_err(|_| TegoError::invalid_argument("JSON contains NUL"))?;
    Ok(json.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_summary_for_every_valid_tag() {
        unsafe {
            for tag in 1..tego_tor_bootstrap_tag_count() {
                let mut error = ptr::null_mut();
                let summary = tego_tor_bootstrap_tag_to_summary(tag, &mut error);
                assert!(error.is_null());
                assert!(!CStr::from_ptr(summary).to_bytes().is_empty());
            }

            let summary = tego_tor_bootstrap_tag_to_summary(TorBootstrapTag::Done as i32, ptr::null_mut());
            assert_eq!(CStr::from_ptr(summary).to_str().unwrap(), "Done");
        }
    }

    #[test]
    fn test_summary_rejects_out_of_range() {
        unsafe {
            for tag in [0, -1, tego_tor_bootstrap_tag_count(), 1000] {
                let mut error = ptr::null_mut();
                let summary = tego_tor_bootstrap_tag_to_summary(tag, &mut error);
                assert!(summary.is_null());
                assert!(!error.is_null());
                crate::error::tego_error_delete(error);
            }
        }
    }

    #[test]
    fn test_version() {
        let version = tego_version();
        assert!(!version.is_null());
        unsafe {
            let s = CStr::from_ptr(version).to_str().unwrap();
            assert!(!s.is_empty());
        }
    }
}
