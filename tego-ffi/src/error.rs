//! 错误边界
//!
//! 所有导出函数都在 `translate_errors` 中执行：内部错误与 panic 都会被捕获，
//! 转换为错误对象写入出参，并返回约定的哨兵值。

use std::any::Any;
use std::ffi::{c_char, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tego_core::{Result, TegoError, TegoErrorCode};
use tracing::warn;

/// 错误对象，需通过 `tego_error_delete` 释放
#[derive(Debug)]
pub struct TegoErrorHandle {
    code: TegoErrorCode,
    message: CString,
}

impl TegoErrorHandle {
    fn new(code: TegoErrorCode, message: &str) -> Self {
        let message = CString::new(message.replace('\0', "\\0")).unwrap_or_default();
        Self { code, message }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(TegoErrorCode::Panic, &format!("panic: {}", message))
    }

    pub fn code(&self) -> TegoErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        self.message.to_str().unwrap_or_default()
    }
}

impl From<&TegoError> for TegoErrorHandle {
    fn from(err: &TegoError) -> Self {
        Self::new(err.code(), &err.to_string())
    }
}

/// 在边界内执行 `body`；失败时写出错误对象（`error` 非空时）并返回 `sentinel`
pub(crate) fn translate_errors<T, F>(error: *mut *mut TegoErrorHandle, sentinel: T, body: F) -> T
where
    F: FnOnce() -> Result<T>,
{
    let handle = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => return value,
        Ok(Err(err)) => {
            warn!(code = ?err.code(), "FFI call failed: {}", err);
            TegoErrorHandle::from(&err)
        }
        Err(payload) => {
            let handle = TegoErrorHandle::from_panic(payload);
            warn!("FFI call panicked: {}", handle.message());
            handle
        }
    };

    if !error.is_null() {
        // SAFETY: 调用方保证 `error` 指向可写的指针位置
        unsafe {
            *error = Box::into_raw(Box::new(handle));
        }
    }
    sentinel
}

// ==================== 导出 ====================

/// 获取错误码
///
/// # Safety
/// - `error` 必须为空或是本库写出的错误对象
#[no_mangle]
pub unsafe extern "C" fn tego_error_get_code(error: *const TegoErrorHandle) -> TegoErrorCode {
    if error.is_null() {
        return TegoErrorCode::NullArgument;
    }
    (*error).code
}

/// 获取错误消息，生命周期与错误对象相同
///
/// # Safety
/// - `error` 必须为空或是本库写出的错误对象
#[no_mangle]
pub unsafe extern "C" fn tego_error_get_message(error: *const TegoErrorHandle) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }
    (*error).message.as_ptr()
}

/// 释放错误对象
///
/// # Safety
/// - `error` 必须为空或是本库写出的错误对象，且只能释放一次
#[no_mangle]
pub unsafe extern "C" fn tego_error_delete(error: *mut TegoErrorHandle) {
    if !error.is_null() {
        let _ = Box::from_raw(error);
    }
}
