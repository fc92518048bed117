//! 上下文句柄与 Tor 相关导出

use crate::config::{TegoDaemonConfigHandle, TegoLaunchConfigHandle};
use crate::error::{translate_errors, TegoErrorHandle};
use crate::{json_to_cstring, TegoBool};
use std::ffi::{c_char, CString};
use std::ptr;
use std::slice;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tego_core::{
    Context, Result, TegoError, TorBootstrapTag, TorControlStatus, TorNetworkStatus,
    TorProcessStatus,
};

/// 不透明上下文句柄
///
/// 由持有协作者的宿主在 Rust 侧创建（`into_raw`），C 侧通过 `tego_context_delete` 释放。
pub struct TegoContextHandle {
    inner: Mutex<Context>,
    /// 返回给 C 的版本字符串，与句柄同生命周期
    version: OnceLock<CString>,
}

impl TegoContextHandle {
    pub fn new(context: Context) -> Self {
        Self {
            inner: Mutex::new(context),
            version: OnceLock::new(),
        }
    }

    pub fn into_raw(context: Context) -> *mut TegoContextHandle {
        Box::into_raw(Box::new(Self::new(context)))
    }

    /// 协作者 panic 后锁会中毒；`Context` 不会处于半更新状态，直接取回 guard
    fn lock(&self) -> MutexGuard<'_, Context> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

unsafe fn context_ref<'a>(context: *const TegoContextHandle) -> Result<&'a TegoContextHandle> {
    context.as_ref().ok_or(TegoError::NullArgument("context"))
}

fn require<T>(out: *mut T, name: &'static str) -> Result<()> {
    if out.is_null() {
        return Err(TegoError::NullArgument(name));
    }
    Ok(())
}

// ==================== 生命周期 ====================

/// 释放上下文
///
/// # Safety
/// - `context` 必须为空或是 `TegoContextHandle::into_raw` 返回的句柄，只能释放一次
#[no_mangle]
pub unsafe extern "C" fn tego_context_delete(context: *mut TegoContextHandle) {
    if !context.is_null() {
        let _ = Box::from_raw(context);
    }
}

/// 启动 Tor 守护进程，立即返回；通过进程状态与启动进度轮询结果
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `launch_config` 必须是有效的启动配置句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_start_tor(
    context: *mut TegoContextHandle,
    launch_config: *const TegoLaunchConfigHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        let config = launch_config.as_ref().map(|handle| &handle.config);
        context.lock().start_tor(config)
    })
}

/// 停止 Tor 守护进程
///
/// # Safety
/// - `context` 必须是有效句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_stop_tor(
    context: *mut TegoContextHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || context_ref(context)?.lock().stop_tor())
}

/// 守护进程是否已有可用配置
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `out_configured` 必须可写
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_daemon_configured(
    context: *const TegoContextHandle,
    out_configured: *mut TegoBool,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        require(out_configured, "out_configured")?;
        *out_configured = context.lock().tor_daemon_configured()?.into();
        Ok(())
    })
}

// ==================== 日志 ====================

/// 所有日志行长度 + 1 之和
///
/// # Safety
/// - `context` 必须是有效句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_logs_size(
    context: *const TegoContextHandle,
    error: *mut *mut TegoErrorHandle,
) -> usize {
    translate_errors(error, 0, || context_ref(context)?.lock().tor_logs_size())
}

/// 把日志按 `\n` 分隔写入缓冲区，最后一个写入字节总是 NUL
///
/// # 返回
/// - 写入字节数（含 NUL）；失败返回 0
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `out_log_buffer` 指向至少 `log_buffer_size` 字节的可写内存
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_logs(
    context: *const TegoContextHandle,
    out_log_buffer: *mut c_char,
    log_buffer_size: usize,
    error: *mut *mut TegoErrorHandle,
) -> usize {
    translate_errors(error, 0, || {
        let context = context_ref(context)?;
        require(out_log_buffer, "out_log_buffer")?;
        if log_buffer_size == 0 {
            return Err(TegoError::invalid_argument(
                "log buffer capacity must be at least 1",
            ));
        }
        let buffer = slice::from_raw_parts_mut(out_log_buffer as *mut u8, log_buffer_size);
        context.lock().copy_tor_logs(buffer)
    })
}

/// Tor 版本字符串，首次查询后缓存，生命周期与上下文相同
///
/// # Safety
/// - `context` 必须是有效句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_version_string(
    context: *const TegoContextHandle,
    error: *mut *mut TegoErrorHandle,
) -> *const c_char {
    translate_errors(error, ptr::null(), || {
        let context = context_ref(context)?;
        if let Some(version) = context.version.get() {
            return Ok(version.as_ptr());
        }

        let version = context.lock().tor_version()?.to_string();
        let version = CString::new(version)
            .map_err(|_| TegoError::invalid_argument("tor version contains NUL"))?;
        let cached = context.version.get_or_init(|| version);
        Ok(cached.as_ptr())
    })
}

// ==================== 状态 ====================

/// 控制通道状态
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `out_status` 必须可写
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_control_status(
    context: *const TegoContextHandle,
    out_status: *mut TorControlStatus,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        require(out_status, "out_status")?;
        *out_status = context.lock().tor_control_status()?;
        Ok(())
    })
}

/// 守护进程状态；连接外部守护进程时为 `External`
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `out_status` 必须可写
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_process_status(
    context: *const TegoContextHandle,
    out_status: *mut TorProcessStatus,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        require(out_status, "out_status")?;
        *out_status = context.lock().tor_process_status()?;
        Ok(())
    })
}

/// Tor 网络状态
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `out_status` 必须可写
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_network_status(
    context: *const TegoContextHandle,
    out_status: *mut TorNetworkStatus,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        require(out_status, "out_status")?;
        *out_status = context.lock().tor_network_status()?;
        Ok(())
    })
}

/// 启动进度（0-100）与当前阶段 tag
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `out_progress` 与 `out_tag` 必须可写
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_bootstrap_status(
    context: *const TegoContextHandle,
    out_progress: *mut i32,
    out_tag: *mut TorBootstrapTag,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        require(out_progress, "out_progress")?;
        require(out_tag, "out_tag")?;

        let (progress, tag) = context.lock().tor_bootstrap_status()?;

        *out_progress = progress;
        *out_tag = tag;
        Ok(())
    })
}

/// 当前状态快照（JSON）
///
/// # 返回
/// - 成功：JSON 字符串，调用者通过 `tego_free_string` 释放
/// - 失败：null
///
/// # Safety
/// - `context` 必须是有效句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_get_tor_status_json(
    context: *const TegoContextHandle,
    error: *mut *mut TegoErrorHandle,
) -> *mut c_char {
    translate_errors(error, ptr::null_mut(), || {
        let snapshot = context_ref(context)?.lock().status_snapshot()?;
        json_to_cstring(&snapshot)
    })
}

// ==================== 配置 ====================

/// 把稀疏配置合并进运行中守护进程的配置
///
/// # Safety
/// - `context` 必须是有效句柄
/// - `daemon_config` 必须是有效的守护进程配置句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_update_tor_daemon_config(
    context: *mut TegoContextHandle,
    daemon_config: *const TegoDaemonConfigHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let context = context_ref(context)?;
        let config = daemon_config.as_ref().map(|handle| &handle.config);
        context.lock().update_tor_daemon_config(config)
    })
}

/// 持久化守护进程当前配置
///
/// # Safety
/// - `context` 必须是有效句柄
#[no_mangle]
pub unsafe extern "C" fn tego_context_save_tor_daemon_config(
    context: *mut TegoContextHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        context_ref(context)?.lock().save_tor_daemon_config()
    })
}
