//! 启动配置 / 守护进程配置句柄

use crate::error::{translate_errors, TegoErrorHandle};
use crate::{TegoBool, TEGO_FALSE};
use std::ffi::{c_char, CStr};
use std::slice;
use tego_core::{DaemonConfig, LaunchConfig, ProxyConfig, Result, TegoError};

/// 启动配置句柄
pub struct TegoLaunchConfigHandle {
    pub(crate) config: LaunchConfig,
}

/// 守护进程配置句柄
pub struct TegoDaemonConfigHandle {
    pub(crate) config: DaemonConfig,
}

/// (指针, 长度) → &str；长度为 0 时允许空指针
pub(crate) unsafe fn str_from_parts<'a>(
    data: *const c_char,
    len: usize,
    name: &'static str,
) -> Result<&'a str> {
    if len == 0 {
        return Ok("");
    }
    if data.is_null() {
        return Err(TegoError::NullArgument(name));
    }
    let bytes = slice::from_raw_parts(data as *const u8, len);
    std::str::from_utf8(bytes).map_err(|_| TegoError::InvalidUtf8(name))
}

unsafe fn launch_config_mut<'a>(
    config: *mut TegoLaunchConfigHandle,
) -> Result<&'a mut TegoLaunchConfigHandle> {
    config.as_mut().ok_or(TegoError::NullArgument("launch config"))
}

unsafe fn daemon_config_mut<'a>(
    config: *mut TegoDaemonConfigHandle,
) -> Result<&'a mut TegoDaemonConfigHandle> {
    config.as_mut().ok_or(TegoError::NullArgument("daemon config"))
}

// ==================== 启动配置 ====================

/// 创建启动配置，数据目录默认取自 `TEGO_TOR_DATA_DIRECTORY`
///
/// # Safety
/// - `out_config` 必须是可写的指针位置
/// - 返回的句柄需要通过 `tego_tor_launch_config_delete` 释放
#[no_mangle]
pub unsafe extern "C" fn tego_tor_launch_config_initialize(
    out_config: *mut *mut TegoLaunchConfigHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        if out_config.is_null() {
            return Err(TegoError::NullArgument("out_config"));
        }
        let handle = TegoLaunchConfigHandle {
            config: LaunchConfig::from_env(),
        };
        *out_config = Box::into_raw(Box::new(handle));
        Ok(())
    })
}

/// 设置数据目录
///
/// # Safety
/// - `config` 必须是有效句柄
/// - `data_directory` 指向 `data_directory_length` 字节的 UTF-8 数据（不含 NUL）
#[no_mangle]
pub unsafe extern "C" fn tego_tor_launch_config_set_data_directory(
    config: *mut TegoLaunchConfigHandle,
    data_directory: *const c_char,
    data_directory_length: usize,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let handle = launch_config_mut(config)?;
        if data_directory.is_null() {
            return Err(TegoError::NullArgument("data_directory"));
        }
        let path = str_from_parts(data_directory, data_directory_length, "data_directory")?;
        handle.config = LaunchConfig::new(path);
        Ok(())
    })
}

/// 释放启动配置
///
/// # Safety
/// - `config` 必须为空或是 `tego_tor_launch_config_initialize` 返回的句柄，只能释放一次
#[no_mangle]
pub unsafe extern "C" fn tego_tor_launch_config_delete(config: *mut TegoLaunchConfigHandle) {
    if !config.is_null() {
        let _ = Box::from_raw(config);
    }
}

// ==================== 守护进程配置 ====================

/// 创建空的守护进程配置（所有字段未指定）
///
/// # Safety
/// - `out_config` 必须是可写的指针位置
/// - 返回的句柄需要通过 `tego_tor_daemon_config_delete` 释放
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_initialize(
    out_config: *mut *mut TegoDaemonConfigHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        if out_config.is_null() {
            return Err(TegoError::NullArgument("out_config"));
        }
        let handle = TegoDaemonConfigHandle {
            config: DaemonConfig::default(),
        };
        *out_config = Box::into_raw(Box::new(handle));
        Ok(())
    })
}

/// 从 JSON 创建守护进程配置，缺失的字段保持未指定
///
/// # Safety
/// - `json` 必须是有效的 UTF-8 C 字符串
/// - `out_config` 必须是可写的指针位置
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_from_json(
    json: *const c_char,
    out_config: *mut *mut TegoDaemonConfigHandle,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        if json.is_null() {
            return Err(TegoError::NullArgument("json"));
        }
        if out_config.is_null() {
            return Err(TegoError::NullArgument("out_config"));
        }
        let text = CStr::from_ptr(json)
            .to_str()
            .map_err(|_| TegoError::InvalidUtf8("json"))?;
        let config: DaemonConfig = serde_json::from_str(text)?;
        config.validate()?;
        *out_config = Box::into_raw(Box::new(TegoDaemonConfigHandle { config }));
        Ok(())
    })
}

/// 设置 DisableNetwork，非零表示禁用网络
///
/// # Safety
/// - `config` 必须是有效句柄
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_set_disable_network(
    config: *mut TegoDaemonConfigHandle,
    disable_network: TegoBool,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        daemon_config_mut(config)?.config.disable_network = Some(disable_network != TEGO_FALSE);
        Ok(())
    })
}

/// 使用 SOCKS4 代理，地址不能为空，端口不能为 0；校验失败时保留原有设置
///
/// # Safety
/// - `config` 必须是有效句柄
/// - `address` 指向 `address_length` 字节的 UTF-8 数据
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_set_proxy_socks4(
    config: *mut TegoDaemonConfigHandle,
    address: *const c_char,
    address_length: usize,
    port: u16,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let handle = daemon_config_mut(config)?;
        let address = str_from_parts(address, address_length, "address")?;
        let proxy = ProxyConfig::Socks4 {
            address: address.to_string(),
            port,
        };
        proxy.validate()?;
        handle.config.proxy = Some(proxy);
        Ok(())
    })
}

/// 使用 SOCKS5 代理，用户名 / 密码可为空（长度为 0）
///
/// # Safety
/// - `config` 必须是有效句柄
/// - 每个字符串指针指向对应长度的 UTF-8 数据，长度为 0 时可为空指针
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn tego_tor_daemon_config_set_proxy_socks5(
    config: *mut TegoDaemonConfigHandle,
    address: *const c_char,
    address_length: usize,
    port: u16,
    username: *const c_char,
    username_length: usize,
    password: *const c_char,
    password_length: usize,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let handle = daemon_config_mut(config)?;
        let proxy = ProxyConfig::Socks5 {
            address: str_from_parts(address, address_length, "address")?.to_string(),
            port,
            username: str_from_parts(username, username_length, "username")?.to_string(),
            password: str_from_parts(password, password_length, "password")?.to_string(),
        };
        proxy.validate()?;
        handle.config.proxy = Some(proxy);
        Ok(())
    })
}

/// 使用 HTTPS 代理，用户名 / 密码可为空（长度为 0）
///
/// # Safety
/// - `config` 必须是有效句柄
/// - 每个字符串指针指向对应长度的 UTF-8 数据，长度为 0 时可为空指针
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn tego_tor_daemon_config_set_proxy_https(
    config: *mut TegoDaemonConfigHandle,
    address: *const c_char,
    address_length: usize,
    port: u16,
    username: *const c_char,
    username_length: usize,
    password: *const c_char,
    password_length: usize,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let handle = daemon_config_mut(config)?;
        let proxy = ProxyConfig::Https {
            address: str_from_parts(address, address_length, "address")?.to_string(),
            port,
            username: str_from_parts(username, username_length, "username")?.to_string(),
            password: str_from_parts(password, password_length, "password")?.to_string(),
        };
        proxy.validate()?;
        handle.config.proxy = Some(proxy);
        Ok(())
    })
}

/// 设置防火墙允许的端口
///
/// # Safety
/// - `config` 必须是有效句柄
/// - `ports` 指向 `ports_count` 个 u16，数量为 0 时可为空指针
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_set_allowed_ports(
    config: *mut TegoDaemonConfigHandle,
    ports: *const u16,
    ports_count: usize,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let handle = daemon_config_mut(config)?;
        if ports_count == 0 {
            handle.config.allowed_ports.clear();
            return Ok(());
        }
        if ports.is_null() {
            return Err(TegoError::NullArgument("ports"));
        }
        handle.config.allowed_ports = slice::from_raw_parts(ports, ports_count).to_vec();
        Ok(())
    })
}

/// 设置网桥列表
///
/// # Safety
/// - `config` 必须是有效句柄
/// - `bridges` 与 `bridge_lengths` 各指向 `bridge_count` 个元素，数量为 0 时可为空指针
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_set_bridges(
    config: *mut TegoDaemonConfigHandle,
    bridges: *const *const c_char,
    bridge_lengths: *const usize,
    bridge_count: usize,
    error: *mut *mut TegoErrorHandle,
) {
    translate_errors(error, (), || {
        let handle = daemon_config_mut(config)?;
        if bridge_count == 0 {
            handle.config.bridges.clear();
            return Ok(());
        }
        if bridges.is_null() {
            return Err(TegoError::NullArgument("bridges"));
        }
        if bridge_lengths.is_null() {
            return Err(TegoError::NullArgument("bridge_lengths"));
        }

        let pointers = slice::from_raw_parts(bridges, bridge_count);
        let lengths = slice::from_raw_parts(bridge_lengths, bridge_count);
        let parsed = pointers
            .iter()
            .zip(lengths)
            .map(|(bridge, len)| str_from_parts(*bridge, *len, "bridge").map(str::to_string))
            .collect::<Result<Vec<_>>>()?;

        handle.config.bridges = parsed;
        Ok(())
    })
}

/// 释放守护进程配置
///
/// # Safety
/// - `config` 必须为空或是本库创建的句柄，只能释放一次
#[no_mangle]
pub unsafe extern "C" fn tego_tor_daemon_config_delete(config: *mut TegoDaemonConfigHandle) {
    if !config.is_null() {
        let _ = Box::from_raw(config);
    }
}
