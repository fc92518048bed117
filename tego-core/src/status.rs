//! 状态映射
//!
//! 把协作者报告的状态转换为对外稳定的枚举。纯函数，无状态、无 I/O。

use crate::tor::{ControlState, NetworkState, ProcessState};
use serde::Serialize;

/// 守护进程状态
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TorProcessStatus {
    Unknown = 0,
    /// 控制通道连接的是外部管理的守护进程
    External = 1,
    NotStarted = 2,
    Starting = 3,
    Running = 4,
    Failed = 5,
}

/// 控制通道状态
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TorControlStatus {
    Error = -1,
    NotConnected = 0,
    Connecting = 1,
    Authenticating = 2,
    Connected = 3,
    Unknown = 4,
}

/// Tor 网络连接状态
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TorNetworkStatus {
    Unknown = 0,
    Ready = 1,
    Offline = 2,
}

/// 进程状态映射。没有进程对象时调用方应使用 `External`。
///
/// `Connecting` 归入 `Running`：握手细节由控制通道状态单独报告。
pub fn translate_process_state(state: ProcessState) -> TorProcessStatus {
    match state {
        ProcessState::Failed => TorProcessStatus::Failed,
        ProcessState::NotStarted => TorProcessStatus::NotStarted,
        ProcessState::Starting => TorProcessStatus::Starting,
        ProcessState::Connecting | ProcessState::Ready => TorProcessStatus::Running,
        ProcessState::Unrecognized(_) => TorProcessStatus::Unknown,
    }
}

pub fn translate_control_state(state: ControlState) -> TorControlStatus {
    match state {
        ControlState::Error => TorControlStatus::Error,
        ControlState::NotConnected => TorControlStatus::NotConnected,
        ControlState::Connecting => TorControlStatus::Connecting,
        ControlState::Authenticating => TorControlStatus::Authenticating,
        ControlState::Connected => TorControlStatus::Connected,
        ControlState::Unrecognized(_) => TorControlStatus::Unknown,
    }
}

pub fn translate_network_state(state: NetworkState) -> TorNetworkStatus {
    match state {
        NetworkState::Offline => TorNetworkStatus::Offline,
        NetworkState::Ready => TorNetworkStatus::Ready,
        NetworkState::Unknown | NetworkState::Unrecognized(_) => TorNetworkStatus::Unknown,
    }
}
