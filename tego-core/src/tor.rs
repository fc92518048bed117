//! 协作者能力接口
//!
//! 进程管理器与控制通道由宿主应用实现并注入，本 crate 只负责驱动和查询。
//! 后台 I/O（进程监控、控制端口读取）都归协作者所有，这里的查询只读取快照。

use crate::config::ConfigPatch;
use std::path::Path;
use std::sync::Arc;

/// 协作者调用的返回类型；宿主通过 `tego_core::anyhow` 构造错误，无需自行依赖 anyhow
pub type CollaboratorResult<T> = anyhow::Result<T>;

/// 协作者报告的进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Failed,
    NotStarted,
    Starting,
    Connecting,
    Ready,
    /// 较新的守护进程可能报告未知状态码
    Unrecognized(i32),
}

/// 协作者报告的控制通道状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Error,
    NotConnected,
    Connecting,
    Authenticating,
    Connected,
    Unrecognized(i32),
}

/// 协作者报告的 Tor 网络状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Unknown,
    Offline,
    Ready,
    Unrecognized(i32),
}

/// 进程管理器
pub trait TorManager: Send + Sync {
    /// 设置数据目录（torrc、缓存等）
    fn set_data_directory(&self, path: &Path) -> CollaboratorResult<()>;

    /// 请求启动进程，异步进行，不等待就绪
    fn start(&self) -> CollaboratorResult<()>;

    fn stop(&self) -> CollaboratorResult<()>;

    /// 是否还需要用户配置
    fn configuration_needed(&self) -> bool;

    /// 本适配器启动的进程；连接外部守护进程时为 None
    fn process(&self) -> Option<Arc<dyn TorProcess>>;

    /// 已产生的日志条数
    fn log_message_count(&self) -> usize;

    /// 从 `start` 开始的日志条目
    fn log_messages_from(&self, start: usize) -> Vec<String>;
}

/// 被管理的守护进程
pub trait TorProcess: Send + Sync {
    fn state(&self) -> ProcessState;
}

/// 控制通道
pub trait TorControl: Send + Sync {
    fn status(&self) -> ControlState;

    fn tor_status(&self) -> NetworkState;

    /// 当前启动状态快照，包含 `"tag"`（字符串）与 `"progress"`（整数）
    fn bootstrap_status(&self) -> serde_json::Value;

    fn tor_version(&self) -> CollaboratorResult<String>;

    /// 一次性提交配置补丁
    fn set_configuration(&self, patch: &ConfigPatch) -> CollaboratorResult<()>;

    /// 持久化当前配置
    fn save_configuration(&self) -> CollaboratorResult<()>;
}
