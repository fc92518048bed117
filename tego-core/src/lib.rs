//! Tego Core - Tor 守护进程状态跟踪与控制适配层
//!
//! 位于 Tor 进程管理器 / 控制通道与上层应用之间：
//! - 把守护进程内部状态映射为稳定的对外枚举
//! - 把不断增长的日志流聚合进调用方缓冲区
//! - 把稀疏的用户配置合并进守护进程的实时配置

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod error;
pub mod logs;
pub mod status;
pub mod tor;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use bootstrap::{bootstrap_tag_to_summary, BootstrapTagEntry, TorBootstrapTag, BOOTSTRAP_TAGS};
pub use config::{ConfigPatch, ConfigValue, DaemonConfig, LaunchConfig, ProxyConfig, CONFIG_KEYS};
pub use context::{Context, StatusSnapshot};
pub use error::{Result, TegoError, TegoErrorCode};
pub use logs::LogAggregator;
pub use status::{TorControlStatus, TorNetworkStatus, TorProcessStatus};
pub use tor::{
    CollaboratorResult, ControlState, NetworkState, ProcessState, TorControl, TorManager, TorProcess,
};

pub use anyhow;
