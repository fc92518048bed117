//! Tor 上下文
//!
//! 持有协作者句柄（不拥有其生命周期），本地缓存日志副本与版本字符串。
//! 状态查询每次都从协作者取最新值，不做缓存。
//!
//! 内部没有同步：跨线程使用时由调用方串行化（FFI 层用 `Mutex` 包装）。

use crate::bootstrap::TorBootstrapTag;
use crate::config::{DaemonConfig, LaunchConfig};
use crate::error::{Result, TegoError};
use crate::logs::LogAggregator;
use crate::status::{
    translate_control_state, translate_network_state, translate_process_state, TorControlStatus,
    TorNetworkStatus, TorProcessStatus,
};
use crate::tor::{TorControl, TorManager};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// 某一时刻的状态快照，每次查询时重新计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub process: TorProcessStatus,
    pub control: TorControlStatus,
    pub network: TorNetworkStatus,
    pub bootstrap_progress: i32,
    pub bootstrap_tag: TorBootstrapTag,
}

pub struct Context {
    manager: Option<Arc<dyn TorManager>>,
    control: Option<Arc<dyn TorControl>>,
    logs: LogAggregator,
    version: Option<String>,
}

impl Context {
    /// 注入协作者。句柄可以暂缺，相关调用会返回 `Unavailable`。
    pub fn new(manager: Option<Arc<dyn TorManager>>, control: Option<Arc<dyn TorControl>>) -> Self {
        Self {
            manager,
            control,
            logs: LogAggregator::new(),
            version: None,
        }
    }

    fn manager(&self) -> Result<&dyn TorManager> {
        self.manager
            .as_deref()
            .ok_or(TegoError::Unavailable("tor manager"))
    }

    fn control(&self) -> Result<&dyn TorControl> {
        self.control
            .as_deref()
            .ok_or(TegoError::Unavailable("tor control"))
    }

    // ==================== 生命周期 ====================

    /// 设置数据目录并请求启动，不等待进程就绪
    pub fn start_tor(&self, config: Option<&LaunchConfig>) -> Result<()> {
        let config = config.ok_or(TegoError::NullArgument("launch config"))?;
        config.validate()?;
        let manager = self.manager()?;

        info!(data_directory = %config.data_directory.display(), "Starting tor daemon");
        manager.set_data_directory(&config.data_directory)?;
        manager.start()?;
        Ok(())
    }

    pub fn stop_tor(&self) -> Result<()> {
        info!("Stopping tor daemon");
        self.manager()?.stop()?;
        Ok(())
    }

    pub fn tor_daemon_configured(&self) -> Result<bool> {
        Ok(!self.manager()?.configuration_needed())
    }

    // ==================== 日志 ====================

    /// 同步后的全部日志行
    pub fn tor_logs(&mut self) -> Result<&[String]> {
        let manager = self.manager.as_deref().ok_or(TegoError::Unavailable("tor manager"))?;
        Ok(self.logs.sync(manager))
    }

    pub fn tor_logs_size(&mut self) -> Result<usize> {
        self.tor_logs()?;
        Ok(self.logs.size())
    }

    /// 同步后把日志写入调用方缓冲区，返回写入字节数（含 NUL）
    pub fn copy_tor_logs(&mut self, out: &mut [u8]) -> Result<usize> {
        self.tor_logs()?;
        self.logs.copy_into(out)
    }

    /// 版本号首次查询后缓存，进程生命周期内不变
    pub fn tor_version(&mut self) -> Result<&str> {
        if self.version.is_none() {
            let version = self.control()?.tor_version()?;
            debug!(version = %version, "Cached tor version");
            self.version = Some(version);
        }
        Ok(self.version.as_deref().unwrap_or_default())
    }

    // ==================== 状态 ====================

    pub fn tor_control_status(&self) -> Result<TorControlStatus> {
        Ok(translate_control_state(self.control()?.status()))
    }

    /// 没有受管进程时表示连接的是外部守护进程
    pub fn tor_process_status(&self) -> Result<TorProcessStatus> {
        match self.manager()?.process() {
            None => Ok(TorProcessStatus::External),
            Some(process) => Ok(translate_process_state(process.state())),
        }
    }

    pub fn tor_network_status(&self) -> Result<TorNetworkStatus> {
        Ok(translate_network_state(self.control()?.tor_status()))
    }

    /// 未知 tag 说明控制协议与 tag 表版本不一致，直接报错
    pub fn tor_bootstrap_tag(&self) -> Result<TorBootstrapTag> {
        bootstrap_tag(&self.control()?.bootstrap_status())
    }

    pub fn tor_bootstrap_progress(&self) -> Result<i32> {
        bootstrap_progress(&self.control()?.bootstrap_status())
    }

    /// 进度与 tag 取自同一份快照
    pub fn tor_bootstrap_status(&self) -> Result<(i32, TorBootstrapTag)> {
        let status = self.control()?.bootstrap_status();
        Ok((bootstrap_progress(&status)?, bootstrap_tag(&status)?))
    }

    pub fn status_snapshot(&self) -> Result<StatusSnapshot> {
        let (bootstrap_progress, bootstrap_tag) = self.tor_bootstrap_status()?;
        Ok(StatusSnapshot {
            process: self.tor_process_status()?,
            control: self.tor_control_status()?,
            network: self.tor_network_status()?,
            bootstrap_progress,
            bootstrap_tag,
        })
    }

    // ==================== 配置 ====================

    /// 合并稀疏配置并一次性提交；协作者拒绝时原样返回错误，不回滚
    pub fn update_tor_daemon_config(&self, config: Option<&DaemonConfig>) -> Result<()> {
        let config = config.ok_or(TegoError::NullArgument("daemon config"))?;
        config.validate()?;
        let control = self.control()?;

        let patch = config.to_patch();
        debug!(
            patch = %patch.to_log_string(),
            "Applying tor daemon config"
        );
        control.set_configuration(&patch)?;
        Ok(())
    }

    pub fn save_tor_daemon_config(&self) -> Result<()> {
        debug!("Saving tor daemon config");
        self.control()?.save_configuration()?;
        Ok(())
    }
}

fn bootstrap_tag(status: &Value) -> Result<TorBootstrapTag> {
    let wire = status.get("tag").and_then(|tag| tag.as_str()).unwrap_or_default();
    TorBootstrapTag::from_wire(wire).ok_or_else(|| TegoError::UnrecognizedBootstrapTag(wire.to_string()))
}

/// 缺失时视为 0
fn bootstrap_progress(status: &Value) -> Result<i32> {
    let progress = status
        .get("progress")
        .and_then(|progress| progress.as_i64())
        .unwrap_or_default();
    i32::try_from(progress)
        .map_err(|_| TegoError::invalid_argument(format!("bootstrap progress {} out of range", progress)))
}
