//! 内存中的假协作者，供单元测试与 FFI 测试使用

use crate::config::ConfigPatch;
use crate::tor::{ControlState, NetworkState, ProcessState, TorControl, TorManager, TorProcess};
use anyhow::{bail, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct ManagerState {
    data_directory: Option<PathBuf>,
    start_calls: usize,
    stop_calls: usize,
    configuration_needed: bool,
    process: Option<Arc<FakeTorProcess>>,
    logs: Vec<String>,
    log_reads: usize,
    start_error: Option<String>,
}

/// 假进程管理器
#[derive(Default)]
pub struct FakeTorManager {
    state: Mutex<ManagerState>,
}

impl FakeTorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 附带一个处于 `state` 的受管进程
    pub fn with_process(state: ProcessState) -> Self {
        let manager = Self::new();
        manager.set_process(Some(Arc::new(FakeTorProcess::new(state))));
        manager
    }

    pub fn set_process(&self, process: Option<Arc<FakeTorProcess>>) {
        lock(&self.state).process = process;
    }

    pub fn set_configuration_needed(&self, needed: bool) {
        lock(&self.state).configuration_needed = needed;
    }

    pub fn fail_start(&self, message: &str) {
        lock(&self.state).start_error = Some(message.to_string());
    }

    pub fn push_log(&self, line: &str) {
        lock(&self.state).logs.push(line.to_string());
    }

    pub fn data_directory(&self) -> Option<PathBuf> {
        lock(&self.state).data_directory.clone()
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn stop_calls(&self) -> usize {
        lock(&self.state).stop_calls
    }

    /// `log_messages_from` 被调用的次数
    pub fn log_reads(&self) -> usize {
        lock(&self.state).log_reads
    }
}

impl TorManager for FakeTorManager {
    fn set_data_directory(&self, path: &Path) -> Result<()> {
        lock(&self.state).data_directory = Some(path.to_path_buf());
        Ok(())
    }

    fn start(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(message) = &state.start_error {
            bail!("{}", message);
        }
        state.start_calls += 1;
        if let Some(process) = &state.process {
            process.set_state(ProcessState::Starting);
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.stop_calls += 1;
        if let Some(process) = &state.process {
            process.set_state(ProcessState::NotStarted);
        }
        Ok(())
    }

    fn configuration_needed(&self) -> bool {
        lock(&self.state).configuration_needed
    }

    fn process(&self) -> Option<Arc<dyn TorProcess>> {
        lock(&self.state)
            .process
            .clone()
            .map(|process| process as Arc<dyn TorProcess>)
    }

    fn log_message_count(&self) -> usize {
        lock(&self.state).logs.len()
    }

    fn log_messages_from(&self, start: usize) -> Vec<String> {
        let mut state = lock(&self.state);
        state.log_reads += 1;
        state.logs.get(start..).map(<[String]>::to_vec).unwrap_or_default()
    }
}

/// 假守护进程
pub struct FakeTorProcess {
    state: Mutex<ProcessState>,
}

impl FakeTorProcess {
    pub fn new(state: ProcessState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn set_state(&self, state: ProcessState) {
        *lock(&self.state) = state;
    }
}

impl TorProcess for FakeTorProcess {
    fn state(&self) -> ProcessState {
        *lock(&self.state)
    }
}

struct ControlInner {
    status: ControlState,
    tor_status: NetworkState,
    bootstrap: Value,
    bootstrap_queries: usize,
    status_panic: Option<String>,
    version: String,
    version_queries: usize,
    patches: Vec<ConfigPatch>,
    saves: usize,
    configuration_error: Option<String>,
}

/// 假控制通道
pub struct FakeTorControl {
    inner: Mutex<ControlInner>,
}

impl Default for FakeTorControl {
    fn default() -> Self {
        Self {
            inner: Mutex::new(ControlInner {
                status: ControlState::NotConnected,
                tor_status: NetworkState::Unknown,
                bootstrap: json!({ "tag": "starting", "progress": 0 }),
                bootstrap_queries: 0,
                status_panic: None,
                version: "0.4.8.12".to_string(),
                version_queries: 0,
                patches: Vec::new(),
                saves: 0,
                configuration_error: None,
            }),
        }
    }
}

impl FakeTorControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: ControlState) {
        lock(&self.inner).status = status;
    }

    pub fn set_tor_status(&self, status: NetworkState) {
        lock(&self.inner).tor_status = status;
    }

    pub fn set_bootstrap(&self, tag: &str, progress: i32) {
        lock(&self.inner).bootstrap = json!({ "tag": tag, "progress": progress });
    }

    /// 原样设置快照，可用于模拟缺字段的情况
    pub fn set_bootstrap_raw(&self, value: Value) {
        lock(&self.inner).bootstrap = value;
    }

    pub fn set_version(&self, version: &str) {
        lock(&self.inner).version = version.to_string();
    }

    /// 之后的 `status()` 调用直接 panic
    pub fn panic_on_status(&self, message: &str) {
        lock(&self.inner).status_panic = Some(message.to_string());
    }

    pub fn fail_configuration(&self, message: &str) {
        lock(&self.inner).configuration_error = Some(message.to_string());
    }

    pub fn bootstrap_queries(&self) -> usize {
        lock(&self.inner).bootstrap_queries
    }

    pub fn version_queries(&self) -> usize {
        lock(&self.inner).version_queries
    }

    pub fn patches(&self) -> Vec<ConfigPatch> {
        lock(&self.inner).patches.clone()
    }

    pub fn saves(&self) -> usize {
        lock(&self.inner).saves
    }
}

impl TorControl for FakeTorControl {
    fn status(&self) -> ControlState {
        let inner = lock(&self.inner);
        if let Some(message) = inner.status_panic.clone() {
            drop(inner);
            panic!("{}", message);
        }
        inner.status
    }

    fn tor_status(&self) -> NetworkState {
        lock(&self.inner).tor_status
    }

    fn bootstrap_status(&self) -> Value {
        let mut inner = lock(&self.inner);
        inner.bootstrap_queries += 1;
        inner.bootstrap.clone()
    }

    fn tor_version(&self) -> Result<String> {
        let mut inner = lock(&self.inner);
        inner.version_queries += 1;
        Ok(inner.version.clone())
    }

    fn set_configuration(&self, patch: &ConfigPatch) -> Result<()> {
        let mut inner = lock(&self.inner);
        if let Some(message) = &inner.configuration_error {
            bail!("{}", message);
        }
        inner.patches.push(patch.clone());
        Ok(())
    }

    fn save_configuration(&self) -> Result<()> {
        lock(&self.inner).saves += 1;
        Ok(())
    }
}
