//! 日志聚合
//!
//! 协作者的日志序列只增不减。本地副本只追加新增部分，已复制的行不再触碰。

use crate::error::{Result, TegoError};
use crate::tor::TorManager;
use tracing::debug;

#[derive(Debug, Default)]
pub struct LogAggregator {
    lines: Vec<String>,
}

impl LogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与协作者同步：只追加本地之后的条目
    pub fn sync(&mut self, manager: &dyn TorManager) -> &[String] {
        let reported = manager.log_message_count();
        let local = self.lines.len();

        if reported > local {
            let delta = manager.log_messages_from(local);
            // 协作者在两次查询之间可能又追加了，只取报告数量以内的部分
            let take = delta.len().min(reported - local);
            self.lines.extend(delta.into_iter().take(take));
            debug!(appended = take, total = self.lines.len(), "Synced tor log lines");
        }

        &self.lines
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 每行长度 + 1（分隔符）之和
    pub fn size(&self) -> usize {
        self.lines.iter().map(|line| line.len() + 1).sum()
    }

    /// 每行后跟 `\n`，末尾追加 NUL
    pub fn serialize(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size() + 1);
        for line in &self.lines {
            buffer.extend_from_slice(line.as_bytes());
            buffer.push(b'\n');
        }
        buffer.push(0);
        buffer
    }

    /// 复制至多 `out.len()` 字节，最后写入的字节强制为 NUL，返回写入字节数
    pub fn copy_into(&self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Err(TegoError::invalid_argument(
                "log buffer capacity must be at least 1",
            ));
        }

        let serialized = self.serialize();
        let count = out.len().min(serialized.len());
        out[..count].copy_from_slice(&serialized[..count]);
        out[count - 1] = 0;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTorManager;

    fn synced(lines: &[&str]) -> (FakeTorManager, LogAggregator) {
        let manager = FakeTorManager::new();
        for line in lines {
            manager.push_log(line);
        }
        let mut logs = LogAggregator::new();
        logs.sync(&manager);
        (manager, logs)
    }

    #[test]
    fn test_size_and_serialize() {
        let (_, logs) = synced(&["a", "bb"]);
        assert_eq!(logs.size(), 5);
        assert_eq!(logs.serialize(), b"a\nbb\n\0".to_vec());
    }

    #[test]
    fn test_copy_truncates_with_terminator() {
        let (_, logs) = synced(&["a", "bb"]);

        let mut buffer = [0xffu8; 3];
        assert_eq!(logs.copy_into(&mut buffer).unwrap(), 3);
        assert_eq!(&buffer, b"a\n\0");

        let mut buffer = [0xffu8; 16];
        assert_eq!(logs.copy_into(&mut buffer).unwrap(), 6);
        assert_eq!(&buffer[..6], b"a\nbb\n\0");
        assert_eq!(buffer[6], 0xff);
    }

    #[test]
    fn test_copy_never_overruns() {
        let (_, logs) = synced(&["hello", "world", "!"]);
        for capacity in 1..20 {
            let mut buffer = vec![0xffu8; capacity + 4];
            let written = logs.copy_into(&mut buffer[..capacity]).unwrap();
            assert!(written <= capacity);
            assert_eq!(buffer[written - 1], 0);
            assert!(buffer[capacity..].iter().all(|b| *b == 0xff));
        }
    }

    #[test]
    fn test_copy_zero_capacity_fails() {
        let (_, logs) = synced(&["a"]);
        let mut buffer: [u8; 0] = [];
        assert!(logs.copy_into(&mut buffer).is_err());
    }

    #[test]
    fn test_empty_logs() {
        let logs = LogAggregator::new();
        assert_eq!(logs.size(), 0);
        let mut buffer = [0xffu8; 4];
        assert_eq!(logs.copy_into(&mut buffer).unwrap(), 1);
        assert_eq!(buffer[0], 0);
    }

    #[test]
    fn test_incremental_sync() {
        let (manager, mut logs) = synced(&["one", "two"]);

        let first = logs.sync(&manager).to_vec();
        let second = logs.sync(&manager).to_vec();
        assert_eq!(first, second);
        assert_eq!(manager.log_reads(), 1);

        manager.push_log("three");
        manager.push_log("four");
        let grown = logs.sync(&manager).to_vec();
        assert_eq!(grown.len(), first.len() + 2);
        assert_eq!(&grown[..2], &first[..]);
        assert_eq!(grown[3], "four");
    }
}
