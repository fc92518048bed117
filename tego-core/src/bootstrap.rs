//! 启动阶段 tag 表
//!
//! 顺序与 Tor control-spec 的 bootstrap 阶段一致：
//! https://gitweb.torproject.org/torspec.git/tree/control-spec.txt

use crate::error::{Result, TegoError};
use serde::Serialize;

/// 启动阶段 tag，序号 0 保留为 `Invalid`，最后一个为 `Done`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TorBootstrapTag {
    Invalid = 0,
    Starting,
    ConnPt,
    ConnDonePt,
    ConnProxy,
    ConnDoneProxy,
    Conn,
    ConnDone,
    Handshake,
    HandshakeDone,
    OnehopCreate,
    RequestingStatus,
    LoadingStatus,
    LoadingKeys,
    RequestingDescriptors,
    LoadingDescriptors,
    EnoughDirinfo,
    ApConnPtSummary,
    ApConnDonePt,
    ApConnProxy,
    ApConnDoneProxy,
    ApConn,
    ApConnDone,
    ApHandshake,
    ApHandshakeDone,
    CircuitCreate,
    Done,
}

impl TorBootstrapTag {
    /// tag 总数（含 `Invalid`）
    pub const COUNT: usize = TorBootstrapTag::Done as usize + 1;

    /// 序号 → tag，越界返回 None
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        let index = usize::try_from(ordinal).ok()?;
        BOOTSTRAP_TAGS.get(index).map(|entry| entry.tag)
    }

    /// 协议字符串 → tag，线性查找（表小且固定）
    pub fn from_wire(wire: &str) -> Option<Self> {
        BOOTSTRAP_TAGS[1..]
            .iter()
            .find(|entry| entry.wire == wire)
            .map(|entry| entry.tag)
    }

    pub fn wire(self) -> &'static str {
        BOOTSTRAP_TAGS[self as usize].wire
    }

    /// 人类可读摘要；`Invalid` 返回错误
    pub fn summary(self) -> Result<&'static str> {
        match self {
            TorBootstrapTag::Invalid => Err(TegoError::invalid_argument(
                "bootstrap tag 'invalid' has no summary",
            )),
            tag => Ok(BOOTSTRAP_TAGS[tag as usize].summary),
        }
    }
}

/// (序号, 协议字符串, 摘要)
#[derive(Debug, Clone, Copy)]
pub struct BootstrapTagEntry {
    pub tag: TorBootstrapTag,
    pub wire: &'static str,
    pub summary: &'static str,
}

const fn entry(tag: TorBootstrapTag, wire: &'static str, summary: &'static str) -> BootstrapTagEntry {
    BootstrapTagEntry { tag, wire, summary }
}

pub const BOOTSTRAP_TAGS: [BootstrapTagEntry; TorBootstrapTag::COUNT] = {
    use TorBootstrapTag::*;
    [
        entry(Invalid, "", ""),
        entry(Starting, "starting", "Starting"),
        entry(ConnPt, "conn_pt", "Connecting to pluggable transport"),
        entry(ConnDonePt, "conn_done_pt", "Connected to pluggable transport"),
        entry(ConnProxy, "conn_proxy", "Connecting to proxy"),
        entry(ConnDoneProxy, "conn_done_proxy", "Connected to proxy"),
        entry(Conn, "conn", "Connecting to a relay"),
        entry(ConnDone, "conn_done", "Connected to a relay"),
        entry(Handshake, "handshake", "Handshaking with a relay"),
        entry(HandshakeDone, "handshake_done", "Handshake with a relay done"),
        entry(OnehopCreate, "onehop_create", "Establishing an encrypted directory connection"),
        entry(RequestingStatus, "requesting_status", "Asking for networkstatus consensus"),
        entry(LoadingStatus, "loading_status", "Loading networkstatus consensus"),
        entry(LoadingKeys, "loading_keys", "Loading authority key certs"),
        entry(RequestingDescriptors, "requesting_descriptors", "Asking for relay descriptors"),
        entry(LoadingDescriptors, "loading_descriptors", "Loading relay descriptors"),
        entry(EnoughDirinfo, "enough_dirinfo", "Loaded enough directory info to build circuits"),
        entry(ApConnPtSummary, "ap_conn_pt_summary", "Connecting to pluggable transport to build circuits"),
        entry(ApConnDonePt, "ap_conn_done_pt", "Connected to pluggable transport to build circuits"),
        entry(ApConnProxy, "ap_conn_proxy", "Connecting to proxy to build circuits"),
        entry(ApConnDoneProxy, "ap_conn_done_proxy", "Connected to proxy to build circuits"),
        entry(ApConn, "ap_conn", "Connecting to a relay to build circuits"),
        entry(ApConnDone, "ap_conn_done", "Connected to a relay to build circuits"),
        entry(ApHandshake, "ap_handshake", "Finishing handshake with a relay to build circuits"),
        entry(ApHandshakeDone, "ap_handshake_done", "Handshake finished with a relay to build circuits"),
        entry(CircuitCreate, "circuit_create", "Establishing a Tor circuit"),
        entry(Done, "done", "Done"),
    ]
};

// 表项序号必须与下标一致，否则编译失败
const _: () = {
    let mut i = 0;
    while i < TorBootstrapTag::COUNT {
        assert!(BOOTSTRAP_TAGS[i].tag as usize == i);
        i += 1;
    }
};

/// 序号 → 摘要，供无上下文的静态查询使用
pub fn bootstrap_tag_to_summary(ordinal: i32) -> Result<&'static str> {
    match TorBootstrapTag::from_ordinal(ordinal) {
        Some(tag) => tag.summary(),
        None => Err(TegoError::invalid_argument(format!(
            "bootstrap tag {} out of range",
            ordinal
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size() {
        assert_eq!(BOOTSTRAP_TAGS.len(), TorBootstrapTag::COUNT);
        assert_eq!(TorBootstrapTag::COUNT, 27);
        assert_eq!(TorBootstrapTag::Done as usize, TorBootstrapTag::COUNT - 1);
    }

    #[test]
    fn test_every_valid_ordinal_has_summary() {
        for ordinal in 1..TorBootstrapTag::COUNT as i32 {
            let summary = bootstrap_tag_to_summary(ordinal).unwrap();
            assert!(!summary.is_empty(), "ordinal {} has empty summary", ordinal);
        }
    }

    #[test]
    fn test_invalid_ordinals_fail() {
        assert!(bootstrap_tag_to_summary(0).is_err());
        assert!(bootstrap_tag_to_summary(-1).is_err());
        assert!(bootstrap_tag_to_summary(TorBootstrapTag::COUNT as i32).is_err());
        assert!(bootstrap_tag_to_summary(i32::MAX).is_err());
    }

    #[test]
    fn test_wire_lookup() {
        assert_eq!(TorBootstrapTag::from_wire("starting"), Some(TorBootstrapTag::Starting));
        assert_eq!(
            TorBootstrapTag::from_wire("ap_conn_pt_summary"),
            Some(TorBootstrapTag::ApConnPtSummary)
        );
        assert_eq!(TorBootstrapTag::from_wire("done"), Some(TorBootstrapTag::Done));
        assert_eq!(TorBootstrapTag::from_wire(""), None);
        assert_eq!(TorBootstrapTag::from_wire("DONE"), None);
        assert_eq!(TorBootstrapTag::Handshake.wire(), "handshake");
    }

    #[test]
    fn test_summary_text() {
        assert_eq!(TorBootstrapTag::Done.summary().unwrap(), "Done");
        assert_eq!(
            TorBootstrapTag::CircuitCreate.summary().unwrap(),
            "Establishing a Tor circuit"
        );
    }
}
