//! 启动配置与守护进程配置
//!
//! `DaemonConfig` 的每个字段独立可选，未指定的字段不会覆盖守护进程现有设置。

use crate::error::{Result, TegoError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DISABLE_NETWORK: &str = "DisableNetwork";
pub const SOCKS4_PROXY: &str = "Socks4Proxy";
pub const SOCKS5_PROXY: &str = "Socks5Proxy";
pub const SOCKS5_PROXY_USERNAME: &str = "Socks5ProxyUsername";
pub const SOCKS5_PROXY_PASSWORD: &str = "Socks5ProxyPassword";
pub const HTTPS_PROXY: &str = "HTTPSProxy";
pub const HTTPS_PROXY_AUTHENTICATOR: &str = "HTTPSProxyAuthenticator";
pub const REACHABLE_ADDRESSES: &str = "ReachableAddresses";
pub const BRIDGE: &str = "Bridge";
pub const USE_BRIDGES: &str = "UseBridges";

/// 本模块可修改的全部 torrc 键
pub const CONFIG_KEYS: [&str; 10] = [
    DISABLE_NETWORK,
    SOCKS4_PROXY,
    SOCKS5_PROXY,
    SOCKS5_PROXY_USERNAME,
    SOCKS5_PROXY_PASSWORD,
    HTTPS_PROXY,
    HTTPS_PROXY_AUTHENTICATOR,
    REACHABLE_ADDRESSES,
    BRIDGE,
    USE_BRIDGES,
];

/// 值包含凭据的键
const CREDENTIAL_KEYS: [&str; 3] = [
    SOCKS5_PROXY_USERNAME,
    SOCKS5_PROXY_PASSWORD,
    HTTPS_PROXY_AUTHENTICATOR,
];

const REDACTED: &str = "<redacted>";

/// 启动配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    /// 数据目录
    pub data_directory: PathBuf,
}

impl LaunchConfig {
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
        }
    }

    /// 从环境变量 `TEGO_TOR_DATA_DIRECTORY` 读取默认数据目录
    pub fn from_env() -> Self {
        let data_directory = std::env::var_os("TEGO_TOR_DATA_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_default();
        Self { data_directory }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_directory.as_os_str().is_empty() {
            return Err(TegoError::invalid_argument("data directory is empty"));
        }
        Ok(())
    }
}

/// 代理设置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProxyConfig {
    Socks4 {
        address: String,
        port: u16,
    },
    Socks5 {
        address: String,
        port: u16,
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    Https {
        address: String,
        port: u16,
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
}

impl ProxyConfig {
    fn endpoint(&self) -> (&str, u16) {
        match self {
            ProxyConfig::Socks4 { address, port }
            | ProxyConfig::Socks5 { address, port, .. }
            | ProxyConfig::Https { address, port, .. } => (address.as_str(), *port),
        }
    }

    /// 地址不能为空，端口不能为 0
    pub fn validate(&self) -> Result<()> {
        let (address, port) = self.endpoint();
        if address.is_empty() {
            return Err(TegoError::invalid_argument("proxy address is empty"));
        }
        if port == 0 {
            return Err(TegoError::invalid_argument("proxy port 0 is not allowed"));
        }
        Ok(())
    }
}

/// 守护进程配置（稀疏）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DaemonConfig {
    pub disable_network: Option<bool>,
    /// None 表示不使用代理
    pub proxy: Option<ProxyConfig>,
    /// 防火墙允许的端口，按顺序输出
    pub allowed_ports: Vec<u16>,
    pub bridges: Vec<String>,
}

/// 补丁中的值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(text) => Some(text.as_str()),
            ConfigValue::List(_) => None,
        }
    }

    /// 空字符串占位：守护进程侧视为不改动
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ConfigValue::Text(text) if text.is_empty())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

/// 发往控制通道的配置补丁，按键排序
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigPatch {
    entries: BTreeMap<&'static str, ConfigValue>,
}

impl ConfigPatch {
    /// 所有已知键都以空字符串占位
    pub fn placeholders() -> Self {
        let entries = CONFIG_KEYS
            .iter()
            .map(|key| (*key, ConfigValue::Text(String::new())))
            .collect();
        Self { entries }
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<ConfigValue>) {
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ConfigValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// 凭据键的非空值替换为 `<redacted>`，用于日志输出
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        for key in CREDENTIAL_KEYS {
            if let Some(value) = redacted.entries.get_mut(key) {
                if !value.is_placeholder() {
                    *value = ConfigValue::Text(REDACTED.to_string());
                }
            }
        }
        redacted
    }

    /// 日志用的 JSON 形式，凭据已屏蔽
    pub fn to_log_string(&self) -> String {
        serde_json::to_string(&self.redacted()).unwrap_or_default()
    }
}

impl DaemonConfig {
    pub fn validate(&self) -> Result<()> {
        match &self.proxy {
            Some(proxy) => proxy.validate(),
            None => Ok(()),
        }
    }

    /// 构建补丁：只覆盖输入中实际存在的字段
    pub fn to_patch(&self) -> ConfigPatch {
        let mut patch = ConfigPatch::placeholders();

        if let Some(disable) = self.disable_network {
            patch.set(DISABLE_NETWORK, if disable { "1" } else { "0" });
        }

        match &self.proxy {
            None => {}
            Some(ProxyConfig::Socks4 { address, port }) => {
                patch.set(SOCKS4_PROXY, format!("{}:{}", address, port));
            }
            Some(ProxyConfig::Socks5 {
                address,
                port,
                username,
                password,
            }) => {
                patch.set(SOCKS5_PROXY, format!("{}:{}", address, port));
                if !username.is_empty() {
                    patch.set(SOCKS5_PROXY_USERNAME, username.as_str());
                }
                if !password.is_empty() {
                    patch.set(SOCKS5_PROXY_PASSWORD, password.as_str());
                }
            }
            Some(ProxyConfig::Https {
                address,
                port,
                username,
                password,
            }) => {
                patch.set(HTTPS_PROXY, format!("{}:{}", address, port));
                if !username.is_empty() || !password.is_empty() {
                    patch.set(
                        HTTPS_PROXY_AUTHENTICATOR,
                        format!("{}:{}", username, password),
                    );
                }
            }
        }

        if !self.allowed_ports.is_empty() {
            let reachable = self
                .allowed_ports
                .iter()
                .map(|port| format!("*:{}", port))
                .collect::<Vec<_>>()
                .join(", ");
            patch.set(REACHABLE_ADDRESSES, reachable);
        }

        if !self.bridges.is_empty() {
            patch.set(BRIDGE, ConfigValue::List(self.bridges.clone()));
            patch.set(USE_BRIDGES, "1");
        }

        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated(patch: &ConfigPatch) -> Vec<&'static str> {
        patch
            .iter()
            .filter(|(_, value)| !value.is_placeholder())
            .map(|(key, _)| key)
            .collect()
    }

    #[test]
    fn test_empty_config_is_all_placeholders() {
        let patch = DaemonConfig::default().to_patch();
        assert_eq!(patch.len(), CONFIG_KEYS.len());
        assert!(populated(&patch).is_empty());
    }

    #[test]
    fn test_disable_network_only() {
        let config = DaemonConfig {
            disable_network: Some(true),
            ..Default::default()
        };
        let patch = config.to_patch();
        assert_eq!(patch.len(), CONFIG_KEYS.len());
        assert_eq!(populated(&patch), vec![DISABLE_NETWORK]);
        assert_eq!(patch.get(DISABLE_NETWORK).unwrap().as_text(), Some("1"));

        let config = DaemonConfig {
            disable_network: Some(false),
            ..Default::default()
        };
        assert_eq!(config.to_patch().get(DISABLE_NETWORK).unwrap().as_text(), Some("0"));
    }

    #[test]
    fn test_socks5_without_credentials() {
        let config = DaemonConfig {
            proxy: Some(ProxyConfig::Socks5 {
                address: "10.0.0.1".into(),
                port: 9050,
                username: String::new(),
                password: String::new(),
            }),
            ..Default::default()
        };
        let patch = config.to_patch();
        assert_eq!(populated(&patch), vec![SOCKS5_PROXY]);
        assert_eq!(patch.get(SOCKS5_PROXY).unwrap().as_text(), Some("10.0.0.1:9050"));
        assert!(patch.get(SOCKS5_PROXY_USERNAME).unwrap().is_placeholder());
        assert!(patch.get(SOCKS5_PROXY_PASSWORD).unwrap().is_placeholder());
    }

    #[test]
    fn test_socks5_password_only() {
        let config = DaemonConfig {
            proxy: Some(ProxyConfig::Socks5 {
                address: "proxy".into(),
                port: 1080,
                username: String::new(),
                password: "hunter2".into(),
            }),
            ..Default::default()
        };
        let patch = config.to_patch();
        assert!(patch.get(SOCKS5_PROXY_USERNAME).unwrap().is_placeholder());
        assert_eq!(patch.get(SOCKS5_PROXY_PASSWORD).unwrap().as_text(), Some("hunter2"));
    }

    #[test]
    fn test_socks4() {
        let config = DaemonConfig {
            proxy: Some(ProxyConfig::Socks4 {
                address: "127.0.0.1".into(),
                port: 1080,
            }),
            ..Default::default()
        };
        let patch = config.to_patch();
        assert_eq!(populated(&patch), vec![SOCKS4_PROXY]);
        assert_eq!(patch.get(SOCKS4_PROXY).unwrap().as_text(), Some("127.0.0.1:1080"));
    }

    #[test]
    fn test_https_authenticator() {
        let with_user = DaemonConfig {
            proxy: Some(ProxyConfig::Https {
                address: "proxy.example".into(),
                port: 443,
                username: "alice".into(),
                password: String::new(),
            }),
            ..Default::default()
        };
        let patch = with_user.to_patch();
        assert_eq!(patch.get(HTTPS_PROXY).unwrap().as_text(), Some("proxy.example:443"));
        assert_eq!(patch.get(HTTPS_PROXY_AUTHENTICATOR).unwrap().as_text(), Some("alice:"));

        let anonymous = DaemonConfig {
            proxy: Some(ProxyConfig::Https {
                address: "proxy.example".into(),
                port: 443,
                username: String::new(),
                password: String::new(),
            }),
            ..Default::default()
        };
        let patch = anonymous.to_patch();
        assert!(patch.get(HTTPS_PROXY_AUTHENTICATOR).unwrap().is_placeholder());
    }

    #[test]
    fn test_allowed_ports() {
        let single = DaemonConfig {
            allowed_ports: vec![80],
            ..Default::default()
        };
        assert_eq!(
            single.to_patch().get(REACHABLE_ADDRESSES).unwrap().as_text(),
            Some("*:80")
        );

        let many = DaemonConfig {
            allowed_ports: vec![80, 443, 9001],
            ..Default::default()
        };
        assert_eq!(
            many.to_patch().get(REACHABLE_ADDRESSES).unwrap().as_text(),
            Some("*:80, *:443, *:9001")
        );
    }

    #[test]
    fn test_bridges_force_use_bridges() {
        let config = DaemonConfig {
            bridges: vec!["obfs4 1.2.3.4:443 cert=x".into(), "obfs4 5.6.7.8:80 cert=y".into()],
            ..Default::default()
        };
        let patch = config.to_patch();
        assert_eq!(
            patch.get(BRIDGE),
            Some(&ConfigValue::List(config.bridges.clone()))
        );
        assert_eq!(patch.get(USE_BRIDGES).unwrap().as_text(), Some("1"));
    }

    #[test]
    fn test_deserialize_sparse_json() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{"disableNetwork": false, "proxy": {"type": "socks5", "address": "10.0.0.1", "port": 9050}}"#,
        )
        .unwrap();
        assert_eq!(config.disable_network, Some(false));
        assert!(config.allowed_ports.is_empty());
        assert_eq!(
            config.proxy,
            Some(ProxyConfig::Socks5 {
                address: "10.0.0.1".into(),
                port: 9050,
                username: String::new(),
                password: String::new(),
            })
        );

        let empty: DaemonConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, DaemonConfig::default());
    }

    #[test]
    fn test_proxy_validation() {
        let zero_port = ProxyConfig::Socks5 {
            address: "10.0.0.1".into(),
            port: 0,
            username: String::new(),
            password: String::new(),
        };
        assert!(matches!(zero_port.validate(), Err(TegoError::InvalidArgument(_))));

        let no_address = ProxyConfig::Https {
            address: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
        };
        assert!(matches!(no_address.validate(), Err(TegoError::InvalidArgument(_))));

        let socks4 = ProxyConfig::Socks4 {
            address: "127.0.0.1".into(),
            port: 0,
        };
        let config = DaemonConfig {
            proxy: Some(socks4),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let ok = ProxyConfig::Socks4 {
            address: "127.0.0.1".into(),
            port: 1080,
        };
        assert!(ok.validate().is_ok());
        assert!(DaemonConfig::default().validate().is_ok());
    }

    #[test]
    fn test_redacted_hides_credentials() {
        let socks5 = DaemonConfig {
            proxy: Some(ProxyConfig::Socks5 {
                address: "10.0.0.1".into(),
                port: 9050,
                username: "u".into(),
                password: "hunter2".into(),
            }),
            ..Default::default()
        };
        let patch = socks5.to_patch();
        let traced = patch.to_log_string();
        assert!(!traced.contains("hunter2"));
        assert!(traced.contains("10.0.0.1:9050"));
        assert_eq!(patch.redacted().get(SOCKS5_PROXY_USERNAME).unwrap().as_text(), Some("<redacted>"));
        // 原补丁不受影响
        assert_eq!(patch.get(SOCKS5_PROXY_PASSWORD).unwrap().as_text(), Some("hunter2"));

        let https = DaemonConfig {
            proxy: Some(ProxyConfig::Https {
                address: "proxy.example".into(),
                port: 443,
                username: "alice".into(),
                password: "s3cret".into(),
            }),
            ..Default::default()
        };
        let redacted = https.to_patch().redacted();
        assert_eq!(redacted.get(HTTPS_PROXY_AUTHENTICATOR).unwrap().as_text(), Some("<redacted>"));
        assert!(redacted.get(SOCKS5_PROXY_PASSWORD).unwrap().is_placeholder());
    }

    #[test]
    fn test_patch_serializes_as_map() {
        let config = DaemonConfig {
            bridges: vec!["b1".into()],
            ..Default::default()
        };
        let json = serde_json::to_value(config.to_patch()).unwrap();
        assert_eq!(json["Bridge"], serde_json::json!(["b1"]));
        assert_eq!(json["UseBridges"], "1");
        assert_eq!(json["Socks4Proxy"], "");
    }

    #[test]
    fn test_launch_config_validate() {
        assert!(LaunchConfig::default().validate().is_err());
        assert!(LaunchConfig::new("/var/lib/tego/tor").validate().is_ok());
    }
}
