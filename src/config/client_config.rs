// ==========================================
// 剪力墙结构分析客户端 - 客户端配置
// ==========================================
// 职责: 服务地址、会话、超时策略
// 解析顺序: 环境变量 > 配置文件 > 内置默认值
// 存储: 用户配置目录/shearwall-client/config.json
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 分析服务基地址（不带末尾斜杠）
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 恢复已有会话时的会话 ID（可选）
    #[serde(default)]
    pub session_id: Option<String>,

    /// 请求/响应调用的超时（秒），不作用于流式响应
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 流式响应的空闲超时（秒）；0 表示关闭超时
    ///
    /// 服务端停止发送字节又不关闭连接时，该超时把挂死转为显式错误。
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_stream_idle_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_id: None,
            request_timeout_secs: default_request_timeout_secs(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// 加载配置
    ///
    /// 依次尝试: 默认配置文件（存在则读取）→ 环境变量覆盖。
    /// 文件不存在不算错误，按默认值处理。
    pub fn load() -> Result<Self, Box<dyn Error>> {
        let mut config = match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// 从指定路径加载配置文件（JSON）
    pub fn load_from_path(path: &PathBuf) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("无法读取配置文件 {}: {}", path.display(), e))?;
        let config: ClientConfig = serde_json::from_str(&raw)
            .map_err(|e| format!("配置文件解析失败 {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// 默认配置文件路径: 用户配置目录/shearwall-client/config.json
    pub fn default_config_path() -> Option<PathBuf> {
        let dir = dirs::config_dir()?.join("shearwall-client");
        Some(dir.join("config.json"))
    }

    /// 应用环境变量覆盖
    ///
    /// # 环境变量
    /// - SHEARWALL_BASE_URL: 服务基地址
    /// - SHEARWALL_SESSION_ID: 会话 ID
    /// - SHEARWALL_REQUEST_TIMEOUT_SECS: 请求超时（秒）
    /// - SHEARWALL_STREAM_IDLE_TIMEOUT_SECS: 流空闲超时（秒，0 关闭）
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SHEARWALL_BASE_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                self.base_url = trimmed.trim_end_matches('/').to_string();
            }
        }

        if let Ok(session) = std::env::var("SHEARWALL_SESSION_ID") {
            let trimmed = session.trim();
            if !trimmed.is_empty() {
                self.session_id = Some(trimmed.to_string());
            }
        }

        if let Ok(secs) = std::env::var("SHEARWALL_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.trim().parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }

        if let Ok(secs) = std::env::var("SHEARWALL_STREAM_IDLE_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.trim().parse::<u64>() {
                self.stream_idle_timeout_secs = parsed;
            }
        }
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 流空闲超时（0 表示关闭，还原源系统无超时的行为）
    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        if self.stream_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.stream_idle_timeout_secs))
        }
    }
}
