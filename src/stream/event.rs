// ==========================================
// 剪力墙结构分析客户端 - 流事件类型
// ==========================================
// 线上格式: {"type": "progress" | "complete" | "error", ...}
// ==========================================

use serde::Deserialize;

/// 进度事件负载
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressEvent {
    /// 已处理数
    pub current: u64,
    /// 总数
    pub total: u64,
    /// 当前处理的构件（可选）
    #[serde(default)]
    pub element: Option<String>,
}

/// 流事件
///
/// `type` 字段为判别器；`complete` 与 `error` 为终结事件，
/// 二者最多出现一个，出现后流即结束。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress(ProgressEvent),
    Complete { result: serde_json::Value },
    Error { message: String },
}

impl StreamEvent {
    /// 是否为终结事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}
