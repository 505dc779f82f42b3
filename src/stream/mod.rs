// ==========================================
// 剪力墙结构分析客户端 - 流式协议层
// ==========================================
// 职责: 解析批处理操作的进度流 (换行分帧的 "data: <json>")
// 说明: 纯协议解析，不感知 UI；终结事件恰好派发一次
// ==========================================

pub mod client;
pub mod decoder;
pub mod error;
pub mod event;

// 重导出核心类型
pub use client::StreamClient;
pub use decoder::StreamDecoder;
pub use error::{StreamError, StreamResult};
pub use event::{ProgressEvent, StreamEvent};
