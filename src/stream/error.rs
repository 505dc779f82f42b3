// ==========================================
// 剪力墙结构分析客户端 - 流式协议层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 流式协议层错误类型
///
/// 每条流恰好以一个终结结果收尾: `Ok(result)` 或其中一个错误变体。
#[derive(Error, Debug)]
pub enum StreamError {
    // ===== 协议错误 =====
    /// 流在未派发终结事件的情况下结束
    #[error("stream closed without complete event")]
    ClosedWithoutComplete,

    // ===== 应用错误 =====
    /// 服务端通过 error 事件主动报告的失败
    #[error("{0}")]
    Server(String),

    // ===== 传输错误 =====
    /// 初始响应状态非 2xx，不再按流读取响应体
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 读取流数据块失败
    #[error("流读取失败: {0}")]
    Transport(String),

    /// 超过空闲超时仍未收到任何字节
    #[error("流空闲超时: {0} 秒内未收到数据")]
    IdleTimeout(u64),
}

/// Result 类型别名
pub type StreamResult<T> = Result<T, StreamError>;
