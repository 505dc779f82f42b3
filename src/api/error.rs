// ==========================================
// 剪力墙结构分析客户端 - API 层错误类型
// ==========================================
// 职责: 定义远程访问错误类型；所有失败路径恰好收束为一次拒绝
// 工具: thiserror 派生宏
// ==========================================

use crate::stream::StreamError;
use thiserror::Error;

/// API 层错误类型
///
/// 本子系统不做任何自动重试；每个失败只报告一次，由调用方决定后续。
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 传输错误 =====
    /// 非 2xx 响应（状态 + 响应体原文）
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 网络层失败（连接、超时、TLS 等）
    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    // ===== 协议错误 =====
    /// 2xx 响应但响应体无法按预期结构解析
    #[error("响应解析失败 ({context}): {message}")]
    Decode { context: String, message: String },

    /// 流式协议错误（透传流层的终结错误）
    #[error(transparent)]
    Stream(#[from] StreamError),

    // ===== 应用错误 =====
    /// 服务端以 success=false 拒绝本次操作
    #[error("服务端返回失败: {0}")]
    ServerRejected(String),

    /// 会话尚未建立
    #[error("会话未初始化，请先上传模型或配置 session_id")]
    SessionNotInitialized,

    /// 客户端不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_format() {
        // 非 2xx 的错误信息格式固定为 "HTTP {status}: {body}"
        let err = ApiError::Http {
            status: 422,
            body: "{\"detail\":\"bad model\"}".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 422: {\"detail\":\"bad model\"}");
    }

    #[test]
    fn test_stream_error_transparent() {
        let err: ApiError = StreamError::ClosedWithoutComplete.into();
        assert_eq!(err.to_string(), "stream closed without complete event");
    }
}
