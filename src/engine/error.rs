// ==========================================
// 剪力墙结构分析客户端 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 引擎层错误可克隆（同一次去重后的获取可能被多个等待方共享）
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    // ===== 数据获取错误 =====
    #[error("组合内力获取失败: entity={key}: {message}")]
    CombinationFetch { key: String, message: String },

    #[error("构件数据加载失败: {0}")]
    DatasetLoad(String),

    // ===== 流式操作错误 =====
    #[error("流式操作失败: {0}")]
    StreamOperation(String),

    // ===== 编辑归并错误 =====
    #[error("未注册的构件类型 schema: {0}")]
    SchemaMissing(String),

    #[error("变更应用失败: entity={key}: {message}")]
    ApplyFailed { key: String, message: String },

    // ===== 数据一致性错误 =====
    #[error("构件不存在于当前数据集: {0}")]
    EntityNotFound(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Result 类型别名
pub type SyncResult<T> = Result<T, SyncError>;
