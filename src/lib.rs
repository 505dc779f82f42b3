// ==========================================
// 剪力墙结构分析客户端 - 核心库
// ==========================================
// 技术栈: Rust + tokio + reqwest
// 系统定位: 远程结构分析服务的同步引擎 (服务端拥有计算权威)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// API 层 - 远程服务访问
pub mod api;

// 流式协议层 - SSE 风格进度流
pub mod stream;

// 引擎层 - 同步状态机
pub mod engine;

// 会话层 - 操作审计
pub mod session;

// 配置层 - 客户端配置
pub mod config;

// 日志系统
pub mod logging;

// 应用层 - 服务组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AssignmentRecord, Changeset, Combination, Element, ElementKind, EntityKey, SlotSide, SlotValue,
};

// API
pub use api::{AnalysisClient, ApiError, ApiResult};

// 流式协议
pub use stream::{ProgressEvent, StreamClient, StreamDecoder, StreamError, StreamEvent};

// 引擎
pub use engine::{
    CouplingAssignmentRegistry, EditReconciler, EntityCombinationCache, ExpansionStateMachine,
    RefreshSummary, Row, SyncError, SyncOrchestrator, SyncResult, ToggleAllAction, ToggleOutcome,
};

// 配置
pub use config::ClientConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "剪力墙结构分析客户端";

// 流协议帧前缀
pub const STREAM_FRAME_PREFIX: &str = "data: ";
