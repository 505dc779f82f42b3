// ==========================================
// 剪力墙结构分析客户端 - 引擎层
// ==========================================
// 职责: 客户端同步状态机（缓存 / 展开 / 分配 / 编辑归并 / 编排）
// 说明: 引擎只依赖 backend 中的窄接口，不依赖具体 HTTP 客户端
// ==========================================

pub mod backend;
pub mod combination_cache;
pub mod coupling;
pub mod error;
pub mod expansion;
pub mod orchestrator;
pub mod reconciler;
pub mod row_model;

// 重导出核心类型
pub use backend::{
    AssignmentBackend, ChangesetApplier, CombinationFetcher, ElementSource, StreamingBackend,
};
pub use combination_cache::EntityCombinationCache;
pub use coupling::{CouplingAssignmentRegistry, SlotOption};
pub use error::{SyncError, SyncResult};
pub use expansion::{ExpansionStateMachine, ToggleAllAction, ToggleOutcome};
pub use orchestrator::{RefreshSummary, SyncOrchestrator};
pub use reconciler::{DependentToggle, EditReconciler, FieldParse, FieldSpec, ViewStateBridge};
pub use row_model::{Row, RowModel};
