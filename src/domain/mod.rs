// ==========================================
// 剪力墙结构分析客户端 - 领域层
// ==========================================
// 职责: 实体、组合内力记录与基础类型
// ==========================================

pub mod combination;
pub mod element;
pub mod types;

// 重导出核心类型
pub use combination::Combination;
pub use element::{AssignmentRecord, Element, EntityKey};
pub use types::{Changeset, ElementKind, SlotSide, SlotValue};
