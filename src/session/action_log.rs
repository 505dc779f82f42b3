// ==========================================
// 剪力墙结构分析客户端 - 操作审计日志
// ==========================================
// 职责: 记录同步操作的有界内存审计轨迹（诊断用）
// 生命周期: 会话级，重置时清空；不做任何持久化
// ==========================================

use crate::domain::EntityKey;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

/// 操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// 全量数据刷新
    DatasetRefresh,
    /// 展开/折叠
    ExpansionToggle,
    /// 字段编辑已提交
    EditApplied,
    /// 服务端建议已提交
    ProposalApplied,
    /// 连梁分配已提交
    AssignmentCommitted,
    /// 槽位恢复默认
    SlotReset,
    /// 流式操作（上传/整体分析）
    StreamRun,
    /// 会话重置
    SessionReset,
}

/// 单条审计记录
#[derive(Debug, Clone)]
pub struct ActionEntry {
    pub id: Uuid,
    pub kind: ActionKind,
    pub entity: Option<EntityKey>,
    pub detail: String,
    pub at: DateTime<Utc>,
}

// ==========================================
// ActionLog - 操作审计日志
// ==========================================

/// 有界内存审计日志
///
/// 超过容量时丢弃最旧的记录。
pub struct ActionLog {
    capacity: usize,
    entries: Mutex<VecDeque<ActionEntry>>,
}

impl ActionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ActionEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 追加一条记录
    pub fn record(&self, kind: ActionKind, entity: Option<EntityKey>, detail: impl Into<String>) {
        let entry = ActionEntry {
            id: Uuid::new_v4(),
            kind,
            entity,
            detail: detail.into(),
            at: Utc::now(),
        };

        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// 最近 `limit` 条记录（新的在前）
    pub fn recent(&self, limit: usize) -> Vec<ActionEntry> {
        let entries = self.lock();
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 清空（会话重置）
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        // 诊断用途，容量给得宽裕即可
        Self::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_recent() {
        let log = ActionLog::new(8);
        log.record(ActionKind::DatasetRefresh, None, "42 个构件");
        log.record(
            ActionKind::EditApplied,
            Some(EntityKey::from_raw("S1_P1")),
            "n_meshes=2",
        );

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        // 新的在前
        assert_eq!(recent[0].kind, ActionKind::EditApplied);
        assert_eq!(recent[1].kind, ActionKind::DatasetRefresh);
    }

    #[test]
    fn test_capacity_bound() {
        let log = ActionLog::new(3);
        for i in 0..5 {
            log.record(ActionKind::ExpansionToggle, None, format!("t{}", i));
        }

        assert_eq!(log.len(), 3);
        let recent = log.recent(3);
        // 最旧的 t0、t1 已被丢弃
        assert_eq!(recent[2].detail, "t2");
        assert_eq!(recent[0].detail, "t4");
    }

    #[test]
    fn test_clear() {
        let log = ActionLog::default();
        log.record(ActionKind::SessionReset, None, "");
        log.clear();
        assert!(log.is_empty());
    }
}
