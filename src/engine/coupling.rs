// ==========================================
// 剪力墙结构分析客户端 - 连梁分配登记表
// ==========================================
// 职责: 每个构件左右两个槽位的本地分配状态
// 约束: 同一目录连梁不能同时占据一个构件的两个槽位
//       （界面预防: 对侧已占用的候选标记为不可选，而非事后报错）
// ==========================================

use crate::domain::{AssignmentRecord, Element, EntityKey, SlotSide, SlotValue};
use std::collections::HashMap;
use std::sync::Mutex;

/// 供界面渲染的候选项: 值 + 是否可选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOption {
    pub value: SlotValue,
    pub selectable: bool,
}

// ==========================================
// CouplingAssignmentRegistry - 连梁分配登记表
// ==========================================

/// 连梁分配登记表
///
/// 记录按需惰性建立，默认 `{generic, generic}`；
/// 与服务端快照的对齐走非对称合并（见 `sync_from_authoritative`）。
pub struct CouplingAssignmentRegistry {
    records: Mutex<HashMap<EntityKey, AssignmentRecord>>,
}

impl CouplingAssignmentRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EntityKey, AssignmentRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 读取指定侧槽位；未知构件返回默认 generic
    pub fn get_slot(&self, key: &EntityKey, side: SlotSide) -> SlotValue {
        self.lock()
            .get(key)
            .map(|r| r.slot(side).clone())
            .unwrap_or_default()
    }

    /// 读取整条分配记录；未知构件返回默认记录
    pub fn record(&self, key: &EntityKey) -> AssignmentRecord {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    /// 写入指定侧槽位（纯本地变更，不触发服务端调用）
    pub fn set_slot(&self, key: &EntityKey, side: SlotSide, value: SlotValue) {
        let mut records = self.lock();
        records.entry(key.clone()).or_default().set_slot(side, value);
    }

    /// 生成指定侧的候选列表
    ///
    /// 与对侧当前具体目录键相同的候选被标记为不可选（保留在列表中，
    /// 不移除），在界面层面阻止同一连梁占据两个槽位。
    pub fn build_options(
        &self,
        key: &EntityKey,
        side: SlotSide,
        candidates: &[SlotValue],
    ) -> Vec<SlotOption> {
        let opposite = self.get_slot(key, side.opposite());

        candidates
            .iter()
            .map(|candidate| {
                let blocked = candidate.is_catalog() && *candidate == opposite;
                SlotOption {
                    value: candidate.clone(),
                    selectable: !blocked,
                }
            })
            .collect()
    }

    /// 与服务端权威快照对齐（非对称合并）
    ///
    /// - 构件声明了非默认分配: 本地记录被权威记录整体覆盖
    /// - 构件未声明（两侧都是 generic）: 已有本地记录保持不动，
    ///   只在缺席时补默认记录
    ///
    /// 这样别人触发的全表刷新不会冲掉本机进行中的编辑，
    /// 同时服务端已确认的分配仍然会被接收。幂等: 同一输入重复
    /// 调用结果不变。
    pub fn sync_from_authoritative(&self, elements: &[Element]) {
        let mut records = self.lock();
        for element in elements {
            let key = element.key();
            let declared = element.declared_assignment();

            if !declared.is_default() {
                records.insert(key, declared);
            } else {
                records.entry(key).or_default();
            }
        }
    }

    /// 清空全部记录（会话重置）
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// 已登记的构件数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for CouplingAssignmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
