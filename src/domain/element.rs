// ==========================================
// 剪力墙结构分析客户端 - 构件实体
// ==========================================
// 职责: 构件键、构件记录、连梁槽位分配记录
// 说明: 构件记录由服务端全量下发，每次刷新整体替换
// ==========================================

use crate::domain::types::{ElementKind, SlotSide, SlotValue};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 构件键 (Entity Key)
// ==========================================

/// 构件的稳定复合键: `{楼层}_{编号}`
///
/// 在缓存、展开集合、分配登记表中统一作为主键使用。
/// 全量刷新后键保持稳定，行锚点依赖这一点。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// 由楼层与编号构造复合键
    pub fn new(story: &str, label: &str) -> Self {
        EntityKey(format!("{}_{}", story, label))
    }

    /// 由服务端下发的原始键构造
    pub fn from_raw(raw: impl Into<String>) -> Self {
        EntityKey(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 连梁槽位分配记录 (Assignment Record)
// ==========================================

/// 单个构件的左右槽位分配
///
/// 默认 `{generic, generic}`；由 `sync_from_authoritative` 按非对称
/// 合并规则与服务端快照对齐。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub left: SlotValue,
    pub right: SlotValue,
}

impl AssignmentRecord {
    pub fn new(left: SlotValue, right: SlotValue) -> Self {
        Self { left, right }
    }

    /// 是否两侧都还是默认值
    pub fn is_default(&self) -> bool {
        self.left.is_generic() && self.right.is_generic()
    }

    /// 读取指定侧槽位
    pub fn slot(&self, side: SlotSide) -> &SlotValue {
        match side {
            SlotSide::Left => &self.left,
            SlotSide::Right => &self.right,
        }
    }

    /// 写入指定侧槽位
    pub fn set_slot(&mut self, side: SlotSide, value: SlotValue) {
        match side {
            SlotSide::Left => self.left = value,
            SlotSide::Right => self.right = value,
        }
    }
}

// ==========================================
// 构件记录 (Element)
// ==========================================

/// 服务端下发的构件记录
///
/// 每次全量刷新整体替换当前数据集，客户端不做增量合并。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// 楼层
    pub story: String,
    /// 构件编号
    pub label: String,
    /// 构件类型
    pub kind: ElementKind,
    /// 左侧连梁槽位（缺省 generic）
    #[serde(default)]
    pub beam_left: SlotValue,
    /// 右侧连梁槽位（缺省 generic）
    #[serde(default)]
    pub beam_right: SlotValue,
    /// 全组合最不利受弯安全系数
    #[serde(default)]
    pub worst_flexure_sf: Option<f64>,
    /// 全组合最不利受剪需求/能力比
    #[serde(default)]
    pub worst_shear_dcr: Option<f64>,
}

impl Element {
    /// 构件的复合键
    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.story, &self.label)
    }

    /// 构件声明的槽位分配
    pub fn declared_assignment(&self) -> AssignmentRecord {
        AssignmentRecord::new(self.beam_left.clone(), self.beam_right.clone())
    }
}
