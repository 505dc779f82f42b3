// ==========================================
// 剪力墙结构分析客户端 - 领域类型定义
// ==========================================
// 序列化格式: 与服务端 JSON 字段保持一致 (snake_case / 小写)
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// 构件类型 (Element Kind)
// ==========================================
// 封闭集合: 服务端数据表只会出现这几类构件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Pier,         // 墙肢
    CouplingBeam, // 连梁
    Column,       // 柱
}

impl ElementKind {
    /// 转换为字符串标识（与服务端字段值一致）
    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Pier => "pier",
            ElementKind::CouplingBeam => "coupling_beam",
            ElementKind::Column => "column",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 连梁槽位方向 (Slot Side)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSide {
    Left,
    Right,
}

impl SlotSide {
    /// 取对侧槽位
    pub fn opposite(&self) -> SlotSide {
        match self {
            SlotSide::Left => SlotSide::Right,
            SlotSide::Right => SlotSide::Left,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SlotSide::Left => "left",
            SlotSide::Right => "right",
        }
    }
}

impl fmt::Display for SlotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 槽位取值 (Slot Value)
// ==========================================
// 线上格式: "generic" / "none" / 其余字符串均视为目录键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotValue {
    /// 通用默认连梁（未显式指定）
    Generic,
    /// 显式声明无连梁
    None,
    /// 目录中的具体连梁键（如 "S2_V1"）
    Catalog(String),
}

impl SlotValue {
    /// 是否为具体目录键
    pub fn is_catalog(&self) -> bool {
        matches!(self, SlotValue::Catalog(_))
    }

    /// 是否为默认值（generic）
    pub fn is_generic(&self) -> bool {
        matches!(self, SlotValue::Generic)
    }

    /// 线上字符串表示
    pub fn as_wire(&self) -> &str {
        match self {
            SlotValue::Generic => "generic",
            SlotValue::None => "none",
            SlotValue::Catalog(key) => key.as_str(),
        }
    }
}

impl Default for SlotValue {
    fn default() -> Self {
        SlotValue::Generic
    }
}

impl From<String> for SlotValue {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "" | "generic" => SlotValue::Generic,
            "none" => SlotValue::None,
            key => SlotValue::Catalog(key.to_string()),
        }
    }
}

impl From<SlotValue> for String {
    fn from(value: SlotValue) -> Self {
        value.as_wire().to_string()
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

// ==========================================
// 变更集 (Changeset)
// ==========================================

/// 字段级变更集: 字段名 → 值
///
/// 始终是完整快照（schema 中的每个字段都有值），不是增量 diff。
/// 使用 BTreeMap 保证序列化顺序稳定。
pub type Changeset = BTreeMap<String, serde_json::Value>;
