// ==========================================
// 剪力墙结构分析客户端 - 行模型
// ==========================================
// 职责: 父行 + 子行（组合/占位）的有序视图模型
// 不变式: 子行永远紧跟在自己父行之后成块出现；
//         锚点是父行的键（而非下标），与网络完成顺序无关
// ==========================================

use crate::domain::{Combination, Element, EntityKey};

/// 表格中的一行
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// 构件父行
    Element { key: EntityKey },
    /// 展开后数据未到时的占位子行
    Placeholder { parent: EntityKey },
    /// 单条组合子行
    Combination {
        parent: EntityKey,
        combination: Combination,
    },
}

impl Row {
    /// 是否为指定父行的子行（占位或组合）
    fn is_child_of(&self, key: &EntityKey) -> bool {
        match self {
            Row::Element { .. } => false,
            Row::Placeholder { parent } | Row::Combination { parent, .. } => parent == key,
        }
    }
}

// ==========================================
// RowModel - 行模型
// ==========================================

/// 有序行模型
///
/// 全量刷新时按数据集顺序重建父行；子行通过"按键定位锚点、
/// 锚点之后整块替换"的方式插入，因此多个构件并发展开时，
/// 无论各自的获取谁先完成，块与块都不会交错。
#[derive(Debug, Default)]
pub struct RowModel {
    rows: Vec<Row>,
}

impl RowModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按数据集顺序重建父行（不带任何子行）
    pub fn rebuild(elements: &[Element]) -> Self {
        Self {
            rows: elements
                .iter()
                .map(|e| Row::Element { key: e.key() })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 父行下标（锚点按键查找）
    fn anchor_of(&self, parent: &EntityKey) -> Option<usize> {
        self.rows.iter().position(
            |row| matches!(row, Row::Element { key } if key == parent),
        )
    }

    /// 摘除锚点之后属于该父行的整块子行，返回锚点下标
    fn remove_block(&mut self, parent: &EntityKey) -> Option<usize> {
        let anchor = self.anchor_of(parent)?;
        let mut end = anchor + 1;
        while end < self.rows.len() && self.rows[end].is_child_of(parent) {
            end += 1;
        }
        self.rows.drain(anchor + 1..end);
        Some(anchor)
    }

    /// 在父行之后放置占位子行（展开但数据未到）
    pub fn set_placeholder(&mut self, parent: &EntityKey) {
        if let Some(anchor) = self.remove_block(parent) {
            self.rows.insert(
                anchor + 1,
                Row::Placeholder {
                    parent: parent.clone(),
                },
            );
        }
    }

    /// 在父行之后整块放置组合子行（替换既有子行/占位行）
    ///
    /// 父行不在当前模型中（过期键）时静默忽略。
    pub fn set_children(&mut self, parent: &EntityKey, combinations: &[Combination]) {
        let anchor = match self.remove_block(parent) {
            Some(a) => a,
            None => return,
        };

        let children = combinations.iter().map(|c| Row::Combination {
            parent: parent.clone(),
            combination: c.clone(),
        });
        self.rows.splice(anchor + 1..anchor + 1, children);
    }

    /// 摘除该父行的全部子行（折叠）
    pub fn clear_children(&mut self, parent: &EntityKey) {
        self.remove_block(parent);
    }

    /// 某父行当前的子行数（不含占位行）
    pub fn children_of(&self, parent: &EntityKey) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row, Row::Combination { parent: p, .. } if p == parent))
            .count()
    }
}
