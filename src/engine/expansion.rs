// ==========================================
// 剪力墙结构分析客户端 - 展开状态机
// ==========================================
// 职责: 跟踪哪些构件处于展开态（子行可见）
// 不变式: 展开 ⇏ 已缓存 —— 键可以在数据未到时先展开（占位行）
// 刷新策略: 全量刷新时裁剪掉不在新数据集中的键，幸存键保持展开
// ==========================================

use crate::domain::EntityKey;
use crate::engine::combination_cache::EntityCombinationCache;
use crate::engine::error::SyncResult;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// `toggle` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// 本次调用把构件展开了
    Expanded,
    /// 本次调用把构件折叠了
    Collapsed,
}

/// `toggle_all` 实际执行的动作（调用方据此翻转全局开关的显示态）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAllAction {
    ExpandedAll,
    CollapsedAll,
}

// ==========================================
// ExpansionStateMachine - 展开状态机
// ==========================================

/// 展开集合
///
/// 展开触发缓存获取；折叠只改集合，不动缓存。
pub struct ExpansionStateMachine {
    cache: Arc<EntityCombinationCache>,
    expanded: Mutex<HashSet<EntityKey>>,
}

impl ExpansionStateMachine {
    pub fn new(cache: Arc<EntityCombinationCache>) -> Self {
        Self {
            cache,
            expanded: Mutex::new(HashSet::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<EntityKey>> {
        self.expanded.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 键是否处于展开态
    pub fn is_expanded(&self, key: &EntityKey) -> bool {
        self.lock().contains(key)
    }

    /// 当前展开集合的快照
    pub fn snapshot(&self) -> HashSet<EntityKey> {
        self.lock().clone()
    }

    /// 展开/折叠单个构件
    ///
    /// 展开时若缓存未命中则触发获取并等待；获取失败时键仍保持展开
    /// （界面显示占位行），错误上抛由调用方处置。
    pub async fn toggle(&self, key: &EntityKey) -> SyncResult<ToggleOutcome> {
        let was_expanded = {
            let mut expanded = self.lock();
            if expanded.contains(key) {
                expanded.remove(key);
                true
            } else {
                expanded.insert(key.clone());
                false
            }
        };

        if was_expanded {
            return Ok(ToggleOutcome::Collapsed);
        }

        if self.cache.get(key).is_none() {
            self.cache.fetch(key).await?;
        }
        Ok(ToggleOutcome::Expanded)
    }

    /// 全部展开/全部折叠
    ///
    /// 只要有任何一个键已展开就全部折叠，否则全部展开。
    pub async fn toggle_all(&self, all_keys: &[EntityKey]) -> ToggleAllAction {
        let any_expanded = {
            let expanded = self.lock();
            all_keys.iter().any(|k| expanded.contains(k))
        };

        if any_expanded {
            self.collapse_all();
            ToggleAllAction::CollapsedAll
        } else {
            self.expand_all(all_keys).await;
            ToggleAllAction::ExpandedAll
        }
    }

    /// 展开全部给定键，并批量预取缺失的组合表
    pub async fn expand_all(&self, keys: &[EntityKey]) {
        {
            let mut expanded = self.lock();
            expanded.extend(keys.iter().cloned());
        }
        self.cache.fetch_many(keys).await;
    }

    /// 全部折叠（不触碰缓存）
    pub fn collapse_all(&self) {
        self.lock().clear();
    }

    /// 全量刷新后裁剪: 只保留仍存在于新数据集中的键
    ///
    /// # 返回
    /// - 被裁剪掉的过期键数量
    pub fn retain_dataset(&self, live: &HashSet<EntityKey>) -> usize {
        let mut expanded = self.lock();
        let before = expanded.len();
        expanded.retain(|k| live.contains(k));
        before - expanded.len()
    }
}
