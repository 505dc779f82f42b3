// ==========================================
// 剪力墙结构分析客户端 - 组合内力缓存
// ==========================================
// 职责: 按构件键惰性缓存荷载组合表
// 策略: 无逐出、无 TTL、显式失效、会话级生命周期
// 不变式: 键在缓存中 ⟺ 自上次失效以来至少一次获取成功
// ==========================================

use crate::domain::{Combination, EntityKey};
use crate::engine::backend::CombinationFetcher;
use crate::engine::error::{SyncError, SyncResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type FetchOutcome = Result<Arc<Vec<Combination>>, SyncError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Default)]
struct CacheInner {
    /// 已解析的组合表（获取成功后整体替换）
    entries: HashMap<EntityKey, Arc<Vec<Combination>>>,
    /// 进行中的获取: 同键并发请求共享同一个 future，只发一次网络调用
    in_flight: HashMap<EntityKey, (u64, SharedFetch)>,
    /// 获取序号，用于完成时只摘除自己那一条 in_flight 记录
    next_fetch_id: u64,
    /// 整表失效代数
    epoch: u64,
    /// 单键失效代数
    key_gens: HashMap<EntityKey, u64>,
}

impl CacheInner {
    fn generation(&self, key: &EntityKey) -> (u64, u64) {
        (self.epoch, self.key_gens.get(key).copied().unwrap_or(0))
    }
}

// ==========================================
// EntityCombinationCache - 组合内力缓存
// ==========================================

/// 按构件键惰性缓存组合内力表
///
/// 组合数据读多写少，只有该构件的配筋变更后才会失效，
/// 因此采用平铺、不逐出、显式失效的缓存；`reset` 时整体清空。
pub struct EntityCombinationCache {
    fetcher: Arc<dyn CombinationFetcher>,
    inner: Mutex<CacheInner>,
}

impl EntityCombinationCache {
    /// 创建缓存
    ///
    /// # 参数
    /// - fetcher: 组合内力获取接口（唯一的网络依赖）
    pub fn new(fetcher: Arc<dyn CombinationFetcher>) -> Self {
        Self {
            fetcher,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // 锁只在同步片段内持有，从不跨越 await
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 查询缓存（不触发网络）
    pub fn get(&self, key: &EntityKey) -> Option<Arc<Vec<Combination>>> {
        self.lock().entries.get(key).cloned()
    }

    /// 键是否已缓存
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// 获取单键组合表
    ///
    /// 命中直接返回；未命中发起网络获取，成功后写入缓存。
    /// 同键并发调用共享同一次进行中的获取，只产生一次网络调用。
    /// 失败不写缓存、不重试，键保持缺席。
    pub async fn fetch(&self, key: &EntityKey) -> SyncResult<Arc<Vec<Combination>>> {
        let (fetch_id, shared, snapshot) = {
            let mut inner = self.lock();
            if let Some(hit) = inner.entries.get(key) {
                return Ok(hit.clone());
            }

            let snapshot = inner.generation(key);
            let existing = inner
                .in_flight
                .get(key)
                .map(|(id, shared)| (*id, shared.clone()));
            let (id, shared) = match existing {
                Some(pair) => pair,
                None => {
                    let id = inner.next_fetch_id;
                    inner.next_fetch_id += 1;

                    let fetcher = self.fetcher.clone();
                    let owned_key = key.clone();
                    let shared = async move {
                        fetcher
                            .fetch_combinations(&owned_key)
                            .await
                            .map(Arc::new)
                            .map_err(|e| SyncError::CombinationFetch {
                                key: owned_key.to_string(),
                                message: e.to_string(),
                            })
                    }
                    .boxed()
                    .shared();

                    inner.in_flight.insert(key.clone(), (id, shared.clone()));
                    (id, shared)
                }
            };
            (id, shared, snapshot)
        };

        let outcome = shared.await;

        // await 之后状态可能已变，重新上锁检查而不是沿用获取前的假设
        let mut inner = self.lock();
        // 只摘除自己登记的那条 in_flight（失效后可能已有新一轮获取占位）
        let still_mine = inner
            .in_flight
            .get(key)
            .map(|(id, _)| *id == fetch_id)
            .unwrap_or(false);
        if still_mine {
            inner.in_flight.remove(key);
        }

        match outcome {
            Ok(combinations) => {
                // 获取期间发生过失效则放弃写入，下次重新获取
                if inner.generation(key) == snapshot {
                    inner.entries.insert(key.clone(), combinations.clone());
                }
                Ok(combinations)
            }
            Err(e) => Err(e),
        }
    }

    /// 批量获取: 过滤已缓存的键，其余并行获取并等待全部落定
    ///
    /// 单键失败不影响其他键写入（独立落定，不做 fail-fast）。
    pub async fn fetch_many(&self, keys: &[EntityKey]) {
        let missing: Vec<EntityKey> = {
            let inner = self.lock();
            keys.iter()
                .filter(|k| !inner.entries.contains_key(*k))
                .cloned()
                .collect()
        };
        if missing.is_empty() {
            return;
        }

        let results = futures::future::join_all(missing.iter().map(|k| self.fetch(k))).await;
        for (key, result) in missing.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!("组合内力批量获取失败: entity={}: {}", key, e);
            }
        }
    }

    /// 单键失效（该构件的配筋变更后调用）
    pub fn invalidate(&self, key: &EntityKey) {
        let mut inner = self.lock();
        inner.entries.remove(key);
        inner.in_flight.remove(key);
        *inner.key_gens.entry(key.clone()).or_insert(0) += 1;
    }

    /// 整表失效（会话重置时调用）
    pub fn invalidate_all(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.in_flight.clear();
        inner.epoch += 1;
        inner.key_gens.clear();
    }

    /// 已缓存的键数
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
