// ==========================================
// 展开状态机集成测试
// ==========================================
// 测试范围:
// 1. toggle 的展开/折叠语义与缓存联动
// 2. 展开→折叠→展开 全程只发一次网络请求（暖缓存）
// 3. expand_all 跳过已缓存键 / toggle_all 的动作返回
// 4. 全量刷新后的过期键裁剪
// ==========================================

mod test_helpers;

use shearwall_client::domain::EntityKey;
use shearwall_client::engine::{
    EntityCombinationCache, ExpansionStateMachine, ToggleAllAction, ToggleOutcome,
};
use std::collections::HashSet;
use std::sync::Arc;
use test_helpers::{make_combo, FakeBackend};

fn machine(backend: &Arc<FakeBackend>) -> ExpansionStateMachine {
    let cache = Arc::new(EntityCombinationCache::new(backend.clone()));
    ExpansionStateMachine::new(cache)
}

#[tokio::test]
async fn test_toggle_expand_then_collapse() {
    let backend = FakeBackend::new();
    let sm = machine(&backend);
    let key = EntityKey::from_raw("S2_P1");

    assert!(!sm.is_expanded(&key));
    assert_eq!(sm.toggle(&key).await.unwrap(), ToggleOutcome::Expanded);
    assert!(sm.is_expanded(&key));
    assert_eq!(backend.fetch_count(&key), 1);

    // 折叠只改集合，不动缓存、不发请求
    assert_eq!(sm.toggle(&key).await.unwrap(), ToggleOutcome::Collapsed);
    assert!(!sm.is_expanded(&key));
    assert_eq!(backend.fetch_count(&key), 1);
}

#[tokio::test]
async fn test_warm_cache_single_fetch_across_toggle_cycle() {
    // 展开→折叠→展开: 暖缓存下整个序列只发一次网络请求
    let backend = FakeBackend::new();
    let sm = machine(&backend);
    let key = EntityKey::from_raw("S2_P1");

    sm.toggle(&key).await.unwrap();
    sm.toggle(&key).await.unwrap();
    sm.toggle(&key).await.unwrap();

    assert!(sm.is_expanded(&key));
    assert_eq!(backend.fetch_count(&key), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_key_expanded() {
    let backend = FakeBackend::new();
    let sm = machine(&backend);
    let key = EntityKey::from_raw("S2_P1");
    backend.set_fail(&key);

    // 获取失败: 错误上抛，但键保持展开（界面显示占位行）
    assert!(sm.toggle(&key).await.is_err());
    assert!(sm.is_expanded(&key));
}

#[tokio::test]
async fn test_expand_all_fetches_only_missing() {
    // 场景 3: B 已缓存、A 未缓存时全部展开，只为 A 发请求
    let backend = FakeBackend::new();
    let cache = Arc::new(EntityCombinationCache::new(backend.clone()));
    let sm = ExpansionStateMachine::new(cache.clone());

    let key_a = EntityKey::from_raw("S1_A");
    let key_b = EntityKey::from_raw("S1_B");
    backend.set_combos(&key_b, vec![make_combo(7)]);
    cache.fetch(&key_b).await.unwrap();
    assert_eq!(backend.total_fetches(), 1);

    sm.expand_all(&[key_a.clone(), key_b.clone()]).await;

    assert!(sm.is_expanded(&key_a) && sm.is_expanded(&key_b));
    assert_eq!(backend.fetch_count(&key_a), 1);
    assert_eq!(backend.fetch_count(&key_b), 1, "已缓存键不应重复获取");
    // B 的缓存内容保持不变
    assert_eq!(cache.get(&key_b).unwrap()[0].index, 7);
}

#[tokio::test]
async fn test_toggle_all_flips_between_states() {
    let backend = FakeBackend::new();
    let sm = machine(&backend);
    let keys = vec![EntityKey::from_raw("S1_A"), EntityKey::from_raw("S1_B")];

    // 无任何展开 → 全部展开
    assert_eq!(sm.toggle_all(&keys).await, ToggleAllAction::ExpandedAll);
    assert!(keys.iter().all(|k| sm.is_expanded(k)));

    // 有展开 → 全部折叠
    assert_eq!(sm.toggle_all(&keys).await, ToggleAllAction::CollapsedAll);
    assert!(keys.iter().all(|k| !sm.is_expanded(k)));
}

#[tokio::test]
async fn test_toggle_all_collapses_on_partial_expansion() {
    let backend = FakeBackend::new();
    let sm = machine(&backend);
    let key_a = EntityKey::from_raw("S1_A");
    let key_b = EntityKey::from_raw("S1_B");

    sm.toggle(&key_a).await.unwrap();

    // 只要有一个键展开，toggle_all 就选择全部折叠
    let action = sm.toggle_all(&[key_a.clone(), key_b.clone()]).await;
    assert_eq!(action, ToggleAllAction::CollapsedAll);
    assert!(!sm.is_expanded(&key_a) && !sm.is_expanded(&key_b));
}

#[tokio::test]
async fn test_retain_dataset_prunes_stale_keys() {
    let backend = FakeBackend::new();
    let sm = machine(&backend);
    let kept = EntityKey::from_raw("S1_A");
    let gone = EntityKey::from_raw("S1_B");

    sm.expand_all(&[kept.clone(), gone.clone()]).await;

    let live: HashSet<EntityKey> = [kept.clone()].into_iter().collect();
    let pruned = sm.retain_dataset(&live);

    assert_eq!(pruned, 1);
    assert!(sm.is_expanded(&kept), "幸存键保持展开");
    assert!(!sm.is_expanded(&gone));
}
