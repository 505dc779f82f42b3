#![allow(dead_code)]
// ==========================================
// 测试辅助: 假后端与假视图
// ==========================================
// 职责: 为集成测试提供可编程的窄接口假实现
// 说明: 引擎只依赖 backend 中的 trait，测试据此替换网络层
// ==========================================

use async_trait::async_trait;
use shearwall_client::api::{ApiError, ApiResult};
use shearwall_client::domain::{
    AssignmentRecord, Changeset, Combination, Element, ElementKind, EntityKey, SlotSide, SlotValue,
};
use shearwall_client::engine::{
    AssignmentBackend, ChangesetApplier, CombinationFetcher, ElementSource, StreamingBackend,
    ViewStateBridge,
};
use shearwall_client::stream::ProgressEvent;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// 构造辅助
// ==========================================

pub fn make_element(story: &str, label: &str, kind: ElementKind) -> Element {
    Element {
        story: story.to_string(),
        label: label.to_string(),
        kind,
        beam_left: SlotValue::Generic,
        beam_right: SlotValue::Generic,
        worst_flexure_sf: Some(1.2),
        worst_shear_dcr: Some(0.9),
    }
}

pub fn make_combo(index: u32) -> Combination {
    Combination {
        index,
        name: format!("C{}", index),
        full_name: format!("组合 {}", index),
        p: -100.0 * index as f64,
        m2: 1.0,
        m3: 2.0,
        v2: 3.0,
        v3: 4.0,
        flexure_sf: 1.5,
        shear_sf_combined: 1.3,
        shear_dcr_combined: 0.7,
    }
}

// ==========================================
// FakeBackend - 可编程假后端
// ==========================================

/// 同时实现引擎层四个窄接口的假后端
///
/// 可配置: 每键组合表、每键获取延迟（测乱序完成）、失败键。
/// 记录: 组合获取次数、收到的变更集、收到的分配提交。
#[derive(Default)]
pub struct FakeBackend {
    pub elements: Mutex<Vec<Element>>,
    pub combos: Mutex<HashMap<EntityKey, Vec<Combination>>>,
    pub fetch_delays: Mutex<HashMap<EntityKey, u64>>,
    pub fail_keys: Mutex<HashSet<EntityKey>>,
    pub fetch_log: Mutex<Vec<EntityKey>>,
    pub applied: Mutex<Vec<(EntityKey, ElementKind, Changeset)>>,
    pub assigned: Mutex<Vec<(EntityKey, AssignmentRecord)>>,
    pub fail_elements: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_elements(&self, elements: Vec<Element>) {
        *self.elements.lock().unwrap() = elements;
    }

    pub fn set_combos(&self, key: &EntityKey, combos: Vec<Combination>) {
        self.combos.lock().unwrap().insert(key.clone(), combos);
    }

    /// 设置单键获取延迟（毫秒），用于构造完成顺序
    pub fn set_fetch_delay(&self, key: &EntityKey, millis: u64) {
        self.fetch_delays.lock().unwrap().insert(key.clone(), millis);
    }

    pub fn set_fail(&self, key: &EntityKey) {
        self.fail_keys.lock().unwrap().insert(key.clone());
    }

    /// 某键的组合获取次数
    pub fn fetch_count(&self, key: &EntityKey) -> usize {
        self.fetch_log
            .lock()
            .unwrap()
            .iter()
            .filter(|k| *k == key)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_log.lock().unwrap().len()
    }

    fn element_of(&self, key: &EntityKey) -> ApiResult<Element> {
        self.elements
            .lock()
            .unwrap()
            .iter()
            .find(|e| &e.key() == key)
            .cloned()
            .ok_or_else(|| ApiError::ServerRejected(format!("unknown pier: {}", key)))
    }
}

#[async_trait]
impl CombinationFetcher for FakeBackend {
    async fn fetch_combinations(&self, key: &EntityKey) -> ApiResult<Vec<Combination>> {
        let delay = self.fetch_delays.lock().unwrap().get(key).copied();
        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }

        self.fetch_log.lock().unwrap().push(key.clone());

        if self.fail_keys.lock().unwrap().contains(key) {
            return Err(ApiError::Http {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        Ok(self
            .combos
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| vec![make_combo(1)]))
    }
}

#[async_trait]
impl ElementSource for FakeBackend {
    async fn fetch_elements(&self) -> ApiResult<Vec<Element>> {
        if *self.fail_elements.lock().unwrap() {
            return Err(ApiError::Http {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(self.elements.lock().unwrap().clone())
    }
}

#[async_trait]
impl ChangesetApplier for FakeBackend {
    async fn apply_changeset(
        &self,
        key: &EntityKey,
        kind: ElementKind,
        changeset: &Changeset,
    ) -> ApiResult<Element> {
        self.applied
            .lock()
            .unwrap()
            .push((key.clone(), kind, changeset.clone()));

        // 权威回传: 配筋变更后最不利系数被服务端重算
        let mut element = self.element_of(key)?;
        element.worst_flexure_sf = Some(2.0);
        Ok(element)
    }
}

#[async_trait]
impl AssignmentBackend for FakeBackend {
    async fn assign_coupling_beam(
        &self,
        key: &EntityKey,
        record: &AssignmentRecord,
    ) -> ApiResult<Element> {
        self.assigned
            .lock()
            .unwrap()
            .push((key.clone(), record.clone()));

        let mut element = self.element_of(key)?;
        element.beam_left = record.left.clone();
        element.beam_right = record.right.clone();
        Ok(element)
    }

    async fn set_default_beam(&self, key: &EntityKey, side: SlotSide) -> ApiResult<Element> {
        let mut element = self.element_of(key)?;
        match side {
            SlotSide::Left => element.beam_left = SlotValue::Generic,
            SlotSide::Right => element.beam_right = SlotValue::Generic,
        }
        Ok(element)
    }

    async fn create_custom_beam(
        &self,
        key: &EntityKey,
        side: SlotSide,
        _changeset: &Changeset,
    ) -> ApiResult<Element> {
        let mut element = self.element_of(key)?;
        let custom = SlotValue::Catalog(format!("CUSTOM_{}", key));
        match side {
            SlotSide::Left => element.beam_left = custom,
            SlotSide::Right => element.beam_right = custom,
        }
        Ok(element)
    }
}

#[async_trait]
impl StreamingBackend for FakeBackend {
    async fn upload_model(
        &self,
        _payload: &serde_json::Value,
        on_progress: &mut (dyn for<'a> FnMut(&'a ProgressEvent) + Send),
    ) -> ApiResult<serde_json::Value> {
        on_progress(&ProgressEvent {
            current: 1,
            total: 1,
            element: None,
        });
        Ok(serde_json::json!({ "session_id": "fake-session" }))
    }

    async fn run_analysis(
        &self,
        on_progress: &mut (dyn for<'a> FnMut(&'a ProgressEvent) + Send),
    ) -> ApiResult<serde_json::Value> {
        on_progress(&ProgressEvent {
            current: 1,
            total: 1,
            element: None,
        });
        Ok(serde_json::json!({ "success": true }))
    }
}

// ==========================================
// FakeView - 可编程假视图状态
// ==========================================

/// 视图状态桥接的假实现: 内存表 + 启用态记录
#[derive(Default)]
pub struct FakeView {
    values: Mutex<HashMap<(EntityKey, String), String>>,
    enabled: Mutex<HashMap<(EntityKey, String), bool>>,
}

impl FakeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, key: &EntityKey, source: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert((key.clone(), source.to_string()), value.to_string());
    }

    /// 查询字段启用态（未被联动触碰过返回 None）
    pub fn enabled_of(&self, key: &EntityKey, source: &str) -> Option<bool> {
        self.enabled
            .lock()
            .unwrap()
            .get(&(key.clone(), source.to_string()))
            .copied()
    }
}

impl ViewStateBridge for FakeView {
    fn read_field(&self, key: &EntityKey, source: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap()
            .get(&(key.clone(), source.to_string()))
            .cloned()
    }

    fn set_field_enabled(&self, key: &EntityKey, source: &str, enabled: bool) {
        self.enabled
            .lock()
            .unwrap()
            .insert((key.clone(), source.to_string()), enabled);
    }
}
