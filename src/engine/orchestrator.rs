// ==========================================
// 剪力墙结构分析客户端 - 同步编排器
// ==========================================
// 职责: 把缓存/展开/分配/归并四个服务接到数据刷新周期上
// 周期: 全量加载 → 登记表对齐 → 行模型重建 → 展开与缓存再武装
// 并发模型: 单线程协作式；锁只在同步片段内持有，
//           每个 await 之后都重新检查共享状态
// ==========================================

use crate::domain::{Element, ElementKind, EntityKey, SlotSide, SlotValue};
use crate::engine::backend::{AssignmentBackend, ElementSource, StreamingBackend};
use crate::engine::combination_cache::EntityCombinationCache;
use crate::engine::coupling::CouplingAssignmentRegistry;
use crate::engine::error::{SyncError, SyncResult};
use crate::engine::expansion::{ExpansionStateMachine, ToggleAllAction, ToggleOutcome};
use crate::engine::reconciler::{EditReconciler, ViewStateBridge};
use crate::engine::row_model::{Row, RowModel};
use crate::session::{ActionKind, ActionLog};
use crate::stream::ProgressEvent;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 一次全量刷新的结果摘要
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    /// 数据集构件数
    pub element_count: usize,
    /// 被裁剪的过期展开键数
    pub pruned_expansions: usize,
    /// 刷新后重新发起的组合获取数
    pub rearmed_fetches: usize,
    /// 耗时（毫秒）
    pub elapsed_ms: u64,
}

// ==========================================
// SyncOrchestrator - 同步编排器
// ==========================================

/// 同步编排器
///
/// 持有当前数据集（每次刷新整体替换）与行模型，
/// 通过窄接口访问服务端，不感知具体 HTTP 客户端。
pub struct SyncOrchestrator {
    source: Arc<dyn ElementSource>,
    assignments: Arc<dyn AssignmentBackend>,
    streams: Arc<dyn StreamingBackend>,
    cache: Arc<EntityCombinationCache>,
    expansion: Arc<ExpansionStateMachine>,
    registry: Arc<CouplingAssignmentRegistry>,
    reconciler: Arc<EditReconciler>,
    action_log: Arc<ActionLog>,
    elements: Mutex<Vec<Element>>,
    rows: Mutex<RowModel>,
}

impl SyncOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn ElementSource>,
        assignments: Arc<dyn AssignmentBackend>,
        streams: Arc<dyn StreamingBackend>,
        cache: Arc<EntityCombinationCache>,
        expansion: Arc<ExpansionStateMachine>,
        registry: Arc<CouplingAssignmentRegistry>,
        reconciler: Arc<EditReconciler>,
        action_log: Arc<ActionLog>,
    ) -> Self {
        Self {
            source,
            assignments,
            streams,
            cache,
            expansion,
            registry,
            reconciler,
            action_log,
            elements: Mutex::new(Vec::new()),
            rows: Mutex::new(RowModel::new()),
        }
    }

    fn lock_elements(&self) -> std::sync::MutexGuard<'_, Vec<Element>> {
        self.elements.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, RowModel> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ==========================================
    // 数据集查询
    // ==========================================

    /// 当前数据集的构件键（数据集顺序）
    pub fn element_keys(&self) -> Vec<EntityKey> {
        self.lock_elements().iter().map(|e| e.key()).collect()
    }

    /// 按键查构件记录
    pub fn element(&self, key: &EntityKey) -> Option<Element> {
        self.lock_elements().iter().find(|e| &e.key() == key).cloned()
    }

    fn kind_of(&self, key: &EntityKey) -> SyncResult<ElementKind> {
        self.element(key)
            .map(|e| e.kind)
            .ok_or_else(|| SyncError::EntityNotFound(key.to_string()))
    }

    /// 行模型快照（渲染层的输入）
    pub fn rows_snapshot(&self) -> Vec<Row> {
        self.lock_rows().rows().to_vec()
    }

    // ==========================================
    // 刷新周期
    // ==========================================

    /// 全量刷新
    ///
    /// 数据集整体替换；登记表按非对称合并规则对齐；展开集合
    /// 裁剪掉过期键，幸存键的子行由缓存恢复或重新获取。
    pub async fn refresh(&self) -> SyncResult<RefreshSummary> {
        let started = Instant::now();

        let elements = self
            .source
            .fetch_elements()
            .await
            .map_err(|e| SyncError::DatasetLoad(e.to_string()))?;

        // === 步骤 1: 登记表对齐 ===
        self.registry.sync_from_authoritative(&elements);

        // === 步骤 2: 展开集合裁剪 ===
        let live: HashSet<EntityKey> = elements.iter().map(|e| e.key()).collect();
        let pruned = self.expansion.retain_dataset(&live);

        // === 步骤 3: 行模型重建 ===
        // 展开键先恢复缓存子行或放占位行；占位行同时固定了锚点
        let mut model = RowModel::rebuild(&elements);
        let expanded = self.expansion.snapshot();
        let mut missing: Vec<EntityKey> = Vec::new();
        for element in &elements {
            let key = element.key();
            if !expanded.contains(&key) {
                continue;
            }
            match self.cache.get(&key) {
                Some(combinations) => model.set_children(&key, &combinations),
                None => {
                    model.set_placeholder(&key);
                    missing.push(key);
                }
            }
        }

        let element_count = elements.len();
        {
            *self.lock_elements() = elements;
            *self.lock_rows() = model;
        }

        // === 步骤 4: 缺失键再武装 ===
        let rearmed = missing.len();
        if !missing.is_empty() {
            self.cache.fetch_many(&missing).await;
            // await 之后展开态可能已变，逐键重新检查后再填充
            for key in &missing {
                self.fill_children_if_ready(key);
            }
        }

        let summary = RefreshSummary {
            element_count,
            pruned_expansions: pruned,
            rearmed_fetches: rearmed,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "全量刷新完成: elements={}, pruned={}, rearmed={}, elapsed={}ms",
            summary.element_count,
            summary.pruned_expansions,
            summary.rearmed_fetches,
            summary.elapsed_ms
        );
        self.action_log.record(
            ActionKind::DatasetRefresh,
            None,
            format!("elements={}", summary.element_count),
        );
        Ok(summary)
    }

    /// 缓存就绪且仍处展开态时填充子行；已折叠则清掉残留子行
    fn fill_children_if_ready(&self, key: &EntityKey) {
        if !self.expansion.is_expanded(key) {
            self.lock_rows().clear_children(key);
            return;
        }
        if let Some(combinations) = self.cache.get(key) {
            self.lock_rows().set_children(key, &combinations);
        }
    }

    // ==========================================
    // 展开/折叠
    // ==========================================

    /// 展开/折叠单个构件
    pub async fn toggle(&self, key: &EntityKey) -> SyncResult<ToggleOutcome> {
        // 折叠路径全程同步
        if self.expansion.is_expanded(key) {
            let outcome = self.expansion.toggle(key).await?;
            self.lock_rows().clear_children(key);
            self.action_log
                .record(ActionKind::ExpansionToggle, Some(key.clone()), "折叠");
            return Ok(outcome);
        }

        // 展开: 占位行先落位（锚点在任何等待之前固定），再等数据
        self.lock_rows().set_placeholder(key);
        let result = self.expansion.toggle(key).await;
        self.fill_children_if_ready(key);
        self.action_log
            .record(ActionKind::ExpansionToggle, Some(key.clone()), "展开");
        result
    }

    /// 展开全部构件并预取缺失的组合表
    pub async fn expand_all(&self) {
        let keys = self.element_keys();

        // 锚点在 fetch_many 之前固定: 已缓存的直接落子行，其余落占位行
        let mut missing: Vec<EntityKey> = Vec::new();
        {
            let mut rows = self.lock_rows();
            for key in &keys {
                match self.cache.get(key) {
                    Some(combinations) => rows.set_children(key, &combinations),
                    None => {
                        rows.set_placeholder(key);
                        missing.push(key.clone());
                    }
                }
            }
        }

        self.expansion.expand_all(&keys).await;

        for key in &missing {
            self.fill_children_if_ready(key);
        }
        self.action_log.record(
            ActionKind::ExpansionToggle,
            None,
            format!("全部展开: {} 个构件", keys.len()),
        );
    }

    /// 折叠全部构件
    pub fn collapse_all(&self) {
        self.expansion.collapse_all();
        let elements = self.lock_elements();
        *self.lock_rows() = RowModel::rebuild(&elements);
        self.action_log
            .record(ActionKind::ExpansionToggle, None, "全部折叠");
    }

    /// 全局开关: 有任一展开则全部折叠，否则全部展开
    pub async fn toggle_all(&self) -> ToggleAllAction {
        let keys = self.element_keys();
        let any_expanded = keys.iter().any(|k| self.expansion.is_expanded(k));

        if any_expanded {
            self.collapse_all();
            ToggleAllAction::CollapsedAll
        } else {
            self.expand_all().await;
            ToggleAllAction::ExpandedAll
        }
    }

    // ==========================================
    // 流式操作
    // ==========================================

    /// 上传结构模型（流式进度），完成后记录审计
    pub async fn upload_model(
        &self,
        payload: &serde_json::Value,
        mut on_progress: impl FnMut(&ProgressEvent) + Send,
    ) -> SyncResult<serde_json::Value> {
        let result = self
            .streams
            .upload_model(payload, &mut on_progress)
            .await
            .map_err(|e| SyncError::StreamOperation(format!("模型上传: {}", e)))?;

        self.action_log
            .record(ActionKind::StreamRun, None, "模型上传完成");
        Ok(result)
    }

    /// 运行整体分析（流式进度），完成后记录审计
    ///
    /// 分析会改变服务端的组合结果；调用方随后应当执行一次全量刷新。
    pub async fn run_analysis(
        &self,
        mut on_progress: impl FnMut(&ProgressEvent) + Send,
    ) -> SyncResult<serde_json::Value> {
        let result = self
            .streams
            .run_analysis(&mut on_progress)
            .await
            .map_err(|e| SyncError::StreamOperation(format!("整体分析: {}", e)))?;

        self.action_log
            .record(ActionKind::StreamRun, None, "整体分析完成");
        Ok(result)
    }

    // ==========================================
    // 编辑提交
    // ==========================================

    /// 字段编辑入口
    ///
    /// 归并器收集完整变更集并提交；成功后权威记录整体替换本地记录，
    /// 该构件的组合缓存失效（配筋变更会改变需求/能力比）。
    pub async fn apply_field_edit(
        &self,
        view: &dyn ViewStateBridge,
        key: &EntityKey,
        field: &str,
    ) -> SyncResult<Element> {
        let kind = self.kind_of(key)?;
        let record = self
            .reconciler
            .on_field_changed(view, key, kind, field)
            .await?;

        self.adopt_authoritative(record.clone());
        self.refresh_children(key).await;
        self.action_log.record(
            ActionKind::EditApplied,
            Some(key.clone()),
            format!("field={}", field),
        );
        Ok(record)
    }

    /// 服务端建议入口（与手工编辑同一条提交路径）
    pub async fn apply_proposal(
        &self,
        key: &EntityKey,
        proposal: &serde_json::Value,
    ) -> SyncResult<Element> {
        let kind = self.kind_of(key)?;
        let record = self.reconciler.apply_proposal(key, kind, proposal).await?;

        self.adopt_authoritative(record.clone());
        self.refresh_children(key).await;
        self.action_log
            .record(ActionKind::ProposalApplied, Some(key.clone()), "");
        Ok(record)
    }

    // ==========================================
    // 连梁分配提交
    // ==========================================

    /// 提交本地登记的槽位分配
    pub async fn commit_assignment(&self, key: &EntityKey) -> SyncResult<Element> {
        let record = self.registry.record(key);
        let updated = self
            .assignments
            .assign_coupling_beam(key, &record)
            .await
            .map_err(|e| SyncError::ApplyFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        self.adopt_authoritative(updated.clone());
        self.refresh_children(key).await;
        self.action_log.record(
            ActionKind::AssignmentCommitted,
            Some(key.clone()),
            format!("left={}, right={}", record.left, record.right),
        );
        Ok(updated)
    }

    /// 把指定侧槽位恢复为目录默认连梁
    pub async fn reset_slot(&self, key: &EntityKey, side: SlotSide) -> SyncResult<Element> {
        let updated = self
            .assignments
            .set_default_beam(key, side)
            .await
            .map_err(|e| SyncError::ApplyFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        // 服务端回传的是默认分配，非对称合并不会覆盖本地记录，这里显式回写
        self.registry.set_slot(key, side, SlotValue::Generic);
        self.adopt_authoritative(updated.clone());
        self.refresh_children(key).await;
        self.action_log.record(
            ActionKind::SlotReset,
            Some(key.clone()),
            format!("side={}", side),
        );
        Ok(updated)
    }

    /// 由当前视图值创建自定义连梁并指派到指定侧
    pub async fn create_custom_beam(
        &self,
        view: &dyn ViewStateBridge,
        key: &EntityKey,
        side: SlotSide,
    ) -> SyncResult<Element> {
        let changeset = self
            .reconciler
            .collect_changeset(view, key, ElementKind::CouplingBeam)?;
        let updated = self
            .assignments
            .create_custom_beam(key, side, &changeset)
            .await
            .map_err(|e| SyncError::ApplyFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        self.adopt_authoritative(updated.clone());
        self.refresh_children(key).await;
        self.action_log.record(
            ActionKind::AssignmentCommitted,
            Some(key.clone()),
            format!("自定义连梁: side={}", side),
        );
        Ok(updated)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 用服务端权威记录整体替换本地记录
    fn adopt_authoritative(&self, record: Element) {
        self.registry
            .sync_from_authoritative(std::slice::from_ref(&record));

        let key = record.key();
        let mut elements = self.lock_elements();
        if let Some(slot) = elements.iter_mut().find(|e| e.key() == key) {
            *slot = record;
        }
    }

    /// 失效该构件的组合缓存；若处于展开态则重新获取并填充子行
    async fn refresh_children(&self, key: &EntityKey) {
        self.cache.invalidate(key);
        if !self.expansion.is_expanded(key) {
            return;
        }

        self.lock_rows().set_placeholder(key);
        if let Err(e) = self.cache.fetch(key).await {
            tracing::warn!("重新获取组合内力失败: entity={}: {}", key, e);
        }
        self.fill_children_if_ready(key);
    }

    // ==========================================
    // 会话重置
    // ==========================================

    /// 清空全部会话级状态（数据集、行模型、缓存、展开集合、登记表）
    pub fn reset_session(&self) {
        self.lock_elements().clear();
        *self.lock_rows() = RowModel::new();
        self.cache.invalidate_all();
        self.expansion.collapse_all();
        self.registry.reset();
        self.action_log.clear();
        self.action_log.record(ActionKind::SessionReset, None, "");
        tracing::info!("会话状态已重置");
    }
}
