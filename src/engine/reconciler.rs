// ==========================================
// 剪力墙结构分析客户端 - 编辑归并器
// ==========================================
// 职责: 按构件类型 schema 收集字段级变更集并提交
// 约定: 变更集始终是完整快照（读取-合并），不是相对上次的 diff；
//       提交后即丢弃，不跨编辑保留
// ==========================================

use crate::domain::{Changeset, Element, ElementKind, EntityKey};
use crate::engine::backend::ChangesetApplier;
use crate::engine::error::{SyncError, SyncResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// 字段 schema
// ==========================================

/// 字段值的解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldParse {
    Integer,
    Float,
    Text,
}

/// 单个字段的 schema 条目
///
/// 按构件类型固定，不随实例变化。`source` 是视图状态中的定位符，
/// `default` 在视图值缺失或无法解析时兜底。
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub source: String,
    pub parse: FieldParse,
    pub default: Value,
}

impl FieldSpec {
    pub fn integer(name: &str, source: &str, default: i64) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            parse: FieldParse::Integer,
            default: Value::from(default),
        }
    }

    pub fn float(name: &str, source: &str, default: f64) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            parse: FieldParse::Float,
            default: Value::from(default),
        }
    }

    pub fn text(name: &str, source: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            parse: FieldParse::Text,
            default: Value::from(default),
        }
    }

    /// 按解析方式把视图原始值转成 JSON 值，失败回落默认值
    fn parse_raw(&self, raw: Option<String>) -> Value {
        let raw = match raw {
            Some(r) => r,
            None => return self.default.clone(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return self.default.clone();
        }

        match self.parse {
            FieldParse::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| self.default.clone()),
            FieldParse::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| self.default.clone()),
            FieldParse::Text => Value::from(trimmed),
        }
    }
}

/// 声明式的字段联动: 计数字段控制一组依赖字段的启用态
///
/// 固定声明表，不是通用规则引擎。联动在收集变更集之前执行。
#[derive(Debug, Clone)]
pub struct DependentToggle {
    /// 控制字段名（须在同类型 schema 中存在）
    pub controller: String,
    /// 控制字段值 ≥ 此阈值时依赖字段启用
    pub enable_when_min: f64,
    /// 受控字段的视图定位符
    pub targets: Vec<String>,
}

// ==========================================
// 视图状态桥接
// ==========================================

/// 视图状态桥接接口
///
/// 归并器通过它读取界面当前值、回写字段启用态，
/// 把"什么变了"与"界面怎么重绘"解耦。
pub trait ViewStateBridge: Send + Sync {
    /// 读取字段当前原始值；字段不存在返回 None
    fn read_field(&self, key: &EntityKey, source: &str) -> Option<String>;

    /// 设置字段的启用/禁用态
    fn set_field_enabled(&self, key: &EntityKey, source: &str, enabled: bool);
}

// ==========================================
// EditReconciler - 编辑归并器
// ==========================================

/// 编辑归并器
///
/// 手工编辑与服务端建议走同一条提交路径，归并之后不可区分。
pub struct EditReconciler {
    applier: Arc<dyn ChangesetApplier>,
    schemas: Mutex<HashMap<ElementKind, Vec<FieldSpec>>>,
    effects: Mutex<HashMap<(ElementKind, String), DependentToggle>>,
}

impl EditReconciler {
    pub fn new(applier: Arc<dyn ChangesetApplier>) -> Self {
        Self {
            applier,
            schemas: Mutex::new(HashMap::new()),
            effects: Mutex::new(HashMap::new()),
        }
    }

    /// 创建并注册内置 schema（墙肢 + 连梁）
    pub fn with_default_schemas(applier: Arc<dyn ChangesetApplier>) -> Self {
        let reconciler = Self::new(applier);

        // 墙肢配筋字段
        reconciler.register_schema(
            ElementKind::Pier,
            vec![
                FieldSpec::integer("n_meshes", "pier.n_meshes", 2),
                FieldSpec::integer("diameter_v", "pier.diameter_v", 8),
                FieldSpec::integer("spacing_v", "pier.spacing_v", 200),
                FieldSpec::integer("diameter_h", "pier.diameter_h", 8),
                FieldSpec::integer("spacing_h", "pier.spacing_h", 200),
                FieldSpec::integer("diameter_v2", "pier.diameter_v2", 0),
                FieldSpec::integer("spacing_v2", "pier.spacing_v2", 0),
                FieldSpec::integer("edge_diameter", "pier.edge_diameter", 12),
                FieldSpec::integer("n_edge_bars", "pier.n_edge_bars", 4),
            ],
        );
        // 第二层钢筋网字段只在网片数 ≥ 2 时可编辑
        reconciler.register_effect(
            ElementKind::Pier,
            DependentToggle {
                controller: "n_meshes".to_string(),
                enable_when_min: 2.0,
                targets: vec!["pier.diameter_v2".to_string(), "pier.spacing_v2".to_string()],
            },
        );

        // 连梁配筋字段
        reconciler.register_schema(
            ElementKind::CouplingBeam,
            vec![
                FieldSpec::integer("n_long", "beam.n_long", 3),
                FieldSpec::integer("diameter_long", "beam.diameter_long", 16),
                FieldSpec::integer("stirrup_diameter", "beam.stirrup_diameter", 8),
                FieldSpec::integer("stirrup_spacing", "beam.stirrup_spacing", 100),
                FieldSpec::integer("n_legs", "beam.n_legs", 2),
            ],
        );

        reconciler
    }

    /// 注册某构件类型的字段表（整体替换）
    pub fn register_schema(&self, kind: ElementKind, fields: Vec<FieldSpec>) {
        let mut schemas = self.schemas.lock().unwrap_or_else(|e| e.into_inner());
        schemas.insert(kind, fields);
    }

    /// 注册字段联动（按控制字段名登记）
    pub fn register_effect(&self, kind: ElementKind, effect: DependentToggle) {
        let mut effects = self.effects.lock().unwrap_or_else(|e| e.into_inner());
        effects.insert((kind, effect.controller.clone()), effect);
    }

    fn schema_of(&self, kind: ElementKind) -> SyncResult<Vec<FieldSpec>> {
        let schemas = self.schemas.lock().unwrap_or_else(|e| e.into_inner());
        schemas
            .get(&kind)
            .cloned()
            .ok_or_else(|| SyncError::SchemaMissing(kind.to_string()))
    }

    /// 收集完整变更集
    ///
    /// 逐字段从视图状态读当前值，缺失/无法解析的字段取默认值。
    /// 返回的始终是 schema 全字段的快照。
    pub fn collect_changeset(
        &self,
        view: &dyn ViewStateBridge,
        key: &EntityKey,
        kind: ElementKind,
    ) -> SyncResult<Changeset> {
        let schema = self.schema_of(kind)?;

        let mut changeset = Changeset::new();
        for spec in &schema {
            let raw = view.read_field(key, &spec.source);
            changeset.insert(spec.name.clone(), spec.parse_raw(raw));
        }
        Ok(changeset)
    }

    /// 字段变更入口
    ///
    /// 先执行该字段声明的本地联动，再收集完整变更集并无条件提交。
    ///
    /// # 返回
    /// - 服务端回传的权威构件记录
    pub async fn on_field_changed(
        &self,
        view: &dyn ViewStateBridge,
        key: &EntityKey,
        kind: ElementKind,
        field: &str,
    ) -> SyncResult<Element> {
        self.run_effect(view, key, kind, field)?;

        let changeset = self.collect_changeset(view, key, kind)?;
        self.apply(key, kind, &changeset).await
    }

    /// 服务端建议入口
    ///
    /// 把建议配置映射到同一变更集形状（同名字段取建议值，
    /// 其余取默认值），随后走与手工编辑完全相同的提交路径。
    pub async fn apply_proposal(
        &self,
        key: &EntityKey,
        kind: ElementKind,
        proposal: &Value,
    ) -> SyncResult<Element> {
        let schema = self.schema_of(kind)?;

        let mut changeset = Changeset::new();
        for spec in &schema {
            let value = proposal
                .get(&spec.name)
                .cloned()
                .unwrap_or_else(|| spec.default.clone());
            changeset.insert(spec.name.clone(), value);
        }
        self.apply(key, kind, &changeset).await
    }

    /// 执行字段联动（若该字段声明了联动）
    fn run_effect(
        &self,
        view: &dyn ViewStateBridge,
        key: &EntityKey,
        kind: ElementKind,
        field: &str,
    ) -> SyncResult<()> {
        let effect = {
            let effects = self.effects.lock().unwrap_or_else(|e| e.into_inner());
            effects.get(&(kind, field.to_string())).cloned()
        };
        let effect = match effect {
            Some(e) => e,
            None => return Ok(()),
        };

        let schema = self.schema_of(kind)?;
        let controller_spec = schema
            .iter()
            .find(|s| s.name == effect.controller)
            .ok_or_else(|| {
                SyncError::Internal(format!("联动控制字段不在 schema 中: {}", effect.controller))
            })?;

        let value = controller_spec
            .parse_raw(view.read_field(key, &controller_spec.source))
            .as_f64()
            .unwrap_or(0.0);
        let enabled = value >= effect.enable_when_min;

        for target in &effect.targets {
            view.set_field_enabled(key, target, enabled);
        }
        Ok(())
    }

    async fn apply(
        &self,
        key: &EntityKey,
        kind: ElementKind,
        changeset: &Changeset,
    ) -> SyncResult<Element> {
        self.applier
            .apply_changeset(key, kind, changeset)
            .await
            .map_err(|e| SyncError::ApplyFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}
