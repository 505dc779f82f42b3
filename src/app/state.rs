// ==========================================
// 剪力墙结构分析客户端 - 应用状态
// ==========================================
// 职责: 组装所有服务实例并管理应用级共享状态
// 说明: 显式构造一次、按引用传递；没有模块级单例，
//       测试可以用假后端替换任何一个窄接口
// ==========================================

use anyhow::Context;
use std::sync::Arc;

use crate::api::AnalysisClient;
use crate::config::ClientConfig;
use crate::engine::{
    CouplingAssignmentRegistry, EditReconciler, EntityCombinationCache, ExpansionStateMachine,
    SyncOrchestrator,
};
use crate::session::ActionLog;

/// 应用状态
///
/// 持有全部服务实例；各服务只通过窄接口相互引用。
pub struct AppState {
    /// 客户端配置
    pub config: ClientConfig,

    /// 分析服务客户端（实现引擎层全部窄接口）
    pub client: Arc<AnalysisClient>,

    /// 组合内力缓存
    pub cache: Arc<EntityCombinationCache>,

    /// 展开状态机
    pub expansion: Arc<ExpansionStateMachine>,

    /// 连梁分配登记表
    pub registry: Arc<CouplingAssignmentRegistry>,

    /// 编辑归并器
    pub reconciler: Arc<EditReconciler>,

    /// 同步编排器
    pub orchestrator: Arc<SyncOrchestrator>,

    /// 操作审计日志
    pub action_log: Arc<ActionLog>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 参数
    /// - config: 客户端配置
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 构建 HTTP 客户端
    /// 2. 初始化缓存、展开状态机、分配登记表、编辑归并器
    /// 3. 组装同步编排器
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        tracing::info!("初始化 AppState，服务地址: {}", config.base_url);

        let client = Arc::new(AnalysisClient::new(&config).context("无法构建分析服务客户端")?);

        // ==========================================
        // 初始化服务层
        // ==========================================

        // 组合内力缓存（只依赖获取接口）
        let cache = Arc::new(EntityCombinationCache::new(client.clone()));

        // 展开状态机（展开触发缓存获取）
        let expansion = Arc::new(ExpansionStateMachine::new(cache.clone()));

        // 连梁分配登记表
        let registry = Arc::new(CouplingAssignmentRegistry::new());

        // 编辑归并器（内置墙肢/连梁 schema）
        let reconciler = Arc::new(EditReconciler::with_default_schemas(client.clone()));

        // 操作审计日志
        let action_log = Arc::new(ActionLog::default());

        // ==========================================
        // 组装编排器
        // ==========================================

        let orchestrator = Arc::new(SyncOrchestrator::new(
            client.clone(),
            client.clone(),
            client.clone(),
            cache.clone(),
            expansion.clone(),
            registry.clone(),
            reconciler.clone(),
            action_log.clone(),
        ));

        tracing::info!("AppState 初始化完成");

        Ok(Self {
            config,
            client,
            cache,
            expansion,
            registry,
            reconciler,
            orchestrator,
            action_log,
        })
    }

    /// 重置会话级状态（缓存、展开集合、登记表、审计日志）
    ///
    /// 不清除服务端会话 ID；重新上传模型会自动替换会话。
    pub fn reset_session(&self) {
        self.orchestrator.reset_session();
    }
}
