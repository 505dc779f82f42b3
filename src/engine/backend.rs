// ==========================================
// 剪力墙结构分析客户端 - 引擎层后端接口
// ==========================================
// 职责: 定义引擎依赖的窄接口，实现依赖倒置
// 说明: 引擎层定义 trait，API 层实现；每个服务只拿到它需要的那一小块
// 优势: 引擎不依赖 HTTP 客户端，测试可以替换假实现
// ==========================================

use crate::api::ApiResult;
use crate::domain::{
    AssignmentRecord, Changeset, Combination, Element, ElementKind, EntityKey, SlotSide,
};
use crate::stream::ProgressEvent;
use async_trait::async_trait;

/// 组合内力获取接口（组合缓存的唯一网络依赖）
#[async_trait]
pub trait CombinationFetcher: Send + Sync {
    /// 获取单个构件的全量组合内力表
    ///
    /// 成功返回的列表整体替换缓存条目；失败不写缓存、不重试。
    async fn fetch_combinations(&self, key: &EntityKey) -> ApiResult<Vec<Combination>>;
}

/// 构件数据集来源（编排器刷新周期的输入）
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// 获取当前会话的全量构件表
    async fn fetch_elements(&self) -> ApiResult<Vec<Element>>;
}

/// 变更集应用接口（编辑归并器的出口）
#[async_trait]
pub trait ChangesetApplier: Send + Sync {
    /// 把一份完整变更集提交给服务端
    ///
    /// # 返回
    /// - 服务端回传的权威构件记录（调用方用它整体替换本地记录）
    async fn apply_changeset(
        &self,
        key: &EntityKey,
        kind: ElementKind,
        changeset: &Changeset,
    ) -> ApiResult<Element>;
}

/// 流式操作后端接口（编排器驱动上传/整体分析时使用）
///
/// 每个逻辑操作同一时刻只有一条流；进度逐条回调，
/// 终结结果即返回值。
#[async_trait]
pub trait StreamingBackend: Send + Sync {
    /// 上传结构模型（流式进度）
    async fn upload_model(
        &self,
        payload: &serde_json::Value,
        on_progress: &mut (dyn for<'a> FnMut(&'a ProgressEvent) + Send),
    ) -> ApiResult<serde_json::Value>;

    /// 运行整体分析（流式进度）
    async fn run_analysis(
        &self,
        on_progress: &mut (dyn for<'a> FnMut(&'a ProgressEvent) + Send),
    ) -> ApiResult<serde_json::Value>;
}

/// 连梁分配后端接口（编排器提交分配时使用）
#[async_trait]
pub trait AssignmentBackend: Send + Sync {
    /// 提交一个构件的左右槽位分配
    async fn assign_coupling_beam(
        &self,
        key: &EntityKey,
        record: &AssignmentRecord,
    ) -> ApiResult<Element>;

    /// 把指定侧槽位恢复为目录默认连梁
    async fn set_default_beam(&self, key: &EntityKey, side: SlotSide) -> ApiResult<Element>;

    /// 由变更集创建自定义连梁并指派到指定侧
    async fn create_custom_beam(
        &self,
        key: &EntityKey,
        side: SlotSide,
        changeset: &Changeset,
    ) -> ApiResult<Element>;
}
