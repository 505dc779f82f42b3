// ==========================================
// 剪力墙结构分析客户端 - 分析服务客户端
// ==========================================
// 职责: 远程分析服务的所有端点调用（请求/响应 + 流式）
// 约定: 非 2xx 一律以 "HTTP {status}: {body}" 拒绝
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ClientConfig;
use crate::domain::{
    AssignmentRecord, Changeset, Combination, Element, ElementKind, EntityKey, SlotSide,
};
use crate::engine::backend::{
    AssignmentBackend, ChangesetApplier, CombinationFetcher, ElementSource, StreamingBackend,
};
use crate::stream::{ProgressEvent, StreamClient};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

// ==========================================
// 响应信封
// ==========================================

#[derive(Debug, Deserialize)]
struct CombinationsResponse {
    success: bool,
    #[serde(default)]
    combinations: Vec<Combination>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElementsResponse {
    success: bool,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElementResponse {
    success: bool,
    #[serde(default)]
    result: Option<Element>,
    #[serde(default)]
    message: Option<String>,
}

fn rejection(message: Option<String>) -> ApiError {
    ApiError::ServerRejected(message.unwrap_or_else(|| "未给出原因".to_string()))
}

// ==========================================
// AnalysisClient - 分析服务客户端
// ==========================================

/// 远程分析服务客户端
///
/// 同时实现引擎层定义的各窄接口（依赖倒置：引擎只依赖 trait，
/// 测试中以假实现替换）。
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    stream: StreamClient,
    /// 当前会话 ID；上传模型成功后由服务端分配
    session: RwLock<Option<String>>,
}

impl AnalysisClient {
    /// 根据配置构建客户端
    ///
    /// 连接超时全局生效；总超时只加在请求/响应调用上，
    /// 流式响应的时限由流层的空闲超时负责。
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            stream: StreamClient::new(config.stream_idle_timeout()),
            session: RwLock::new(config.session_id.clone()),
        })
    }

    /// 设置当前会话 ID
    pub fn set_session(&self, session_id: impl Into<String>) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(session_id.into());
    }

    /// 读取当前会话 ID
    pub fn session(&self) -> ApiResult<String> {
        let guard = self.session.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or(ApiError::SessionNotInitialized)
    }

    // ==========================================
    // 通用请求辅助
    // ==========================================

    /// 通用 JSON POST
    ///
    /// # 返回
    /// - 非 2xx: `ApiError::Http`（状态 + 响应体原文）
    /// - 2xx 但解析失败: `ApiError::Decode`
    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let text = response.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Decode {
            context: path.to_string(),
            message: e.to_string(),
        })
    }

    /// 通用流式 POST: 发起请求并驱动进度流直至终结
    async fn post_stream<B, F>(
        &self,
        path: &str,
        body: &B,
        on_progress: F,
    ) -> ApiResult<serde_json::Value>
    where
        B: Serialize + ?Sized,
        F: FnMut(&ProgressEvent),
    {
        let op_id = Uuid::new_v4();
        let url = format!("{}{}", self.base_url, path);
        tracing::info!("启动流式操作: op_id={}, path={}", op_id, path);

        // 流式请求不设总超时，由流层的空闲超时兜底
        let response = self.http.post(&url).json(body).send().await?;
        let result = self.stream.run_response(response, on_progress).await?;

        tracing::info!("流式操作完成: op_id={}", op_id);
        Ok(result)
    }

    fn element_from(&self, response: ElementResponse, context: &str) -> ApiResult<Element> {
        if !response.success {
            return Err(rejection(response.message));
        }
        response.result.ok_or_else(|| ApiError::Decode {
            context: context.to_string(),
            message: "success=true 但缺少 result 字段".to_string(),
        })
    }

    // ==========================================
    // 流式端点
    // ==========================================

    /// 上传结构模型（流式进度）
    ///
    /// 成功后自动采用服务端分配的会话 ID（result.session_id）。
    pub async fn upload_model<F>(
        &self,
        payload: &serde_json::Value,
        on_progress: F,
    ) -> ApiResult<serde_json::Value>
    where
        F: FnMut(&ProgressEvent),
    {
        let result = self.post_stream("/upload-stream", payload, on_progress).await?;

        if let Some(session_id) = result.get("session_id").and_then(|v| v.as_str()) {
            tracing::info!("采用服务端会话: session_id={}", session_id);
            self.set_session(session_id);
        }
        Ok(result)
    }

    /// 运行整体分析（流式进度）
    pub async fn run_analysis<F>(&self, on_progress: F) -> ApiResult<serde_json::Value>
    where
        F: FnMut(&ProgressEvent),
    {
        let session_id = self.session()?;
        let body = json!({ "session_id": session_id });
        self.post_stream("/analyze-stream", &body, on_progress).await
    }

    // ==========================================
    // 请求/响应端点
    // ==========================================

    /// 单组合详细分析（PM 曲线等，结果结构由服务端决定）
    pub async fn analyze_combination(
        &self,
        key: &EntityKey,
        combination: &str,
    ) -> ApiResult<serde_json::Value> {
        let session_id = self.session()?;
        let body = json!({
            "session_id": session_id,
            "pier_key": key.as_str(),
            "combination": combination,
        });
        let result: serde_json::Value = self.post_json("/analyze-combination", &body).await?;

        if result.get("success").and_then(|v| v.as_bool()) == Some(false) {
            let message = result
                .get("message")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            return Err(rejection(message));
        }
        Ok(result)
    }

    /// 更新连梁配筋
    pub async fn update_beam_reinforcement(
        &self,
        key: &EntityKey,
        changeset: &Changeset,
    ) -> ApiResult<Element> {
        let session_id = self.session()?;
        let body = json!({
            "session_id": session_id,
            "pier_key": key.as_str(),
            "fields": changeset,
        });
        let response: ElementResponse = self.post_json("/update-beam-reinforcement", &body).await?;
        self.element_from(response, "/update-beam-reinforcement")
    }

    /// 更新墙肢配筋
    pub async fn update_pier_reinforcement(
        &self,
        key: &EntityKey,
        changeset: &Changeset,
    ) -> ApiResult<Element> {
        let session_id = self.session()?;
        let body = json!({
            "session_id": session_id,
            "pier_key": key.as_str(),
            "fields": changeset,
        });
        let response: ElementResponse = self.post_json("/update-pier-reinforcement", &body).await?;
        self.element_from(response, "/update-pier-reinforcement")
    }
}

// ==========================================
// 引擎层窄接口实现
// ==========================================

#[async_trait]
impl CombinationFetcher for AnalysisClient {
    async fn fetch_combinations(&self, key: &EntityKey) -> ApiResult<Vec<Combination>> {
        let session_id = self.session()?;
        let path = format!("/pier-combinations/{}/{}", session_id, key.as_str());
        let response: CombinationsResponse = self.post_json(&path, &json!({})).await?;

        if !response.success {
            return Err(rejection(response.message));
        }
        Ok(response.combinations)
    }
}

#[async_trait]
impl ElementSource for AnalysisClient {
    async fn fetch_elements(&self) -> ApiResult<Vec<Element>> {
        let session_id = self.session()?;
        let path = format!("/piers/{}", session_id);
        let response: ElementsResponse = self.post_json(&path, &json!({})).await?;

        if !response.success {
            return Err(rejection(response.message));
        }
        Ok(response.elements)
    }
}

#[async_trait]
impl ChangesetApplier for AnalysisClient {
    async fn apply_changeset(
        &self,
        key: &EntityKey,
        kind: ElementKind,
        changeset: &Changeset,
    ) -> ApiResult<Element> {
        match kind {
            ElementKind::Pier => self.update_pier_reinforcement(key, changeset).await,
            ElementKind::CouplingBeam => self.update_beam_reinforcement(key, changeset).await,
            ElementKind::Column => Err(ApiError::Unsupported(format!(
                "构件类型 {} 不支持字段编辑",
                kind
            ))),
        }
    }
}

#[async_trait]
impl StreamingBackend for AnalysisClient {
    async fn upload_model(
        &self,
        payload: &serde_json::Value,
        on_progress: &mut (dyn for<'a> FnMut(&'a ProgressEvent) + Send),
    ) -> ApiResult<serde_json::Value> {
        AnalysisClient::upload_model(self, payload, &mut *on_progress).await
    }

    async fn run_analysis(
        &self,
        on_progress: &mut (dyn for<'a> FnMut(&'a ProgressEvent) + Send),
    ) -> ApiResult<serde_json::Value> {
        AnalysisClient::run_analysis(self, &mut *on_progress).await
    }
}

#[async_trait]
impl AssignmentBackend for AnalysisClient {
    async fn assign_coupling_beam(
        &self,
        key: &EntityKey,
        record: &AssignmentRecord,
    ) -> ApiResult<Element> {
        let session_id = self.session()?;
        let body = json!({
            "session_id": session_id,
            "pier_key": key.as_str(),
            "beam_left": record.left.as_wire(),
            "beam_right": record.right.as_wire(),
        });
        let response: ElementResponse = self.post_json("/assign-coupling-beam", &body).await?;
        self.element_from(response, "/assign-coupling-beam")
    }

    async fn set_default_beam(&self, key: &EntityKey, side: SlotSide) -> ApiResult<Element> {
        let session_id = self.session()?;
        let body = json!({
            "session_id": session_id,
            "pier_key": key.as_str(),
            "side": side.as_str(),
        });
        let response: ElementResponse = self.post_json("/set-default-beam", &body).await?;
        self.element_from(response, "/set-default-beam")
    }

    async fn create_custom_beam(
        &self,
        key: &EntityKey,
        side: SlotSide,
        changeset: &Changeset,
    ) -> ApiResult<Element> {
        let session_id = self.session()?;
        let body = json!({
            "session_id": session_id,
            "pier_key": key.as_str(),
            "side": side.as_str(),
            "fields": changeset,
        });
        let response: ElementResponse = self.post_json("/create-custom-beam", &body).await?;
        self.element_from(response, "/create-custom-beam")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let config = ClientConfig::default();
        let client = AnalysisClient::new(&config).expect("无法构建客户端");

        // 未初始化会话: 拒绝
        assert!(matches!(
            client.session(),
            Err(ApiError::SessionNotInitialized)
        ));

        client.set_session("sess-001");
        assert_eq!(client.session().unwrap(), "sess-001");
    }

    #[test]
    fn test_session_from_config() {
        let config = ClientConfig {
            session_id: Some("resume-42".to_string()),
            ..ClientConfig::default()
        };
        let client = AnalysisClient::new(&config).expect("无法构建客户端");
        assert_eq!(client.session().unwrap(), "resume-42");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig {
            base_url: "http://10.1.1.1:8000/".to_string(),
            ..ClientConfig::default()
        };
        let client = AnalysisClient::new(&config).expect("无法构建客户端");
        assert_eq!(client.base_url, "http://10.1.1.1:8000");
    }
}
