// ==========================================
// 剪力墙结构分析客户端 - 流客户端
// ==========================================
// 职责: 驱动一条流式响应直至终结，进度回调逐条派发
// 说明: 终结结果即返回值，恰好一次；返回后底层流被丢弃释放连接
// ==========================================

use crate::stream::decoder::StreamDecoder;
use crate::stream::error::{StreamError, StreamResult};
use crate::stream::event::{ProgressEvent, StreamEvent};
use futures::{Stream, StreamExt};
use std::time::Duration;

/// 流客户端
///
/// 每个逻辑操作（上传、分析）同一时刻只驱动一条流。
/// 空闲超时为可选策略: `None` 表示服务端停止发送也不会超时。
#[derive(Debug, Clone, Default)]
pub struct StreamClient {
    idle_timeout: Option<Duration>,
}

impl StreamClient {
    /// 创建流客户端
    ///
    /// # 参数
    /// - idle_timeout: 相邻两个数据块之间允许的最大间隔
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self { idle_timeout }
    }

    /// 驱动一条字节块流直至终结
    ///
    /// # 返回
    /// - `Ok(result)`: 收到 complete 事件
    /// - `Err(StreamError::Server)`: 收到 error 事件
    /// - `Err(StreamError::ClosedWithoutComplete)`: 流结束但没有终结事件
    /// - 其余变体: 传输失败 / 空闲超时
    pub async fn run<S, C, E, F>(
        &self,
        mut stream: S,
        mut on_progress: F,
    ) -> StreamResult<serde_json::Value>
    where
        S: Stream<Item = Result<C, E>> + Unpin,
        C: AsRef<[u8]>,
        E: std::fmt::Display,
        F: FnMut(&ProgressEvent),
    {
        let mut decoder = StreamDecoder::new();

        loop {
            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                    Ok(item) => item,
                    Err(_) => return Err(StreamError::IdleTimeout(limit.as_secs())),
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = decoder.feed(chunk.as_ref());
                    if let Some(outcome) = Self::dispatch(events, &mut on_progress) {
                        // 终结后立即停止读取；未消费的字节随流一起丢弃
                        return outcome;
                    }
                }
                Some(Err(e)) => return Err(StreamError::Transport(e.to_string())),
                None => {
                    // 流结束: 冲洗末尾片段，仍无终结事件则合成错误
                    let events = decoder.finish();
                    if let Some(outcome) = Self::dispatch(events, &mut on_progress) {
                        return outcome;
                    }
                    return Err(StreamError::ClosedWithoutComplete);
                }
            }
        }
    }

    /// 驱动一条 HTTP 流式响应
    ///
    /// 初始状态非 2xx 时直接短路报错，不把响应体当作流读取。
    pub async fn run_response<F>(
        &self,
        response: reqwest::Response,
        on_progress: F,
    ) -> StreamResult<serde_json::Value>
    where
        F: FnMut(&ProgressEvent),
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Http {
                status: status.as_u16(),
                body,
            });
        }

        self.run(Box::pin(response.bytes_stream()), on_progress).await
    }

    /// 按序派发一批事件，遇到终结事件立刻收束为最终结果
    fn dispatch<F>(
        events: Vec<StreamEvent>,
        on_progress: &mut F,
    ) -> Option<StreamResult<serde_json::Value>>
    where
        F: FnMut(&ProgressEvent),
    {
        for event in events {
            match event {
                StreamEvent::Progress(progress) => on_progress(&progress),
                StreamEvent::Complete { result } => return Some(Ok(result)),
                StreamEvent::Error { message } => return Some(Err(StreamError::Server(message))),
            }
        }
        None
    }
}
