// ==========================================
// 剪力墙结构分析客户端 - 流解码器
// ==========================================
// 职责: 把任意切分的字节块还原为离散流事件
// 不变式 1: 同一字节序列按任意方式分块，产出的事件序列相同
// 不变式 2: 终结事件之后不再产出任何事件（即使继续喂入字节）
// ==========================================

use crate::stream::event::StreamEvent;
use crate::STREAM_FRAME_PREFIX;

/// 增量流解码器
///
/// 维护一个字节缓冲区：每次 `feed` 追加字节并切出所有完整行，
/// 最后一个未换行的片段保留到下一次。换行符在 UTF-8 中是单字节，
/// 按字节切分不会破坏跨块的多字节字符。
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buf: Vec<u8>,
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已经产出终结事件
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 喂入一个数据块，返回其中包含的完整事件
    ///
    /// 终结事件（complete / error）之后的所有内容被丢弃，
    /// 保证终结事件恰好派发一次。
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(event) = self.parse_line(&line[..line.len() - 1]) {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    self.finished = true;
                    self.buf.clear();
                    break;
                }
            }
        }
        events
    }

    /// 流结束时冲洗缓冲区
    ///
    /// 末尾可能残留一个没有换行符的片段，按最后一行处理。
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let tail = std::mem::take(&mut self.buf);
        self.parse_line(&tail).into_iter().collect()
    }

    /// 解析单行
    ///
    /// - 空行或不带协议前缀的行: 忽略
    /// - 前缀后 JSON 解析失败: 记日志并跳过该行，流继续
    fn parse_line(&self, line: &[u8]) -> Option<StreamEvent> {
        let text = match std::str::from_utf8(line) {
            Ok(t) => t.trim_end_matches('\r'),
            Err(e) => {
                tracing::warn!("跳过非 UTF-8 流数据行: {}", e);
                return None;
            }
        };

        let payload = text.strip_prefix(STREAM_FRAME_PREFIX)?;
        if payload.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("跳过无法解析的流数据行: {} (line={})", e, text);
                None
            }
        }
    }
}
