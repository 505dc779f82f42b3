// ==========================================
// 流客户端集成测试
// ==========================================
// 测试范围:
// 1. 分块不敏感性: 任意切分方式产出相同事件序列
// 2. 终结事件恰好派发一次
// 3. 缺失终结事件时合成错误
// ==========================================

use shearwall_client::stream::{StreamClient, StreamError, StreamResult};

async fn run_chunks(chunks: Vec<Vec<u8>>) -> (Vec<u64>, StreamResult<serde_json::Value>) {
    let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
    let mut progress = Vec::new();
    let result = StreamClient::default()
        .run(stream, |p| progress.push(p.current))
        .await;
    (progress, result)
}

const CANONICAL: &str = "data: {\"type\":\"progress\",\"current\":1,\"total\":5}\n\
                         data: {\"type\":\"progress\",\"current\":2,\"total\":5}\n\
                         data: {\"type\":\"complete\",\"result\":{\"ok\":true}}\n";

// ==========================================
// 分块不敏感性
// ==========================================

#[tokio::test]
async fn test_boundary_insensitivity_every_split_point() {
    // 基准: 整块喂入
    let (expected_progress, expected_result) = run_chunks(vec![CANONICAL.as_bytes().to_vec()]).await;
    assert_eq!(expected_progress, vec![1, 2]);
    let expected_value = expected_result.expect("整块喂入应该成功");

    // 同一字节序列在每个位置切成两块，事件序列必须一致
    let raw = CANONICAL.as_bytes();
    for split in 1..raw.len() {
        let chunks = vec![raw[..split].to_vec(), raw[split..].to_vec()];
        let (progress, result) = run_chunks(chunks).await;

        assert_eq!(progress, expected_progress, "split={} 时进度序列不一致", split);
        assert_eq!(
            result.expect("切分后应该同样成功"),
            expected_value,
            "split={} 时结果不一致",
            split
        );
    }
}

#[tokio::test]
async fn test_spec_scenario_prefix_split() {
    // 场景 1: "…\nda" + "ta: …\n"
    let (progress, result) = run_chunks(vec![
        b"data: {\"type\":\"progress\",\"current\":1,\"total\":5}\nda".to_vec(),
        b"ta: {\"type\":\"complete\",\"result\":{\"ok\":true}}\n".to_vec(),
    ])
    .await;

    assert_eq!(progress, vec![1]);
    assert_eq!(result.unwrap()["ok"], true);
}

#[tokio::test]
async fn test_three_way_split_inside_json() {
    let raw = CANONICAL.as_bytes();
    let (a, b) = (17, 63);
    let (progress, result) = run_chunks(vec![
        raw[..a].to_vec(),
        raw[a..b].to_vec(),
        raw[b..].to_vec(),
    ])
    .await;

    assert_eq!(progress, vec![1, 2]);
    assert!(result.is_ok());
}

// ==========================================
// 终结语义
// ==========================================

#[tokio::test]
async fn test_no_terminal_event_synthesizes_error() {
    // 场景 2: 流结束（done）但从未出现 complete/error
    let (progress, result) = run_chunks(vec![
        b"data: {\"type\":\"progress\",\"current\":1,\"total\":5}\n".to_vec(),
        b"data: {\"type\":\"progress\",\"current\":2,\"total\":5}\n".to_vec(),
    ])
    .await;

    assert_eq!(progress, vec![1, 2]);
    let err = result.unwrap_err();
    assert!(matches!(err, StreamError::ClosedWithoutComplete));
    assert_eq!(err.to_string(), "stream closed without complete event");
}

#[tokio::test]
async fn test_empty_stream_synthesizes_error() {
    let (progress, result) = run_chunks(vec![]).await;
    assert!(progress.is_empty());
    assert!(matches!(result, Err(StreamError::ClosedWithoutComplete)));
}

#[tokio::test]
async fn test_exactly_once_terminal_with_late_chunks() {
    // 终结事件之后还有字节到达: 不再有任何回调
    let (progress, result) = run_chunks(vec![
        b"data: {\"type\":\"complete\",\"result\":{\"n\":1}}\ndata: {\"type\":\"progress\",".to_vec(),
        b"\"current\":7,\"total\":7}\n".to_vec(),
        b"data: {\"type\":\"error\",\"message\":\"late\"}\n".to_vec(),
    ])
    .await;

    assert!(progress.is_empty());
    assert_eq!(result.unwrap()["n"], 1);
}

#[tokio::test]
async fn test_error_event_terminates_with_message() {
    let (progress, result) = run_chunks(vec![
        b"data: {\"type\":\"progress\",\"current\":1,\"total\":3}\n".to_vec(),
        b"data: {\"type\":\"error\",\"message\":\"section mesh failed\"}\n".to_vec(),
    ])
    .await;

    assert_eq!(progress, vec![1]);
    match result.unwrap_err() {
        StreamError::Server(message) => assert_eq!(message, "section mesh failed"),
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_terminal_in_unterminated_tail() {
    // 终结帧没有换行符就断流: finish 冲洗后仍按终结处理
    let (_, result) = run_chunks(vec![
        b"data: {\"type\":\"complete\",\"result\":{\"tail\":true}}".to_vec(),
    ])
    .await;

    assert_eq!(result.unwrap()["tail"], true);
}

// ==========================================
// 容错
// ==========================================

#[tokio::test]
async fn test_malformed_lines_do_not_kill_stream() {
    let (progress, result) = run_chunks(vec![
        b"data: oops not json\n".to_vec(),
        b"data: {\"type\":\"progress\",\"current\":1,\"total\":1}\n".to_vec(),
        b"garbage line without prefix\n".to_vec(),
        b"data: {\"type\":\"complete\",\"result\":{}}\n".to_vec(),
    ])
    .await;

    assert_eq!(progress, vec![1]);
    assert!(result.is_ok());
}
