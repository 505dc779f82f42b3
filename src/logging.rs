// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 说明: 本库通常被宿主应用嵌入；宿主已注册全局订阅器时
//       这里静默让位，不会 panic
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

// 默认过滤器: 本库 info，压低 HTTP 栈的连接级噪音
const DEFAULT_FILTER: &str = "info,shearwall_client=info,hyper=warn,reqwest=warn";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 覆盖默认过滤器
///   例如: RUST_LOG=shearwall_client=trace
///
/// 宿主应用已注册全局订阅器时本调用不生效。
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registered = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    if registered.is_err() {
        tracing::debug!("全局日志订阅器已存在，跳过初始化");
    }
}

/// 初始化测试环境的日志系统
///
/// 只放开本库的 debug 级别，便于定位流解析与缓存行为
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("shearwall_client=debug"))
        .with_test_writer()
        .try_init();
}
