use std::time::Duration;

/// 所有外部接口共用的 HTTP 客户端，每次请求受同一超时约束
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tracktint/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// 读取失败响应的正文，截断后用于错误信息
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    body.chars().take(200).collect()
}
