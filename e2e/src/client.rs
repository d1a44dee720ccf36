//! HTTP client that simulates how the chat front-end talks to the proxy

use reqwest::{Client, Method};

use crate::types::ProxyResponse;

/// Build an HTTP client
pub fn build_client() -> Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to build reqwest client")
}

/// POST a JSON body to /api/chat
pub async fn send_chat(client: &Client, proxy_addr: &str, request_body: serde_json::Value) -> anyhow::Result<ProxyResponse> {
    send(client, Method::POST, proxy_addr, "/api/chat", Some(request_body.to_string())).await
}

/// Send any method to any path, with an optional raw body
pub async fn send(
    client: &Client,
    method: Method,
    proxy_addr: &str,
    path: &str,
    body: Option<String>,
) -> anyhow::Result<ProxyResponse> {
    let url = format!("http://{proxy_addr}{path}");

    let mut request = client.request(method.clone(), &url);
    if let Some(body) = body {
        request = request.header("Content-Type", "application/json").body(body);
    }

    let resp = request
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send {} {}: {}", method, url, e))?;

    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let body_text = resp
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read proxy response: {}", e))?;

    Ok(ProxyResponse {
        status,
        headers,
        body: parse_body(&body_text),
    })
}

/// Empty → `Null`, JSON → parsed, anything else → `String`
fn parse_body(text: &str) -> serde_json::Value {
    if text.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}
