//! Proxy config the runner hands to the spawned proxy
//!
//! Every candidate points at the mock upstream, so the upstream port chosen on
//! the command line is the only place it needs to be set.

use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

use crate::tests::helpers::CANDIDATES;

/// Environment variable the proxy reads its bearer token from
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

/// Token the spawned proxy reads from its environment; tests check it is forwarded
pub const E2E_TOKEN: &str = "e2e-token";

/// Config listing every test candidate against the mock upstream
pub fn proxy_config(upstream_port: u16, proxy_port: u16) -> Value {
    let candidates: Vec<Value> = CANDIDATES
        .iter()
        .map(|(model, convention)| json!({"model": model, "convention": convention}))
        .collect();

    json!({
        "server": {"host": "127.0.0.1", "port": proxy_port},
        "upstream": {
            "api_key_env": TOKEN_ENV,
            "timeout_seconds": 5,
            "chat_completions_url": format!("http://127.0.0.1:{upstream_port}/v1/chat/completions"),
            "raw_generation_url": format!("http://127.0.0.1:{upstream_port}/models"),
            "candidates": candidates
        },
        "generation": {"max_new_tokens": 512, "temperature": 0.7, "top_p": 0.9}
    })
}

/// Write the config to a temporary `.yaml` file (JSON is valid YAML).
/// The file is removed when the handle drops.
pub fn write_proxy_config(upstream_port: u16, proxy_port: u16) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("neuralchat-e2e-")
        .suffix(".yaml")
        .tempfile()?;
    let rendered = serde_json::to_string_pretty(&proxy_config(upstream_port, proxy_port))?;
    file.write_all(rendered.as_bytes())?;
    file.flush()?;
    Ok(file)
}
