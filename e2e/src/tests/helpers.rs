//! Common test helpers and JSON builders

use serde_json::{json, Value};

use crate::types::ProxyResponse;

/// Candidate models the generated proxy config lists
pub const MODEL_A: &str = "model-a";
pub const MODEL_B: &str = "model-b";
pub const RAW_MODEL: &str = "org/raw-model";

/// `(model, convention)` for every candidate, in fallback order
pub const CANDIDATES: &[(&str, &str)] = &[
    (MODEL_A, "chat_completions"),
    (MODEL_B, "chat_completions"),
    (RAW_MODEL, "raw_generation"),
];

// ─── Request builders ────────────────────────────────────────────────────────

/// Build a chat request with no parameters
pub fn chat_request(prompt: &str) -> Value {
    json!({ "prompt": prompt })
}

/// Build a chat request with explicit parameters
pub fn chat_request_with(prompt: &str, parameters: Value) -> Value {
    json!({ "prompt": prompt, "parameters": parameters })
}

// ─── Response builders ────────────────────────────────────────────────────────

/// Chat-completions upstream success
pub fn completion_response(content: &str) -> String {
    json!({
        "id": "chatcmpl-test001",
        "object": "chat.completion",
        "created": 1700000000,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15
        }
    })
    .to_string()
}

/// Raw-generation upstream success
pub fn raw_generation_response(text: &str) -> String {
    json!([{ "generated_text": text }]).to_string()
}

/// Model-loading body as the provider sends it with a 503
pub fn loading_response(estimated_time: f64) -> String {
    json!({
        "error": "Model org/model is currently loading",
        "estimated_time": estimated_time
    })
    .to_string()
}

// ─── Assertion helpers ────────────────────────────────────────────────────────

/// Assert two strings are equal, with context on failure
pub fn assert_eq_str(actual: &str, expected: &str, label: &str) -> anyhow::Result<()> {
    if actual != expected {
        Err(anyhow::anyhow!("{label}: expected {:?} but got {:?}", expected, actual))
    } else {
        Ok(())
    }
}

/// Assert condition is true, with message
pub fn assert_true(cond: bool, msg: &str) -> anyhow::Result<()> {
    if !cond {
        Err(anyhow::anyhow!("{}", msg))
    } else {
        Ok(())
    }
}

/// Assert the response status
pub fn assert_status(resp: &ProxyResponse, expected: u16) -> anyhow::Result<()> {
    assert_true(
        resp.status == expected,
        &format!("Expected {}, got {}: {}", expected, resp.status, resp.body),
    )
}

/// Assert the fixed CORS headers are present
pub fn assert_cors(resp: &ProxyResponse) -> anyhow::Result<()> {
    assert_eq_str(
        resp.header("access-control-allow-origin").unwrap_or_default(),
        "*",
        "Access-Control-Allow-Origin",
    )?;
    assert_eq_str(
        resp.header("access-control-allow-credentials").unwrap_or_default(),
        "true",
        "Access-Control-Allow-Credentials",
    )?;
    assert_eq_str(
        resp.header("access-control-allow-methods").unwrap_or_default(),
        "GET,OPTIONS,PATCH,DELETE,POST,PUT",
        "Access-Control-Allow-Methods",
    )?;
    assert_true(
        resp.header("access-control-allow-headers")
            .is_some_and(|h| h.contains("Content-Type")),
        "Access-Control-Allow-Headers should list Content-Type",
    )
}

/// Assert the body is `[{generated_text, model}]` with the given values
pub fn assert_normalized(resp: &ProxyResponse, text: &str, model: &str) -> anyhow::Result<()> {
    let generated = resp
        .get_str("0.generated_text")
        .ok_or_else(|| anyhow::anyhow!("Missing [0].generated_text in {}", resp.body))?;
    assert_eq_str(generated, text, "generated_text")?;
    let served_by = resp
        .get_str("0.model")
        .ok_or_else(|| anyhow::anyhow!("Missing [0].model in {}", resp.body))?;
    assert_eq_str(served_by, model, "model")
}
