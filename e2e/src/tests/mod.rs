//! Test registry - all test cases are registered here

pub mod helpers;

use crate::runner::TestCase;

/// Build and return all test cases
///
/// Tests are grouped by category. Each test:
/// 1. Queues mock upstream responses per candidate model
/// 2. Sends a request to the REAL proxy
/// 3. Validates the response and the calls the upstream received
pub fn all_tests() -> Vec<TestCase> {
    macro_rules! test {
        ($name:expr, $desc:expr, $func:path) => {
            TestCase {
                name: $name,
                description: $desc,
                run: Box::new(|ctx| Box::pin($func(ctx))),
            }
        };
    }

    vec![
        // ── Basic behavior ────────────────────────────────────────────────────
        test!(
            "basic/simple_chat",
            "First candidate answers; body is [{generated_text, model}]",
            basic::test_simple_chat
        ),
        test!(
            "basic/forwarded_chat_body",
            "Chat-completions body carries the prompt and resolved parameters",
            basic::test_forwarded_chat_body
        ),
        test!(
            "basic/bearer_token",
            "Upstream calls carry the token from the proxy environment",
            basic::test_bearer_token_forwarded
        ),
        test!(
            "basic/preflight",
            "OPTIONS returns an empty 200 with CORS headers",
            basic::test_preflight
        ),
        test!(
            "basic/method_not_allowed",
            "GET/PUT/DELETE on /api/chat return 405",
            basic::test_method_not_allowed
        ),
        test!(
            "basic/missing_prompt",
            "Missing or invalid prompt returns 400 without upstream calls",
            basic::test_missing_prompt
        ),
        test!("basic/health", "/health returns OK", basic::test_health),

        // ── Fallback chain ──────────────────────────────────────────────────────
        test!(
            "fallback/second_candidate",
            "Server error on the first candidate falls back to the second",
            fallback::test_falls_back_to_second
        ),
        test!(
            "fallback/client_errors",
            "4xx responses are soft failures",
            fallback::test_client_error_falls_through
        ),
        test!(
            "fallback/loading_stops_scan",
            "503 loading body is passed through and ends the scan",
            fallback::test_loading_stops_scan
        ),
        test!(
            "fallback/unparseable_loading",
            "503 with a non-JSON body falls through to the next candidate",
            fallback::test_unparseable_loading_falls_through
        ),
        test!(
            "fallback/all_fail",
            "Exhausted chain returns 500 with only the last failure",
            fallback::test_all_fail_reports_last
        ),
        test!(
            "fallback/malformed_success",
            "Malformed JSON on 200 counts as a transport failure",
            fallback::test_malformed_success_is_failure
        ),
        test!(
            "fallback/raw_generation",
            "Raw-generation candidate gets {inputs, parameters} at /models/<id>",
            fallback::test_raw_generation_request_shape
        ),
    ]
}
