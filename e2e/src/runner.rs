//! Scenario runner
//!
//! Runs scenarios one at a time against a clean mock upstream and reports,
//! next to PASS/FAIL, the route each request took through the candidate chain.

use colored::Colorize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crate::types::{ReceivedRequest, SharedUpstreamState, TestResult};
use crate::upstream;

pub type ScenarioFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A single scenario
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    pub run: Box<dyn Fn(TestContext) -> ScenarioFuture + Send + Sync>,
}

/// Handed to each scenario: where the proxy listens and the mock upstream's state
#[derive(Clone)]
pub struct TestContext {
    pub proxy_addr: String,
    pub upstream_state: SharedUpstreamState,
    pub http_client: reqwest::Client,
}

/// Outcome of a whole run
pub struct RunReport {
    pub results: Vec<TestResult>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    pub fn passed(&self) -> usize {
        self.results.len() - self.failed()
    }

    /// Upstream calls per model across every scenario
    pub fn calls_per_model(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for call in self.results.iter().flat_map(|r| &r.upstream_calls) {
            *counts.entry(call.model.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Render the candidate route, e.g. `model-a 500 -> model-b 200`
pub fn format_route(calls: &[ReceivedRequest]) -> String {
    if calls.is_empty() {
        return "no upstream calls".to_string();
    }
    calls
        .iter()
        .map(|call| format!("{} {}", call.model, call.status))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Run the scenarios whose name contains `filter` (all when `None`)
pub async fn run_tests(cases: Vec<TestCase>, ctx: TestContext, filter: Option<&str>) -> RunReport {
    let selected: Vec<&TestCase> = cases
        .iter()
        .filter(|case| filter.map_or(true, |f| case.name.contains(f)))
        .collect();

    println!("\n{}", "neuralchat-proxy end-to-end".bright_white().bold());
    println!("  proxy      {}", ctx.proxy_addr.bright_cyan());
    println!("  scenarios  {}\n", selected.len().to_string().bright_cyan());

    let mut results = Vec::with_capacity(selected.len());
    for case in selected {
        upstream::reset(&ctx.upstream_state);

        let start = Instant::now();
        let outcome = (case.run)(ctx.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let upstream_calls = upstream::received_requests(&ctx.upstream_state);

        let verdict = if outcome.is_ok() {
            "PASS".bright_green().bold()
        } else {
            "FAIL".bright_red().bold()
        };
        println!(
            "  {} {:<42} {:>5}ms  {}",
            verdict,
            case.name,
            duration_ms,
            format_route(&upstream_calls).dimmed()
        );
        if let Err(ref e) = outcome {
            for cause in e.chain() {
                println!("       {}", cause.to_string().yellow());
            }
        }

        results.push(TestResult {
            name: case.name.to_string(),
            passed: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
            duration_ms,
            upstream_calls,
        });
    }

    let report = RunReport { results };
    print_summary(&report);
    report
}

fn print_summary(report: &RunReport) {
    println!("\n{}", "Upstream calls".bright_white().bold());
    for (model, count) in report.calls_per_model() {
        println!("  {:<24} {}", model, count);
    }

    let failures: Vec<&TestResult> = report.results.iter().filter(|r| !r.passed).collect();
    if !failures.is_empty() {
        println!("\n{}", "Failures".bright_red().bold());
        for result in failures {
            println!(
                "  {}: {}",
                result.name,
                result.error.as_deref().unwrap_or_default()
            );
        }
    }

    let total_ms: u64 = report.results.iter().map(|r| r.duration_ms).sum();
    let summary = format!(
        "\n{} passed, {} failed in {}ms",
        report.passed(),
        report.failed(),
        total_ms
    );
    if report.failed() == 0 {
        println!("{}\n", summary.bright_green().bold());
    } else {
        println!("{}\n", summary.bright_red().bold());
    }
}

/// List scenarios grouped by their `group/` prefix
pub fn list_tests(cases: &[TestCase]) {
    let mut current_group = "";
    for case in cases {
        let group = case.name.split('/').next().unwrap_or_default();
        if group != current_group {
            println!("\n{}", group.bright_white().bold());
            current_group = group;
        }
        println!("  {} {}", format!("{:<40}", case.name).bright_cyan(), case.description);
    }
    println!();
}
