// Code evaluation pipeline
//
// Drives per-test execution against the sandbox collaborator,
// normalizes and compares outputs, and aggregates pass/fail and
// performance metrics. Test cases run sequentially; a failure to
// reach the sandbox for one case downgrades that case to a failed
// result and never aborts the batch.

use serde::{Deserialize, Serialize};

use crate::challenge::TestCase;
use crate::session::Language;
use crate::traits::SandboxRunner;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Outcome of running the submission against one test case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub test_number: u32,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<i64>,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub stderr: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub compile_output: String,
}

/// Aggregated outcome of running submitted code against all test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub total_tests: u32,
    pub passed: u32,
    pub failed: u32,
    pub results: Vec<TestCaseResult>,
    pub all_passed: bool,
    /// Average over the cases that reported a time, not the total count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_execution_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_memory_kb: Option<f64>,
}

impl ExecutionReport {
    fn from_results(results: Vec<TestCaseResult>) -> Self {
        let total_tests = results.len() as u32;
        let passed = results.iter().filter(|r| r.passed).count() as u32;
        let times: Vec<f64> = results.iter().filter_map(|r| r.execution_time_ms).collect();
        let memories: Vec<i64> = results.iter().filter_map(|r| r.memory_kb).collect();

        Self {
            total_tests,
            passed,
            failed: total_tests - passed,
            all_passed: total_tests > 0 && passed == total_tests,
            avg_execution_time_ms: average(&times),
            avg_memory_kb: average(&memories.iter().map(|m| *m as f64).collect::<Vec<_>>()),
            results,
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Run `code` against every test case and aggregate the results.
///
/// Precondition: `test_cases` is non-empty. The stage machine skips
/// evaluation entirely when a challenge carries no test cases instead
/// of calling this with an empty slice.
pub async fn evaluate(
    sandbox: &dyn SandboxRunner,
    code: &str,
    language: Language,
    test_cases: &[TestCase],
) -> ExecutionReport {
    debug_assert!(!test_cases.is_empty(), "caller must skip empty batches");

    let mut results = Vec::with_capacity(test_cases.len());
    for (index, case) in test_cases.iter().enumerate() {
        let test_number = index as u32 + 1;
        let result = match sandbox.submit(code, language, &case.input).await {
            Ok(verdict) => {
                let actual = verdict.stdout.trim().to_string();
                let passed = verdict.is_accepted() && outputs_match(&actual, &case.expected);
                TestCaseResult {
                    test_number,
                    input: case.input.clone(),
                    expected: case.expected.trim().to_string(),
                    actual,
                    passed,
                    execution_time_ms: verdict.time_secs.map(|t| t * 1000.0),
                    memory_kb: verdict.memory_kb,
                    status: verdict.status_description,
                    stderr: verdict.stderr,
                    compile_output: verdict.compile_output,
                }
            }
            // One unreachable case never aborts the batch
            Err(e) => {
                tracing::warn!(test_number, error = %e, "sandbox call failed for test case");
                TestCaseResult {
                    test_number,
                    input: case.input.clone(),
                    expected: case.expected.trim().to_string(),
                    actual: String::new(),
                    passed: false,
                    execution_time_ms: None,
                    memory_kb: None,
                    status: format!("Error: {}", e),
                    stderr: String::new(),
                    compile_output: String::new(),
                }
            }
        };
        tracing::debug!(
            test_number,
            passed = result.passed,
            status = %result.status,
            "test case evaluated"
        );
        results.push(result);
    }

    let report = ExecutionReport::from_results(results);
    tracing::info!(
        passed = report.passed,
        total = report.total_tests,
        "code evaluation complete"
    );
    report
}

/// Whitespace-trimmed comparison with a structural JSON fallback.
///
/// Exact trimmed equality wins. When the texts differ, both sides are
/// tentatively parsed as JSON and compared structurally; if either
/// side fails to parse, the exact-text verdict stands.
fn outputs_match(actual: &str, expected: &str) -> bool {
    let actual = actual.trim();
    let expected = expected.trim();
    if actual == expected {
        return true;
    }

    match (
        serde_json::from_str::<serde_json::Value>(actual),
        serde_json::from_str::<serde_json::Value>(expected),
    ) {
        (Ok(a), Ok(e)) => a == e,
        _ => false,
    }
}
