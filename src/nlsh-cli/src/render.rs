//! Terminal and JSON rendering of query results.

use std::fmt::Write as _;

use nlsh_guardrail::RiskAssessment;
use nlsh_engine::{ExecutionDecision, HistoryRecord, ModelDefinition, QueryResponse};
use serde::Serialize;

/// Pretty JSON for `--json` output.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Risk details: level, action, reasons and the enrichment hints.
pub fn assessment(assessment: &RiskAssessment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Risk: {} ({})", assessment.level, assessment.action);
    for reason in &assessment.reasons {
        let _ = writeln!(out, "  - {reason}");
    }
    if !assessment.protected_paths.is_empty() {
        let _ = writeln!(
            out,
            "Protected paths: {}",
            assessment.protected_paths.join(", ")
        );
    }
    if !assessment.preview_entries.is_empty() {
        let _ = writeln!(out, "Would affect:");
        for entry in &assessment.preview_entries {
            let _ = writeln!(out, "  {entry}");
        }
    }
    if let Some(suggestion) = &assessment.dry_run_suggestion {
        let _ = writeln!(out, "Try first: {suggestion}");
    }
    for hint in &assessment.undo_hints {
        let _ = writeln!(out, "Undo: {hint}");
    }
    out
}

/// One line explaining why a command did not run, if it did not.
pub fn decision_note(decision: ExecutionDecision) -> Option<&'static str> {
    match decision {
        ExecutionDecision::Executed | ExecutionDecision::Undecided => None,
        ExecutionDecision::PreviewRequested => Some("Preview only, not executed."),
        ExecutionDecision::PreviewOnly => {
            Some("Not executed: this command may only be previewed.")
        }
        ExecutionDecision::Blocked => Some("Blocked: this command will not be executed."),
        ExecutionDecision::NotRequested => Some("Not executed. Re-run with --yes to execute."),
        ExecutionDecision::Declined => Some("Cancelled."),
        ExecutionDecision::ConfirmationUnavailable => {
            Some("Not executed: confirmation required but no terminal is available.")
        }
    }
}

/// Human-readable summary of a query. Command output is not included; it
/// goes to stdout and stderr unchanged.
pub fn response(response: &QueryResponse) -> String {
    let mut out = String::new();
    if response.command.is_empty() {
        return out;
    }
    let _ = writeln!(out, "  {}", response.command);
    if !response.reasoning.is_empty() {
        let _ = writeln!(out, "{}", response.reasoning);
    }
    let source = if response.from_cache {
        format!("{} (cached)", response.model_used)
    } else {
        response.model_used.clone()
    };
    if !source.is_empty() {
        let _ = writeln!(out, "Model: {source}");
    }
    if !response.assessment.level.is_safe() || !response.assessment.reasons.is_empty() {
        out.push_str(&assessment(&response.assessment));
    }
    if let Some(note) = decision_note(response.decision) {
        let _ = writeln!(out, "{note}");
    }
    if let Some(execution) = &response.execution
        && execution.timed_out
    {
        let _ = writeln!(out, "Command timed out.");
    }
    out
}

/// History records, oldest first, one line each.
pub fn history(records: &[HistoryRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let status = match (record.executed, record.exit_code) {
            (false, _) => record.action.as_str().to_string(),
            (true, Some(code)) => format!("exit {code}"),
            (true, None) => "killed".to_string(),
        };
        let _ = writeln!(
            out,
            "{}  {:<8}  {:<16}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.risk_level.as_str(),
            status,
            record.command
        );
    }
    out
}

/// Model listing with the candidate order marked.
pub fn models(models: &[ModelDefinition], candidates: &[ModelDefinition]) -> String {
    let mut out = String::new();
    for model in models {
        let rank = candidates
            .iter()
            .position(|c| c.name == model.name)
            .map(|i| format!("{}", i + 1))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{rank:>2}  {:<16}  {}",
            model.name,
            if model.endpoint.is_empty() {
                "(no endpoint)"
            } else {
                model.endpoint.as_str()
            }
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nlsh_guardrail::{GuardrailAction, RiskLevel};
    use pretty_assertions::assert_eq;

    fn risky() -> RiskAssessment {
        RiskAssessment {
            level: RiskLevel::High,
            action: GuardrailAction::Confirm,
            reasons: vec!["Recursive delete".to_string()],
            protected_paths: vec!["/etc".to_string()],
            dry_run_suggestion: Some("ls -R /etc/app".to_string()),
            undo_hints: vec!["Restore from backup".to_string()],
            ..RiskAssessment::default()
        }
    }

    #[test]
    fn test_assessment_lists_everything() {
        let text = assessment(&risky());
        assert_eq!(
            text,
            "Risk: high (confirm)\n  - Recursive delete\nProtected paths: /etc\n\
             Try first: ls -R /etc/app\nUndo: Restore from backup\n"
        );
    }

    #[test]
    fn test_safe_response_is_short() {
        let response = QueryResponse {
            command: "ls -la".to_string(),
            model_used: "gpt".to_string(),
            decision: ExecutionDecision::NotRequested,
            ..QueryResponse::default()
        };
        assert_eq!(
            self::response(&response),
            "  ls -la\nModel: gpt\nNot executed. Re-run with --yes to execute.\n"
        );
    }

    #[test]
    fn test_blocked_response_shows_reasons() {
        let response = QueryResponse {
            command: "rm -rf /tmp/x".to_string(),
            model_used: "gpt".to_string(),
            from_cache: true,
            assessment: risky(),
            decision: ExecutionDecision::Blocked,
            ..QueryResponse::default()
        };
        let text = self::response(&response);
        assert!(text.contains("Model: gpt (cached)"));
        assert!(text.contains("  - Recursive delete"));
        assert!(text.ends_with("Blocked: this command will not be executed.\n"));
    }

    #[test]
    fn test_empty_response_renders_nothing() {
        assert_eq!(self::response(&QueryResponse::default()), "");
    }

    #[test]
    fn test_executed_has_no_note() {
        assert_eq!(decision_note(ExecutionDecision::Executed), None);
        assert!(decision_note(ExecutionDecision::ConfirmationUnavailable).is_some());
    }

    #[test]
    fn test_history_lines() {
        let record = HistoryRecord {
            id: uuid::Uuid::nil(),
            timestamp: chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            prompt: "list".to_string(),
            command: "ls".to_string(),
            model: "gpt".to_string(),
            risk_level: RiskLevel::Safe,
            action: GuardrailAction::Allow,
            executed: true,
            success: Some(true),
            exit_code: Some(0),
            duration_ms: Some(3),
            from_cache: false,
        };
        let blocked = HistoryRecord {
            command: "rm -rf /".to_string(),
            risk_level: RiskLevel::Critical,
            action: GuardrailAction::Block,
            executed: false,
            exit_code: None,
            ..record.clone()
        };

        let text = history(&[record, blocked]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2026-03-01 09:30:00  safe"));
        assert!(lines[0].contains("exit 0"));
        assert!(lines[1].contains("block"));
        assert!(lines[1].ends_with("rm -rf /"));
    }

    #[test]
    fn test_models_marks_candidate_order() {
        let model = |name: &str| ModelDefinition {
            name: name.to_string(),
            endpoint: format!("http://{name}/v1"),
            ..ModelDefinition::default()
        };
        let all = vec![model("a"), model("b"), model("c")];
        let candidates = vec![model("c"), model("a")];

        let text = models(&all, &candidates);
        let ranks: Vec<&str> = text
            .lines()
            .map(|line| line.split_whitespace().next().unwrap_or(""))
            .collect();
        assert_eq!(ranks, vec!["2", "-", "1"]);
    }

    #[test]
    fn test_json_output() {
        let json = to_json(&risky()).unwrap();
        assert!(json.contains("\"level\": \"high\""));
        assert!(json.contains("\"action\": \"confirm\""));
    }
}
