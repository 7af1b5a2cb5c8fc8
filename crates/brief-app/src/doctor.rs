use brief_cli::Cli;
use brief_orchestrator::AnalysisHistory;

use crate::startup_wiring::storage_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DoctorStatus {
    Pass,
    Warn,
    Fail,
}

impl DoctorStatus {
    fn as_str(self) -> &'static str {
        match self {
            DoctorStatus::Pass => "pass",
            DoctorStatus::Warn => "warn",
            DoctorStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DoctorCheckResult {
    pub key: &'static str,
    pub status: DoctorStatus,
    pub code: String,
    pub action: Option<String>,
}

pub(crate) fn collect_doctor_checks(cli: &Cli) -> Vec<DoctorCheckResult> {
    let mut checks = Vec::new();

    let key_present = cli
        .google_api_key
        .as_deref()
        .is_some_and(|value| !value.trim().is_empty());
    checks.push(DoctorCheckResult {
        key: "provider.google",
        status: if key_present {
            DoctorStatus::Pass
        } else {
            DoctorStatus::Fail
        },
        code: if key_present {
            format!("model={}", cli.model)
        } else {
            "missing_api_key".to_string()
        },
        action: (!key_present).then(|| "set GOOGLE_API_KEY".to_string()),
    });

    match storage_config(cli) {
        Ok(config) => checks.push(DoctorCheckResult {
            key: "storage.firebase",
            status: DoctorStatus::Pass,
            code: format!("bucket={}", config.bucket),
            action: None,
        }),
        Err(error) => checks.push(DoctorCheckResult {
            key: "storage.firebase",
            status: DoctorStatus::Fail,
            code: "not_configured".to_string(),
            action: Some(format!("set {}", error.missing_variables().join(", "))),
        }),
    }

    checks.push(match cli.vector_index_url.as_deref() {
        Some(endpoint) => DoctorCheckResult {
            key: "retrieval.index",
            status: DoctorStatus::Pass,
            code: format!("endpoint={endpoint} top_k={}", cli.top_k),
            action: None,
        },
        None => DoctorCheckResult {
            key: "retrieval.index",
            status: DoctorStatus::Warn,
            code: format!("fixture_cases top_k={}", cli.top_k),
            action: Some("set BRIEF_VECTOR_INDEX_URL to query a real index".to_string()),
        },
    });

    checks.push(match AnalysisHistory::load(&cli.history_path) {
        Ok(history) => DoctorCheckResult {
            key: "history",
            status: DoctorStatus::Pass,
            code: format!(
                "path={} analyses={}",
                cli.history_path.display(),
                history.analyses().len()
            ),
            action: None,
        },
        Err(error) => DoctorCheckResult {
            key: "history",
            status: DoctorStatus::Fail,
            code: format!("path={} error={error:#}", cli.history_path.display()),
            action: Some("repair or remove the history file".to_string()),
        },
    });

    checks
}

pub(crate) fn render_doctor_report(checks: &[DoctorCheckResult]) -> String {
    let count = |status: DoctorStatus| checks.iter().filter(|item| item.status == status).count();
    let mut lines = vec![format!(
        "doctor summary: checks={} pass={} warn={} fail={}",
        checks.len(),
        count(DoctorStatus::Pass),
        count(DoctorStatus::Warn),
        count(DoctorStatus::Fail)
    )];
    for check in checks {
        lines.push(format!(
            "doctor check: key={} status={} code={} action={}",
            check.key,
            check.status.as_str(),
            check.code,
            check.action.as_deref().unwrap_or("none")
        ));
    }
    lines.join("\n")
}
