//! Live store self-test.
//!
//! Runs list → insert → update → delete against the configured store with a
//! throwaway record and reports each step. The first storage error stops
//! the run; the throwaway record is removed again on success.

use crate::model::troll::{now_epoch_ms, Troll, TrollInput};
use crate::repo::troll_repo::TrollRepository;
use crate::service::troll_service::{TrollService, TrollServiceError};
use log::{error, info};
use serde::Serialize;

const SAMPLE_SIZE: usize = 3;

/// Outcome of one step or of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Success,
    Failed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub result: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Troll>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    /// Unix epoch milliseconds when the run started.
    pub timestamp: i64,
    pub backend: &'static str,
    pub status: CheckStatus,
    pub tests: Vec<DiagnosticCheck>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosticsReport {
    pub fn is_healthy(&self) -> bool {
        self.status == CheckStatus::Success
    }
}

/// Exercises every write path of `service` and reports per-step results.
///
/// Never panics; storage errors are captured in the report.
pub fn run_diagnostics<R: TrollRepository>(service: &TrollService<R>) -> DiagnosticsReport {
    let mut report = DiagnosticsReport {
        timestamp: now_epoch_ms(),
        backend: service.backend_name(),
        status: CheckStatus::Success,
        tests: Vec::new(),
        summary: String::new(),
        error: None,
    };

    match run_checks(service, &mut report.tests) {
        Ok(()) => {
            if report
                .tests
                .iter()
                .any(|check| check.status != CheckStatus::Success)
            {
                report.status = CheckStatus::Failed;
                report.summary = "Some store checks failed.".to_string();
            } else {
                report.summary = format!("All store checks passed on `{}`.", report.backend);
            }
        }
        Err(err) => {
            error!(
                "event=diagnostics module=service status=error backend={} error={}",
                report.backend, err
            );
            report.status = CheckStatus::Error;
            report.summary = format!("Store `{}` returned an error.", report.backend);
            report.error = Some(err.to_string());
        }
    }

    info!(
        "event=diagnostics module=service status={:?} backend={} checks={}",
        report.status,
        report.backend,
        report.tests.len()
    );
    report
}

fn run_checks<R: TrollRepository>(
    service: &TrollService<R>,
    checks: &mut Vec<DiagnosticCheck>,
) -> Result<(), TrollServiceError> {
    let all = service.list()?;
    checks.push(DiagnosticCheck {
        name: "GET_ALL_TROLLS",
        status: CheckStatus::Success,
        result: format!("{} trolls found", all.len()),
        data: all.into_iter().take(SAMPLE_SIZE).collect(),
    });

    let sample = TrollInput {
        nick: Some(format!("test_user_{}", now_epoch_ms())),
        steam_id: Some("test_steam_id".to_string()),
        steam_id64: Some("76561198000000000".to_string()),
        reason: Some("Diagnostics check".to_string()),
        faceit_url: Some("https://faceit.com/test".to_string()),
    };
    let inserted = service.add(&sample)?;
    checks.push(DiagnosticCheck {
        name: "INSERT_TROLL",
        status: CheckStatus::Success,
        result: format!("inserted troll {}", inserted.id),
        data: vec![inserted.clone()],
    });

    let updated_input = TrollInput {
        reason: Some(format!("Diagnostics check updated {}", now_epoch_ms())),
        ..sample
    };
    let updated = service.update(inserted.id, &updated_input)?;
    let update_ok = updated.reason != inserted.reason && updated.last_modified > inserted.date_added;
    checks.push(DiagnosticCheck {
        name: "UPDATE_TROLL",
        status: if update_ok {
            CheckStatus::Success
        } else {
            CheckStatus::Failed
        },
        result: format!("updated troll {}", updated.id),
        data: vec![updated],
    });

    let delete_check = match service.delete(inserted.id) {
        Ok(()) => DiagnosticCheck {
            name: "DELETE_TROLL",
            status: CheckStatus::Success,
            result: format!("deleted troll {}", inserted.id),
            data: Vec::new(),
        },
        Err(TrollServiceError::NotFound(id)) => DiagnosticCheck {
            name: "DELETE_TROLL",
            status: CheckStatus::Failed,
            result: format!("troll {id} vanished before delete"),
            data: Vec::new(),
        },
        Err(other) => return Err(other),
    };
    checks.push(delete_check);

    Ok(())
}
