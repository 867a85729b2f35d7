use hakata_core::config::{AppConfig, LoadOptions};
use hakata_core::domain::identity::Identity;
use hakata_core::domain::quote::QuoteRecord;
use hakata_core::storage::{StateStorage, QUOTES_KEY, SESSION_KEY};
use hakata_db::{connect_existing, DbPool, SqlStateStorage};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const STORE_CHECKS: [&str; 3] = ["database_connectivity", "quote_store_integrity", "session_state"];

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.extend(check_store(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in STORE_CHECKS {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    // An absent session is informational, so only failures count.
    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_store(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let mut checks = vec![DoctorCheck::fail(
                "database_connectivity",
                format!("failed to initialize async runtime: {error}"),
            )];
            for &name in &STORE_CHECKS[1..] {
                checks.push(DoctorCheck::skipped(name, "the async runtime did not start"));
            }
            return checks;
        }
    };

    runtime.block_on(async {
        let pool = match connect_existing(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                let mut checks = vec![DoctorCheck::fail(
                    "database_connectivity",
                    format!(
                        "failed to open database (run `hakata migrate` to create it): {error}"
                    ),
                )];
                for &name in &STORE_CHECKS[1..] {
                    checks.push(DoctorCheck::skipped(name, "the database is unreachable"));
                }
                return checks;
            }
        };

        let checks = vec![
            DoctorCheck::pass(
                "database_connectivity",
                format!("connected using `{}`", config.database.url),
            ),
            check_quote_store(&pool).await,
            check_session(&pool).await,
        ];
        pool.close().await;
        checks
    })
}

async fn check_quote_store(pool: &DbPool) -> DoctorCheck {
    let name = "quote_store_integrity";
    let storage = SqlStateStorage::new(pool.clone());
    match storage.load(QUOTES_KEY).await {
        Ok(None) => DoctorCheck::pass(name, "no quote requests stored yet"),
        Ok(Some(state)) => match serde_json::from_str::<Vec<QuoteRecord>>(&state.value) {
            Ok(records) => DoctorCheck::pass(
                name,
                format!("{} quote requests at revision {}", records.len(), state.revision),
            ),
            Err(error) => DoctorCheck::fail(
                name,
                format!("stored collection is unreadable and will be treated as empty: {error}"),
            ),
        },
        Err(error) if error.to_string().contains("no such table") => {
            DoctorCheck::fail(name, "schema is missing; run `hakata migrate`")
        }
        Err(error) => DoctorCheck::fail(name, error.to_string()),
    }
}

async fn check_session(pool: &DbPool) -> DoctorCheck {
    let name = "session_state";
    let storage = SqlStateStorage::new(pool.clone());
    match storage.load(SESSION_KEY).await {
        Ok(None) => DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: "nobody is signed in".to_string(),
        },
        Ok(Some(state)) => match serde_json::from_str::<Identity>(&state.value) {
            Ok(identity) => DoctorCheck::pass(name, format!("signed in as {}", identity.email)),
            Err(_) => DoctorCheck::fail(name, "stored session is unreadable; run `hakata logout`"),
        },
        Err(error) if error.to_string().contains("no such table") => {
            DoctorCheck::skipped(name, "the schema is missing")
        }
        Err(error) => DoctorCheck::fail(name, error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
