use leavebot_core::config::{AppConfig, ConfigError, LoadOptions, DEFAULT_FORM_LINK};
use serde::Serialize;

use crate::commands::{escape_json, CommandResult};

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

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(loaded: Result<AppConfig, ConfigError>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_bot_token(&config));
            checks.push(check_request_signing(&config));
            checks.push(check_form_link(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slack_bot_token", "request_signing", "form_link"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_bot_token(config: &AppConfig) -> DoctorCheck {
    if config.has_bot_token() {
        DoctorCheck {
            name: "slack_bot_token",
            status: CheckStatus::Pass,
            details: "bot token present with `xoxb-` prefix".to_string(),
        }
    } else {
        DoctorCheck {
            name: "slack_bot_token",
            status: CheckStatus::Fail,
            details: "no bot token; set LEAVEBOT_SLACK_BOT_TOKEN (or SLACK_BOT_TOKEN) so replies can be posted"
                .to_string(),
        }
    }
}

fn check_request_signing(config: &AppConfig) -> DoctorCheck {
    if config.slack.signing_secret.is_some() {
        DoctorCheck {
            name: "request_signing",
            status: CheckStatus::Pass,
            details: "inbound requests are verified with the signing secret".to_string(),
        }
    } else {
        DoctorCheck {
            name: "request_signing",
            status: CheckStatus::Skipped,
            details: "no signing secret configured; inbound requests are not verified".to_string(),
        }
    }
}

fn check_form_link(config: &AppConfig) -> DoctorCheck {
    if config.forms.link == DEFAULT_FORM_LINK {
        DoctorCheck {
            name: "form_link",
            status: CheckStatus::Fail,
            details: format!(
                "form link is still the placeholder `{DEFAULT_FORM_LINK}`; set LEAVEBOT_FORM_LINK"
            ),
        }
    } else {
        DoctorCheck {
            name: "form_link",
            status: CheckStatus::Pass,
            details: format!("replies link to `{}`", config.forms.link),
        }
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
