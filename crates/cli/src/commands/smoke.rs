use std::time::Instant;

use leavebot_core::{
    config::{AppConfig, LoadOptions},
    intent::{
        classify,
        IntentCategory::{self, Leave, None as Unmatched, Wfh},
    },
    responder::{mention, render},
};
use serde::Serialize;

use crate::commands::{escape_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

struct SampleGroup {
    name: &'static str,
    samples: Vec<(String, IntentCategory)>,
}

impl SampleGroup {
    fn new(name: &'static str, samples: &[(&str, IntentCategory)]) -> Self {
        let samples =
            samples.iter().map(|(text, expected)| (text.to_string(), *expected)).collect();
        Self { name, samples }
    }
}

fn sample_groups() -> Vec<SampleGroup> {
    let mut boundary = SampleGroup::new(
        "classify_boundary",
        &[
            ("leave\n\n\nvacation", Leave),
            ("leave\t\ttomorrow", Leave),
            ("leave!!!!!!!!!!!!!!!!!!!!", Leave),
        ],
    );
    boundary.samples.push((format!("{} leave tomorrow", "a".repeat(1000)), Leave));
    boundary.samples.push((format!("leave{}tomorrow", " ".repeat(50)), Leave));

    vec![
        SampleGroup::new(
            "classify_leave",
            &[
                ("I'm taking leave tomorrow", Leave),
                ("I'll be on vacation next week", Leave),
                ("Taking a sick day", Leave),
                ("I need a day off", Leave),
                ("I won't be in office tomorrow", Leave),
                ("Need to take emergency leave", Leave),
                ("Taking PTO next Friday", Leave),
                ("I'll be absent on Monday", Leave),
                ("Medical leave required", Leave),
                ("Holiday request for next week", Leave),
                ("Taking time off for personal reasons", Leave),
                ("I'm taking off tomorrow", Leave),
                ("LEAVE", Leave),
                ("I need leave.", Leave),
                ("leave, vacation, or time off", Leave),
            ],
        ),
        SampleGroup::new(
            "classify_wfh",
            &[
                ("Working from home today", Wfh),
                ("WFH tomorrow", Wfh),
                ("Remote work today", Wfh),
                ("Home office today", Wfh),
                ("Can I work from home on Friday?", Wfh),
                ("Working remotely next week", Wfh),
                ("Wfh", Wfh),
                ("work from home!", Wfh),
                ("remote, wfh, or home office", Wfh),
                ("WFH", Wfh),
                ("I'll be working from home", Wfh),
            ],
        ),
        SampleGroup::new(
            "classify_negative",
            &[
                ("Hello bot", Unmatched),
                ("How are you?", Unmatched),
                ("Meeting at 3pm", Unmatched),
                ("Let's discuss the project", Unmatched),
                ("Thanks for your help", Unmatched),
                ("", Unmatched),
                ("   ", Unmatched),
                ("We need to work on this", Unmatched),
                ("Home is where the heart is", Unmatched),
            ],
        ),
        boundary,
        SampleGroup::new(
            "classify_mixed",
            &[
                ("Taking leave and working from home", Wfh),
                ("WFH tomorrow, but also taking leave", Wfh),
            ],
        ),
        // Substring matching: these are expected to trigger.
        SampleGroup::new(
            "classify_substring_matches",
            &[
                ("I'm leaving the office at 5pm", Leave),
                ("The remote server is down", Wfh),
                ("coffee break?", Leave),
            ],
        ),
    ]
}

/// Runs the built-in message samples through classification and reply
/// rendering using the configured form link.
pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.extend(sample_groups().iter().map(|group| skipped(group.name)));
            checks.push(skipped("reply_rendering"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    checks.extend(sample_groups().iter().map(check_group));
    checks.push(check_replies(&config.forms.link));

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

fn check_group(group: &SampleGroup) -> SmokeCheck {
    let started = Instant::now();
    let mismatches: Vec<String> = group
        .samples
        .iter()
        .filter_map(|(text, expected)| {
            let actual = classify(text);
            (actual != *expected).then(|| format!("{text:?}: expected {expected}, got {actual}"))
        })
        .collect();

    let total = group.samples.len();
    let message = if mismatches.is_empty() {
        format!("{total}/{total} samples matched")
    } else {
        format!(
            "{}/{total} samples matched; {}",
            total - mismatches.len(),
            mismatches.join("; ")
        )
    };

    SmokeCheck {
        name: group.name,
        status: if mismatches.is_empty() { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: started.elapsed().as_millis() as u64,
        message,
    }
}

fn check_replies(form_link: &str) -> SmokeCheck {
    let started = Instant::now();
    let user_id = "USMOKE01";
    let problems: Vec<String> = [Leave, Wfh, Unmatched]
        .into_iter()
        .filter_map(|category| {
            let reply = render(category, user_id, form_link);
            let mut missing = Vec::new();
            if !reply.contains(&mention(user_id)) {
                missing.push("user mention");
            }
            if !reply.contains(form_link) {
                missing.push("form link");
            }
            (!missing.is_empty()).then(|| format!("{category} reply lacks {}", missing.join(" and ")))
        })
        .collect();

    SmokeCheck {
        name: "reply_rendering",
        status: if problems.is_empty() { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: started.elapsed().as_millis() as u64,
        message: if problems.is_empty() {
            format!("replies mention the user and link to `{form_link}`")
        } else {
            problems.join("; ")
        },
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            escape_json(&error.to_string())
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
