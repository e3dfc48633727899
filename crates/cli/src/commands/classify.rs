use leavebot_core::intent::{matched_keyword, IntentCategory};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ClassifyOutcome<'a> {
    command: &'static str,
    status: &'static str,
    category: IntentCategory,
    matched_keyword: Option<&'static str>,
    actionable: bool,
    text: &'a str,
}

pub fn run(text: &str) -> CommandResult {
    let matched = matched_keyword(text);
    let category = matched.map(|(category, _)| category).unwrap_or(IntentCategory::None);

    CommandResult::report(
        "classify",
        0,
        &ClassifyOutcome {
            command: "classify",
            status: "ok",
            category,
            matched_keyword: matched.map(|(_, keyword)| keyword),
            actionable: category.is_actionable(),
            text,
        },
    )
}
