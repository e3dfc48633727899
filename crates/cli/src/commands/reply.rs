use leavebot_core::{
    config::{AppConfig, ConfigOverrides, LoadOptions},
    intent::IntentCategory,
    responder,
};

use crate::commands::CommandResult;

/// Renders the reply the bot would post. `form_link` overrides the configured link.
pub fn run(category: &str, user_id: &str, form_link: Option<String>) -> CommandResult {
    let category = match category.parse::<IntentCategory>() {
        Ok(category) => category,
        Err(error) => {
            return CommandResult::failure("reply", "invalid_category", error.to_string(), 2);
        }
    };

    let user_id = user_id.trim().trim_start_matches('@');
    if user_id.is_empty() {
        return CommandResult::failure("reply", "invalid_user", "user id must not be empty", 2);
    }

    let options = LoadOptions {
        overrides: ConfigOverrides { form_link, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "reply",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    CommandResult::success("reply", responder::render(category, user_id, &config.forms.link))
}
