use crate::intent::IntentCategory;

/// Slack markup that renders as an @-mention of `user_id`.
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Renders the reply sent back to the requesting user.
pub fn render(category: IntentCategory, user_id: &str, form_link: &str) -> String {
    let greeting = format!("Hi {}! 👋\n\n", mention(user_id));

    let body = match category {
        IntentCategory::Leave => format!(
            "I see you're requesting a leave. Please fill out the form below:\n\
             📝 *Leave Request Form:* {form_link}\n\n\
             Make sure to fill in all the required details. Have a great day! 🌴"
        ),
        IntentCategory::Wfh => format!(
            "I see you're planning to work from home. Please fill out the form below:\n\
             🏠 *WFH Request Form:* {form_link}\n\n\
             Make sure to fill in all the required details. Happy remote working! 💻"
        ),
        IntentCategory::None => format!(
            "I'm here to help with leave and WFH requests!\n\
             Please fill out the form: {form_link}"
        ),
    };

    greeting + &body
}
