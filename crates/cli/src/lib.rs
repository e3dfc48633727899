pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "leavebot",
    about = "Leavebot operator CLI",
    long_about = "Classify sample messages, preview replies, inspect configuration, and check deployment readiness without talking to Slack.",
    after_help = "Examples:\n  leavebot classify \"wfh tomorrow\"\n  leavebot reply leave U12345\n  leavebot doctor --json\n  leavebot smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify a message and print the matched category and keyword")]
    Classify {
        #[arg(help = "Message text, as a user would type it in Slack")]
        text: String,
    },
    #[command(about = "Render the reply the bot would post for a category")]
    Reply {
        #[arg(help = "Intent category: leave, wfh or none")]
        category: String,
        #[arg(help = "Slack user id to mention, e.g. U12345")]
        user: String,
        #[arg(long, help = "Form link to use instead of the configured one")]
        form_link: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, bot token, request signing, and form link readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run built-in sample messages through classification and reply rendering")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Classify { text } => commands::classify::run(&text),
        Command::Reply { category, user, form_link } => {
            commands::reply::run(&category, &user, form_link)
        }
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
