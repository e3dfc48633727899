use std::process::ExitCode;

fn main() -> ExitCode {
    leavebot_cli::run()
}
