use std::process::ExitCode;

fn main() -> ExitCode {
    archquote_cli::run()
}
