use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match objmap_cli::parse_and_run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
