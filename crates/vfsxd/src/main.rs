use std::process::ExitCode;

fn main() -> ExitCode {
    match vfsxd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet when launch fails.
            eprintln!("vfsxd: {error}");
            ExitCode::FAILURE
        }
    }
}
