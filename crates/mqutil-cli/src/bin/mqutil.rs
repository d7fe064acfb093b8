//! mqutil binary

use std::process::ExitCode;

use clap::Parser;
use mqutil::session::export_emulator_host;
use mqutil::{GcloudConnector, telemetry};
use mqutil_cli::{Cli, Output, commands, resolve};

fn main() -> ExitCode {
    telemetry::init();
    let cli = Cli::parse();

    let invocation = match resolve(cli) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // SAFETY: no runtime or other thread has been started yet.
    unsafe { export_emulator_host(&invocation.session) };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::run(invocation, &GcloudConnector, &Output::stdout())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
