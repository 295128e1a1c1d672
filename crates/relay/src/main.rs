use std::process::ExitCode;

use clap::Parser;
use relay::cli::Cli;
use relay::config::RelayConfig;
use relay::{logging, Reported};
use relay_chat::{ChatOutput, StdoutOutput};

fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    logging::init();

    let cli = Cli::parse();
    let result = RelayConfig::from_env().and_then(|config| relay::run(cli.command, &config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if error.downcast_ref::<Reported>().is_none() {
                let output = StdoutOutput::new();
                output.write_line(&output.style().red(&format!("{error:#}")));
            }
            ExitCode::FAILURE
        }
    }
}
