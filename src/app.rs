use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::interfaces::cli::{self, Command, USAGE};

pub fn run() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}\n\n{}", err, USAGE);
            return ExitCode::FAILURE;
        }
    };

    match actix_web::rt::System::new().block_on(cli::execute(command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
