use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::args::Cli;
use cli::commands::{dispatch, exit_codes};

fn init_logging() {
    let filter = EnvFilter::try_from_env("RECIPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<recipe_core::RecipeError>() {
                Some(re) => eprintln!("error: {re}"),
                None => eprintln!("fatal: {e:?}"),
            }
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
