use esign_gen::cli::run_cli;
use esign_gen::logging::{self, LogConfig};

fn main() -> anyhow::Result<()> {
    logging::init(&LogConfig::from_env())?;
    run_cli()
}
