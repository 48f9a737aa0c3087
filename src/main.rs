use clap::Parser;
use kinmap::cli::Cli;
use kinmap::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> kinmap::error::Result<()> {
    let mut config = Config::load(&cli.config)?;
    if let Some(mode) = cli.mode {
        config.classification.mode = mode.into();
    }
    if let Some(output) = cli.output {
        config.render.output = output;
    }

    let summary = Pipeline::new(config)?.run()?;
    if cli.summary {
        println!("{}", summary);
    }
    Ok(())
}
