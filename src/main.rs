use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::Parser;

use dox_agent::RunOptions;
use dox_agent::config::Config;
use dox_agent::pidfile::PidFile;

/// Publishes the resource usage of running Docker containers to InfluxDB.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Monitor only the first listed container.
    #[arg(long)]
    debug: bool,
    /// Path of the JSON configuration file.
    #[arg(long, env = "DOX_CONFIG", default_value = "config.json")]
    config: PathBuf,
    /// Write the process id to this file while running.
    #[arg(long)]
    pid_file: Option<PathBuf>,
    /// Append log records to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logger(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger(args.log_file.as_ref())?;

    let config = Config::from_file(&args.config).inspect_err(|err| log::error!("{err}"))?;
    let _pid_file = args.pid_file.as_ref().map(PidFile::create).transpose()?;

    dox_agent::run(config, RunOptions { debug: args.debug }).await?;
    log::info!("shutdown complete");
    Ok(())
}
