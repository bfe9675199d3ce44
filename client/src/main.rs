use {
    anyhow::Result,
    clap::Parser,
    partcrypt::{cli::Cli, config::Config, run, setup_logger},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    setup_logger(config.log_file.as_deref(), &config.log_filter)?;
    run(cli, config).await
}
