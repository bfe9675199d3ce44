pub mod cli;
pub mod config;
mod download;
mod info;
mod upload;
mod worker;

#[cfg(test)]
mod test_node;

use {
    crate::{
        cli::{Cli, Command},
        config::Config,
        download::download,
        info::plan,
        upload::upload_part,
        worker::worker,
    },
    anyhow::{Context as _, Result},
    partcrypt_protocol::{BlockLayout, EncryptionKey, layout::BLOCK_SIZE},
    partcrypt_sdk::{Client, ExecutionUnit, WorkerPool},
    std::{
        io::{self, Write},
        path::Path,
        sync::Mutex,
    },
    tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Debug)]
pub struct Ctx {
    pub config: Config,
    pub layout: BlockLayout,
    pub unit: ExecutionUnit,
    pub pool: WorkerPool,
}

impl Ctx {
    pub fn new(config: Config) -> Result<Self> {
        let layout = BlockLayout::new(BLOCK_SIZE, config.blocks_per_part)
            .context("invalid `blocks_per_part` in config")?;
        let unit = ExecutionUnit::new(Client::new(config.request_timeout)?, layout);
        Ok(Self {
            pool: WorkerPool::new(unit.clone(), config.workers),
            unit,
            layout,
            config,
        })
    }

    pub fn encryption_key(&self) -> Result<EncryptionKey> {
        self.config
            .encryption_key
            .clone()
            .context("missing `encryption_key` in config")
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Ctx::new(config)?;
    handle_command(cli.command, &ctx).await
}

async fn handle_command(command: Command, ctx: &Ctx) -> Result<()> {
    match command {
        Command::Download { url, size, output } => download(ctx, &url, size, &output).await?,
        Command::UploadPart(args) => upload_part(ctx, args).await?,
        Command::Plan { size } => plan(ctx.layout, size)?,
        Command::Worker => worker(ctx).await?,
        Command::GenerateKey => generate_key(),
    }
    Ok(())
}

#[expect(clippy::print_stdout, reason = "command output")]
fn generate_key() {
    println!("{}", EncryptionKey::generate().display_unmasked());
}

/// Installs the global subscriber. Logs go to `log_file` if set, and to stderr
/// otherwise; stdout is reserved for command output.
pub fn setup_logger(log_file: Option<&Path>, log_filter: &str) -> Result<()> {
    let writer: Box<dyn Write + Send> = match log_file {
        Some(path) => Box::new(
            fs_err::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        ),
        None => Box::new(io::stderr()),
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(log_file.is_none())
        .with_writer(Mutex::new(writer));
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(EnvFilter::try_new(log_filter)?)
        .try_init()?;
    Ok(())
}
