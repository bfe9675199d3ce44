use {
    anyhow::{Result, format_err},
    clap::{Args, Parser, Subcommand},
    partcrypt_protocol::Iv,
    std::path::PathBuf,
    url::Url,
};

#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Cli {
    /// Path to the config file. Defaults to `partcrypt.json5` in the user config directory.
    #[clap(long)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Download a stored file part by part and write the decrypted content.
    Download {
        url: Url,
        /// Size of the stored (encrypted) file in bytes.
        #[arg(long)]
        size: u64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Encrypt one part of a local file and post it to a storage node.
    UploadPart(UploadPartArgs),
    /// Show how a file of the given plaintext size is laid out in blocks and parts.
    Plan {
        #[arg(long)]
        size: u64,
    },
    /// Serve line-delimited JSON part requests on stdin, one response per line on stdout.
    Worker,
    /// Print a new random encryption key.
    GenerateKey,
}

#[derive(Debug, Args, PartialEq, Eq)]
pub struct UploadPartArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub url: Url,
    #[arg(long)]
    pub part_index: u64,
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,
    #[arg(long)]
    pub signature: String,
    #[arg(long)]
    pub hash: String,
    #[arg(long)]
    pub public_key: String,
    #[arg(long, default_value = "")]
    pub request_body: String,
    /// Starting IV of the file, in hex. Must be the same for every part.
    #[arg(long)]
    pub iv: Iv,
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| format_err!("cannot find config dir"))?;
    Ok(config_dir.join("partcrypt.json5"))
}
