//! Block encryption pipelines for partcrypt transfers.
//!
//! A file is stored as a sequence of independently sealed blocks, grouped into
//! parts. [`encode::encode_part`] and [`decode::decode_part`] convert one part
//! between plaintext and its stored form; [`Client`] moves parts over HTTP, and
//! [`ExecutionUnit`] and [`WorkerPool`] run one part per message.

pub mod client;
pub mod crypto;
pub mod decode;
pub mod encode;
pub mod error;
pub mod pool;
pub mod unit;
mod util;

pub use crate::{
    client::Client,
    error::{Error, Result},
    pool::{PartHandle, WorkerPool},
    unit::ExecutionUnit,
};
