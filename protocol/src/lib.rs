//! Wire-level definitions shared by partcrypt callers and execution units.
//!
//! Nothing in this crate performs I/O or cryptography: it defines how a file is
//! cut into blocks and parts, how those map to byte ranges on storage, and the
//! messages that carry one part between a caller and an execution unit.

pub mod credentials;
pub mod encoding;
pub mod layout;
pub mod messages;
pub mod partition;

pub use crate::{
    credentials::{EncryptionKey, Iv},
    layout::{BlockLayout, LayoutError},
    messages::{DownloadRequest, FailureKind, PartRequest, PartResponse, Segment, UploadRequest},
    partition::ByteRange,
};
