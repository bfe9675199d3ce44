use {
    partcrypt_protocol::{
        ByteRange, FailureKind, LayoutError, PartResponse, encoding::MessageError,
    },
    thiserror::Error,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can fail a part. None of these are retried here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed for block {block}: data is corrupted or the key is wrong")]
    Authentication { block: u64 },
    #[error("range fetch of bytes {range} failed: {reason}")]
    RangeFetch { range: ByteRange, reason: String },
    #[error("transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed physical data: {len} bytes is not a whole number of blocks")]
    MalformedPhysicalData { len: u64 },
    #[error(transparent)]
    MalformedMessage(#[from] MessageError),
    #[error(transparent)]
    Layout(LayoutError),
    #[error("part of {len} bytes exceeds the part size of {max} bytes")]
    PartTooLarge { len: u64, max: u64 },
    #[error("all {capacity} execution units are busy")]
    PoolSaturated { capacity: usize },
    #[error("block encryption failed")]
    Encryption,
}

impl From<LayoutError> for Error {
    #[inline]
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::MalformedPhysicalLength { len } => Self::MalformedPhysicalData { len },
            err => Self::Layout(err),
        }
    }
}

impl Error {
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Authentication { .. } => FailureKind::Authentication,
            Self::RangeFetch { .. } => FailureKind::RangeFetch,
            Self::Transport(_) => FailureKind::Transport,
            Self::MalformedPhysicalData { .. } => FailureKind::MalformedPhysicalData,
            Self::MalformedMessage(_)
            | Self::Layout(LayoutError::ZeroSize(_) | LayoutError::BlockTooLarge { .. }) => {
                FailureKind::MalformedMessage
            }
            Self::Layout(_) => FailureKind::PartOutOfRange,
            Self::PartTooLarge { .. } => FailureKind::PartTooLarge,
            Self::PoolSaturated { .. } => FailureKind::PoolSaturated,
            Self::Encryption => FailureKind::Encryption,
        }
    }

    /// Converts the error into the failure response reported for a part.
    #[must_use]
    #[inline]
    pub fn into_response(self, part_index: Option<u64>) -> PartResponse {
        PartResponse::failed(part_index, self.kind(), &self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_layouts_are_malformed_messages() {
        let err = Error::from(LayoutError::BlockTooLarge {
            block_size: u64::MAX,
        });
        assert_eq!(err.kind(), FailureKind::MalformedMessage);
        assert!(!err.to_string().contains("part"));
        assert_eq!(
            Error::from(LayoutError::ZeroSize("block size")).kind(),
            FailureKind::MalformedMessage,
        );
    }

    #[test]
    fn offsets_past_the_file_are_out_of_range() {
        let err = Error::from(LayoutError::Overflow { part_index: 3 });
        assert_eq!(err.kind(), FailureKind::PartOutOfRange);
        let response = err.into_response(Some(3));
        assert_eq!(response.part_index(), Some(3));
    }
}
