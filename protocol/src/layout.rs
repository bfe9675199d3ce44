//! Logical and physical block geometry.
//!
//! A file is cut into plaintext blocks of `block_size` bytes (the last one may be
//! shorter). Every block is stored as
//!
//! - ciphertext (same length as the plaintext block)
//! - authentication tag (128 bits)
//! - IV (128 bits)
//!
//! so a physical block is always exactly [`BLOCK_OVERHEAD`] bytes longer than its
//! logical block, including the short final block.

use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

/// Default length of a plaintext block.
pub const BLOCK_SIZE: u64 = 64 * 1024;

pub const TAG_LEN: usize = 16;
pub const IV_LEN: usize = 16;

/// Bytes added to every block on storage: tag followed by IV.
#[expect(clippy::as_conversions, reason = "const context, lossless")]
pub const BLOCK_OVERHEAD: u64 = (TAG_LEN + IV_LEN) as u64;

pub const PHYSICAL_BLOCK_SIZE: u64 = BLOCK_SIZE + BLOCK_OVERHEAD;

/// Default number of blocks transferred together as one part.
pub const BLOCKS_PER_PART: u64 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("invalid layout: {0} must be non-zero")]
    ZeroSize(&'static str),
    #[error("part {part_index} is out of range for a file of {total_size} bytes")]
    PartOutOfRange { part_index: u64, total_size: u64 },
    #[error("byte offset of part {part_index} overflows")]
    Overflow { part_index: u64 },
    #[error("physical block of {block_size} bytes does not fit in memory")]
    BlockTooLarge { block_size: u64 },
    #[error("{len} bytes is not a whole number of physical blocks")]
    MalformedPhysicalLength { len: u64 },
}

/// Block and part geometry shared by the encoder and the decoder.
///
/// Both sides of a transfer must agree on it; the storage node never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlockLayout")]
pub struct BlockLayout {
    block_size: u64,
    blocks_per_part: u64,
}

#[derive(Deserialize)]
struct RawBlockLayout {
    block_size: u64,
    blocks_per_part: u64,
}

impl TryFrom<RawBlockLayout> for BlockLayout {
    type Error = LayoutError;

    fn try_from(raw: RawBlockLayout) -> Result<Self, Self::Error> {
        Self::new(raw.block_size, raw.blocks_per_part)
    }
}

impl Default for BlockLayout {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BlockLayout {
    pub const DEFAULT: Self = Self {
        block_size: BLOCK_SIZE,
        blocks_per_part: BLOCKS_PER_PART,
    };

    #[inline]
    pub const fn new(block_size: u64, blocks_per_part: u64) -> Result<Self, LayoutError> {
        if block_size == 0 {
            return Err(LayoutError::ZeroSize("block size"));
        }
        if blocks_per_part == 0 {
            return Err(LayoutError::ZeroSize("blocks per part"));
        }
        Ok(Self {
            block_size,
            blocks_per_part,
        })
    }

    #[must_use]
    #[inline]
    pub const fn block_size(&self) -> u64 {
        self.block_size
    }

    #[must_use]
    #[inline]
    pub const fn blocks_per_part(&self) -> u64 {
        self.blocks_per_part
    }

    #[must_use]
    #[inline]
    pub const fn physical_block_size(&self) -> u64 {
        self.block_size.saturating_add(BLOCK_OVERHEAD)
    }

    /// Physical size of `len` logical bytes.
    ///
    /// Saturates at `u64::MAX` instead of overflowing.
    #[must_use]
    #[inline]
    pub const fn size_on_fs(&self, len: u64) -> u64 {
        len.saturating_add(BLOCK_OVERHEAD.saturating_mul(self.number_of_blocks(len)))
    }

    /// Number of logical blocks in `len` plaintext bytes.
    #[must_use]
    #[inline]
    pub const fn number_of_blocks(&self, len: u64) -> u64 {
        len.div_ceil(self.block_size)
    }

    /// Number of blocks stored in a physical span of `len` bytes.
    #[must_use]
    #[inline]
    pub const fn number_of_blocks_on_fs(&self, len: u64) -> u64 {
        len.div_ceil(self.physical_block_size())
    }

    /// Plaintext length recovered from a well-formed physical span of `len` bytes.
    #[inline]
    pub const fn logical_size(&self, len: u64) -> Result<u64, LayoutError> {
        match self.check_physical_len(len) {
            Ok(blocks) => Ok(len.saturating_sub(BLOCK_OVERHEAD.saturating_mul(blocks))),
            Err(err) => Err(err),
        }
    }

    /// Returns the number of blocks in a physical span, rejecting spans whose
    /// trailing block cannot hold any ciphertext.
    #[inline]
    pub const fn check_physical_len(&self, len: u64) -> Result<u64, LayoutError> {
        let tail = len % self.physical_block_size();
        if tail != 0 && tail <= BLOCK_OVERHEAD {
            return Err(LayoutError::MalformedPhysicalLength { len });
        }
        Ok(self.number_of_blocks_on_fs(len))
    }
}

/// Size of `len` logical bytes on storage with the default layout.
#[must_use]
#[inline]
pub const fn size_on_fs(len: u64) -> u64 {
    BlockLayout::DEFAULT.size_on_fs(len)
}

#[must_use]
#[inline]
pub const fn number_of_blocks(len: u64) -> u64 {
    BlockLayout::DEFAULT.number_of_blocks(len)
}

#[must_use]
#[inline]
pub const fn number_of_blocks_on_fs(len: u64) -> u64 {
    BlockLayout::DEFAULT.number_of_blocks_on_fs(len)
}
