use {
    crate::layout::{BlockLayout, LayoutError},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Inclusive byte range, as used by the HTTP `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range. Never zero.
    #[must_use]
    #[inline]
    #[expect(clippy::arithmetic_side_effects, reason = "start <= end by construction")]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    #[must_use]
    #[inline]
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl BlockLayout {
    /// Physical size of a full part.
    #[must_use]
    #[inline]
    pub const fn physical_part_size(&self) -> u64 {
        self.blocks_per_part()
            .saturating_mul(self.physical_block_size())
    }

    /// Logical (plaintext) size of a full part.
    #[must_use]
    #[inline]
    pub const fn logical_part_size(&self) -> u64 {
        self.blocks_per_part().saturating_mul(self.block_size())
    }

    /// Number of parts in a file of `total_physical_size` bytes on storage.
    #[must_use]
    #[inline]
    pub const fn number_of_parts(&self, total_physical_size: u64) -> u64 {
        total_physical_size.div_ceil(self.physical_part_size())
    }

    /// Number of parts needed to upload `total_logical_size` plaintext bytes.
    #[must_use]
    #[inline]
    pub const fn number_of_logical_parts(&self, total_logical_size: u64) -> u64 {
        total_logical_size.div_ceil(self.logical_part_size())
    }

    /// Physical byte range of a part, clamped to the end of the file.
    #[inline]
    pub fn physical_range_for_part(
        &self,
        part_index: u64,
        total_physical_size: u64,
    ) -> Result<ByteRange, LayoutError> {
        range_for_part(part_index, total_physical_size, self.physical_part_size())
    }

    /// Plaintext byte range covered by a part.
    #[inline]
    pub fn logical_range_for_part(
        &self,
        part_index: u64,
        total_logical_size: u64,
    ) -> Result<ByteRange, LayoutError> {
        range_for_part(part_index, total_logical_size, self.logical_part_size())
    }
}

fn range_for_part(part_index: u64, total_size: u64, part_size: u64) -> Result<ByteRange, LayoutError> {
    let overflow = || LayoutError::Overflow { part_index };
    let start = part_index.checked_mul(part_size).ok_or_else(overflow)?;
    if start >= total_size {
        return Err(LayoutError::PartOutOfRange {
            part_index,
            total_size,
        });
    }
    let next_start = part_index
        .checked_add(1)
        .and_then(|next| next.checked_mul(part_size))
        .unwrap_or(u64::MAX);
    // `start < total_size` guarantees `end >= start`.
    let end = next_start.min(total_size).saturating_sub(1);
    Ok(ByteRange { start, end })
}

/// Physical byte range of a part of a file stored with the default block size.
#[inline]
pub fn physical_range_for_part(
    part_index: u64,
    total_physical_size: u64,
    blocks_per_part: u64,
) -> Result<ByteRange, LayoutError> {
    BlockLayout::new(BlockLayout::DEFAULT.block_size(), blocks_per_part)?
        .physical_range_for_part(part_index, total_physical_size)
}
