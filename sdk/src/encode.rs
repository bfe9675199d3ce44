use {
    crate::{
        crypto::BlockCipher,
        error::{Error, Result},
        util::{byte_len, run_parallel, to_usize},
    },
    partcrypt_protocol::{BlockLayout, Iv, LayoutError},
    tracing::debug,
};

/// Lays out one part's blocks in a physical buffer.
///
/// Every block's output slot is known before anything is sealed, so blocks can
/// be sealed in any order.
struct PartEncoder<'a> {
    cipher: &'a BlockCipher,
    plaintext: &'a [u8],
    block_size: usize,
    physical_block_size: usize,
    physical_len: usize,
    /// IV of the first block of this part.
    first_iv: Iv,
}

impl<'a> PartEncoder<'a> {
    fn new(
        cipher: &'a BlockCipher,
        layout: BlockLayout,
        part_index: u64,
        initial_iv: Iv,
        plaintext: &'a [u8],
    ) -> Result<Self> {
        let len = byte_len(plaintext);
        let max = layout.logical_part_size();
        if len > max {
            return Err(Error::PartTooLarge { len, max });
        }
        let overflow = || LayoutError::Overflow { part_index };
        let too_large = || LayoutError::BlockTooLarge {
            block_size: layout.physical_block_size(),
        };
        let first_block = u128::from(part_index)
            .checked_mul(u128::from(layout.blocks_per_part()))
            .ok_or_else(overflow)?;
        Ok(Self {
            cipher,
            plaintext,
            block_size: to_usize(layout.block_size()).ok_or_else(too_large)?,
            physical_block_size: to_usize(layout.physical_block_size()).ok_or_else(too_large)?,
            physical_len: to_usize(layout.size_on_fs(len)).ok_or_else(overflow)?,
            first_iv: initial_iv.advanced(first_block),
        })
    }

    /// Pairs every plaintext block with its slot in `output`.
    fn slots<'b>(&self, output: &'b mut [u8]) -> Vec<(u64, &'a [u8], &'b mut [u8])> {
        (0_u64..)
            .zip(self.plaintext.chunks(self.block_size))
            .zip(output.chunks_mut(self.physical_block_size))
            .map(|((index, block), slot)| (index, block, slot))
            .collect()
    }

    fn seal(&self, index: u64, block: &[u8], slot: &mut [u8]) -> Result<()> {
        let iv = self.first_iv.advanced(u128::from(index));
        self.cipher.seal_block_into(block, &iv, slot)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut output = vec![0; self.physical_len];
        let mut slots = self.slots(&mut output);
        run_parallel(&mut slots, |(index, block, slot)| {
            self.seal(*index, block, slot)
        })?;
        Ok(output)
    }
}

/// Encrypts one part of a file into its physical representation.
///
/// Block `j` of part `p` is sealed with `initial_iv` advanced by
/// `p * blocks_per_part + j`, so the output depends only on the inputs and
/// never on the order in which blocks finish.
#[inline]
pub fn encode_part(
    cipher: &BlockCipher,
    layout: BlockLayout,
    part_index: u64,
    initial_iv: Iv,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let encoder = PartEncoder::new(cipher, layout, part_index, initial_iv, plaintext)?;
    let output = encoder.encode()?;
    debug!(
        part_index,
        plaintext_len = plaintext.len(),
        physical_len = output.len(),
        "encoded part"
    );
    Ok(output)
}
