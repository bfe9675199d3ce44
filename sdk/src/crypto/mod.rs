//! All block encryption uses AES-256-GCM with a 128-bit IV.
//!
//! Every plaintext block is sealed on its own, so any block can be opened
//! without the others. A sealed block is stored as:
//!
//! - ciphertext (same length as the plaintext block)
//! - authentication tag (128 bits)
//! - IV (128 bits) used to seal this block
//!
//! The order of these fields is shared with the storage node and other clients.
//! No associated data is authenticated, so a block's position is not bound to its
//! content; integrity of the whole file is the caller's concern.
//!
//! The codec never picks IVs itself. The caller supplies a starting IV and each
//! block of a file uses that IV advanced by the block's index within the file.

mod cipher;

pub use cipher::{BlockCipher, SealedBlock};
use partcrypt_protocol::{
    Iv,
    layout::{IV_LEN, TAG_LEN},
};

/// Concatenates the parts of a sealed block in storage order.
#[must_use]
#[inline]
pub fn assemble_block(ciphertext: &[u8], tag: &[u8; TAG_LEN], iv: &Iv) -> Vec<u8> {
    let mut block = Vec::with_capacity(ciphertext.len().saturating_add(TAG_LEN + IV_LEN));
    block.extend_from_slice(ciphertext);
    block.extend_from_slice(tag);
    block.extend_from_slice(iv.as_bytes());
    block
}

/// Splits a physical block into ciphertext, tag and IV.
///
/// Returns `None` if the block is too short to hold a tag and an IV.
#[must_use]
#[inline]
pub fn split_block(physical: &[u8]) -> Option<(&[u8], &[u8; TAG_LEN], &[u8; IV_LEN])> {
    let ciphertext_len = physical.len().checked_sub(TAG_LEN + IV_LEN)?;
    let (ciphertext, trailer) = physical.split_at(ciphertext_len);
    let (tag, iv) = trailer.split_at(TAG_LEN);
    Some((ciphertext, tag.try_into().ok()?, iv.try_into().ok()?))
}
