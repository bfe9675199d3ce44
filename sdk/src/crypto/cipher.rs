use {
    super::{assemble_block, split_block},
    crate::{
        error::{Error, Result},
        util::byte_len,
    },
    aes_gcm::{
        AesGcm, Key, Nonce, Tag,
        aead::{AeadInPlace, KeyInit, consts::U16},
        aes::Aes256,
    },
    partcrypt_protocol::{
        EncryptionKey, Iv,
        layout::{BLOCK_OVERHEAD, TAG_LEN},
    },
};

/// AES-256-GCM with a 128-bit nonce, as used by the storage format.
type Aes256Gcm128 = AesGcm<Aes256, U16>;

fn nonce(iv: &Iv) -> Nonce<U16> {
    Nonce::from(*iv.as_bytes())
}

/// Output of [`BlockCipher::encrypt_block`], before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
    pub iv: Iv,
}

impl SealedBlock {
    /// Physical representation of the block.
    #[must_use]
    #[inline]
    pub fn assemble(&self) -> Vec<u8> {
        assemble_block(&self.ciphertext, &self.tag, &self.iv)
    }
}

/// Seals and opens single blocks with one key.
#[derive(Clone)]
pub struct BlockCipher {
    inner: Aes256Gcm128,
}

impl BlockCipher {
    #[must_use]
    #[inline]
    pub fn new(key: &EncryptionKey) -> Self {
        let key = Key::<Aes256Gcm128>::from(*key.as_bytes());
        Self {
            inner: Aes256Gcm128::new(&key),
        }
    }

    #[inline]
    pub fn encrypt_block(&self, plaintext: &[u8], iv: Iv) -> Result<SealedBlock> {
        let mut ciphertext = plaintext.to_vec();
        let tag = self
            .inner
            .encrypt_in_place_detached(&nonce(&iv), &[], &mut ciphertext)
            .map_err(|aes_gcm::Error| Error::Encryption)?;
        Ok(SealedBlock {
            ciphertext,
            tag: tag.into(),
            iv,
        })
    }

    /// Seals `plaintext` directly into `slot`, which must be exactly
    /// `plaintext.len()` + 32 bytes long.
    #[inline]
    pub fn seal_block_into(&self, plaintext: &[u8], iv: &Iv, slot: &mut [u8]) -> Result<()> {
        if byte_len(slot) != byte_len(plaintext).saturating_add(BLOCK_OVERHEAD) {
            return Err(Error::Encryption);
        }
        let (ciphertext, trailer) = slot.split_at_mut(plaintext.len());
        ciphertext.copy_from_slice(plaintext);
        let tag = self
            .inner
            .encrypt_in_place_detached(&nonce(iv), &[], ciphertext)
            .map_err(|aes_gcm::Error| Error::Encryption)?;
        let (tag_slot, iv_slot) = trailer.split_at_mut(TAG_LEN);
        tag_slot.copy_from_slice(&tag);
        iv_slot.copy_from_slice(iv.as_bytes());
        Ok(())
    }

    /// Opens one physical block. `block` is only used for error reporting.
    #[inline]
    pub fn decrypt_block(&self, physical: &[u8], block: u64) -> Result<Vec<u8>> {
        let (ciphertext, tag, iv) = split_block(physical).ok_or(Error::MalformedPhysicalData {
            len: byte_len(physical),
        })?;
        let mut plaintext = ciphertext.to_vec();
        self.inner
            .decrypt_in_place_detached(
                &Nonce::from(*iv),
                &[],
                &mut plaintext,
                Tag::from_slice(tag),
            )
            .map_err(|aes_gcm::Error| Error::Authentication { block })?;
        Ok(plaintext)
    }
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "test")]
mod tests {
    use {
        super::*,
        partcrypt_protocol::layout::IV_LEN,
        std::str::FromStr,
    };

    fn cipher() -> BlockCipher {
        BlockCipher::new(&EncryptionKey::from_bytes([7; 32]))
    }

    fn iv() -> Iv {
        Iv::from_str("0f0e0d0c0b0a09080706050403020100").unwrap()
    }

    #[test]
    fn sealed_block_layout() {
        let sealed = cipher().encrypt_block(b"hello, block", iv()).unwrap();
        assert_eq!(sealed.ciphertext.len(), 12);
        assert_ne!(sealed.ciphertext, b"hello, block");
        assert_eq!(sealed.iv, iv());

        let physical = sealed.assemble();
        assert_eq!(physical.len(), 12 + 32);
        assert_eq!(&physical[..12], sealed.ciphertext.as_slice());
        assert_eq!(&physical[12..28], &sealed.tag);
        assert_eq!(&physical[28..], iv().as_bytes());
    }

    #[test]
    fn seal_into_matches_assembled_block() {
        let plaintext = vec![42; 1000];
        let mut slot = vec![0; 1032];
        cipher().seal_block_into(&plaintext, &iv(), &mut slot).unwrap();
        assert_eq!(slot, cipher().encrypt_block(&plaintext, iv()).unwrap().assemble());

        let mut short_slot = vec![0; 1031];
        assert!(matches!(
            cipher().seal_block_into(&plaintext, &iv(), &mut short_slot),
            Err(Error::Encryption),
        ));
    }

    #[test]
    fn round_trip() {
        for len in [0, 1, 15, 16, 17, 4096] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let physical = cipher().encrypt_block(&plaintext, iv()).unwrap().assemble();
            assert_eq!(cipher().decrypt_block(&physical, 0).unwrap(), plaintext);
        }
    }

    #[test]
    fn every_flipped_bit_is_detected() {
        let physical = cipher().encrypt_block(b"tamper me", iv()).unwrap().assemble();
        for byte in 0..physical.len() {
            for bit in 0..8 {
                let mut tampered = physical.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(
                        cipher().decrypt_block(&tampered, 3),
                        Err(Error::Authentication { block: 3 }),
                    ),
                    "flip of bit {bit} in byte {byte} went unnoticed",
                );
            }
        }
    }

    #[test]
    fn wrong_key_is_detected() {
        let physical = cipher().encrypt_block(b"secret", iv()).unwrap().assemble();
        let other = BlockCipher::new(&EncryptionKey::from_bytes([8; 32]));
        assert!(matches!(
            other.decrypt_block(&physical, 0),
            Err(Error::Authentication { block: 0 }),
        ));
    }

    #[test]
    fn short_block_is_malformed() {
        assert!(matches!(
            cipher().decrypt_block(&[0; TAG_LEN + IV_LEN - 1], 0),
            Err(Error::MalformedPhysicalData { len: 31 }),
        ));
    }
}
