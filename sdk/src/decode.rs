use {
    crate::{
        crypto::BlockCipher,
        error::Result,
        util::{byte_len, run_parallel, to_usize},
    },
    bytes::Bytes,
    partcrypt_protocol::{BlockLayout, LayoutError},
    tracing::debug,
};

/// Authenticates and decrypts every block of a physical part.
///
/// Returns plaintext segments ordered by block index. A single block that fails
/// authentication fails the whole part.
#[inline]
pub fn decode_part(cipher: &BlockCipher, layout: BlockLayout, physical: &[u8]) -> Result<Vec<Bytes>> {
    let block_count = layout.check_physical_len(byte_len(physical))?;
    let physical_block_size = to_usize(layout.physical_block_size()).ok_or(
        LayoutError::BlockTooLarge {
            block_size: layout.physical_block_size(),
        },
    )?;

    let mut segments = vec![Bytes::new(); physical.chunks(physical_block_size).len()];
    let mut slots: Vec<(u64, &[u8], &mut Bytes)> = (0_u64..)
        .zip(physical.chunks(physical_block_size))
        .zip(&mut segments)
        .map(|((index, block), segment)| (index, block, segment))
        .collect();
    run_parallel(&mut slots, |(index, block, segment)| {
        **segment = cipher.decrypt_block(block, *index)?.into();
        Ok(())
    })?;

    debug!(block_count, physical_len = physical.len(), "decoded part");
    Ok(segments)
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "test")]
mod tests {
    use {
        super::*,
        crate::{encode::encode_part, error::Error},
        partcrypt_protocol::{EncryptionKey, Iv},
        proptest::prelude::*,
    };

    fn cipher() -> BlockCipher {
        BlockCipher::new(&EncryptionKey::from_bytes([9; 32]))
    }

    fn small_layout() -> BlockLayout {
        BlockLayout::new(64, 16).unwrap()
    }

    #[test]
    fn empty_physical_span() {
        assert!(decode_part(&cipher(), BlockLayout::DEFAULT, &[]).unwrap().is_empty());
    }

    #[test]
    fn segments_are_in_block_order() {
        let plaintext: Vec<u8> = (0..=255).cycle().take(64 * 16).collect();
        let physical = encode_part(&cipher(), small_layout(), 0, Iv::default(), &plaintext).unwrap();
        let segments = decode_part(&cipher(), small_layout(), &physical).unwrap();
        assert_eq!(segments.len(), 16);
        for (segment, expected) in segments.iter().zip(plaintext.chunks(64)) {
            assert_eq!(segment.as_ref(), expected);
        }
    }

    #[test]
    fn corrupted_block_fails_the_part() {
        let plaintext = vec![5; 64 * 3 + 10];
        let mut physical =
            encode_part(&cipher(), small_layout(), 0, Iv::default(), &plaintext).unwrap();
        // Last byte of the IV of block 2.
        physical[3 * 96 - 1] ^= 0x80;
        assert!(matches!(
            decode_part(&cipher(), small_layout(), &physical),
            Err(Error::Authentication { block: 2 }),
        ));
    }

    #[test]
    fn wrong_key_fails_the_part() {
        let physical =
            encode_part(&cipher(), small_layout(), 0, Iv::default(), &[1, 2, 3]).unwrap();
        let other = BlockCipher::new(&EncryptionKey::from_bytes([10; 32]));
        assert!(matches!(
            decode_part(&other, small_layout(), &physical),
            Err(Error::Authentication { block: 0 }),
        ));
    }

    #[test]
    fn truncated_tail_is_malformed() {
        let physical =
            encode_part(&cipher(), small_layout(), 0, Iv::default(), &[0; 100]).unwrap();
        assert_eq!(physical.len(), 164);
        // Keep one full block plus 20 bytes of the second one.
        assert!(matches!(
            decode_part(&cipher(), small_layout(), &physical[..116]),
            Err(Error::MalformedPhysicalData { len: 116 }),
        ));
        // A tail that still holds ciphertext decodes but fails authentication.
        assert!(matches!(
            decode_part(&cipher(), small_layout(), &physical[..150]),
            Err(Error::Authentication { block: 1 }),
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn round_trip_small_blocks(
            plaintext in proptest::collection::vec(any::<u8>(), 0..=10 * 64 + 37),
            part_index in 0..1000_u64,
        ) {
            let physical = encode_part(&cipher(), small_layout(), part_index, Iv::default(), &plaintext).unwrap();
            prop_assert_eq!(physical.len() as u64, small_layout().size_on_fs(plaintext.len() as u64));
            let segments = decode_part(&cipher(), small_layout(), &physical).unwrap();
            prop_assert_eq!(segments.len() as u64, small_layout().number_of_blocks(plaintext.len() as u64));
            prop_assert_eq!(segments.concat(), plaintext);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn round_trip_default_blocks(len in 0..=10 * 65_536 + 37_usize, seed in any::<u8>()) {
            let plaintext: Vec<u8> = (0..len).map(|i| (i as u8) ^ seed).collect();
            let iv = Iv::from_bytes([seed; 16]);
            let physical = encode_part(&cipher(), BlockLayout::DEFAULT, 0, iv, &plaintext).unwrap();
            let segments = decode_part(&cipher(), BlockLayout::DEFAULT, &physical).unwrap();
            prop_assert_eq!(segments.concat(), plaintext);
        }
    }
}
