use {
    super::Client,
    crate::{
        crypto::BlockCipher,
        decode::decode_part,
        error::{Error, Result},
        util::{byte_len, maybe_block_in_place, to_usize},
    },
    bytes::{Bytes, BytesMut},
    partcrypt_protocol::{BlockLayout, ByteRange, DownloadRequest},
    reqwest::{StatusCode, header::RANGE},
    tracing::{debug, instrument},
    url::Url,
};

impl Client {
    /// Fetches exactly `range` from `url` with a single GET.
    ///
    /// The server must answer with 206, or with 200 if the body happens to be
    /// exactly the requested length. The body is read incrementally and the
    /// fetch stops as soon as it exceeds the range.
    #[instrument(skip_all, fields(%range))]
    #[inline(never)]
    pub async fn fetch_range(&self, url: &Url, range: ByteRange) -> Result<Bytes> {
        let mut response = self
            .reqwest
            .get(url.clone())
            .header(RANGE, range.header_value())
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::PARTIAL_CONTENT && status != StatusCode::OK {
            return Err(Error::RangeFetch {
                range,
                reason: format!("unexpected status {status}"),
            });
        }
        let expected = range.len();
        if let Some(declared) = response.content_length().filter(|&len| len != expected) {
            return Err(Error::RangeFetch {
                range,
                reason: format!("declared {declared} bytes with status {status}, expected {expected}"),
            });
        }

        let mut body = BytesMut::with_capacity(to_usize(expected).unwrap_or_default());
        let mut len = 0_u64;
        while let Some(chunk) = response.chunk().await? {
            len = len.saturating_add(byte_len(&chunk));
            if len > expected {
                return Err(Error::RangeFetch {
                    range,
                    reason: format!("received more than {expected} bytes with status {status}"),
                });
            }
            body.extend_from_slice(&chunk);
        }
        if len != expected {
            return Err(Error::RangeFetch {
                range,
                reason: format!("received {len} bytes with status {status}, expected {expected}"),
            });
        }
        debug!(len, "fetched range");
        Ok(body.freeze())
    }

    /// Fetches one part from storage and decrypts it into ordered plaintext
    /// segments.
    #[instrument(skip_all, fields(part_index = request.part_index))]
    #[inline(never)]
    pub async fn download_part(
        &self,
        layout: BlockLayout,
        request: &DownloadRequest,
    ) -> Result<Vec<Bytes>> {
        let range =
            layout.physical_range_for_part(request.part_index, request.total_physical_size)?;
        let physical = self.fetch_range(&request.download_url, range).await?;
        let cipher = BlockCipher::new(&request.key);
        maybe_block_in_place(|| decode_part(&cipher, layout, &physical))
    }
}
