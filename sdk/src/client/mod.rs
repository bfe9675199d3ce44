mod download;

use {
    crate::{
        crypto::BlockCipher,
        encode::encode_part,
        error::Result,
        util::{byte_len, maybe_block_in_place},
    },
    partcrypt_protocol::{BlockLayout, UploadRequest},
    reqwest::multipart::{Form, Part},
    std::time::Duration,
    tracing::{debug, instrument},
};

/// Reuse created client or clone it in order to reuse a connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    reqwest: reqwest::Client,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the multipart field and file that carry the encrypted payload.
const PAYLOAD_FIELD: &str = "chunkData";

#[must_use]
#[inline]
pub fn upload_timeout(upload_size: u64) -> Duration {
    // Assuming upload speed above 1 MB/s.
    DEFAULT_TIMEOUT.saturating_add(Duration::from_micros(upload_size))
}

impl Client {
    /// `timeout` applies to every request that does not set its own.
    #[inline]
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            reqwest: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Encrypts one part and posts it to the storage node.
    ///
    /// Returns the JSON body of the storage node's response.
    #[instrument(skip_all, fields(part_index = request.part_index))]
    #[inline(never)]
    pub async fn upload_part(
        &self,
        layout: BlockLayout,
        request: &UploadRequest,
    ) -> Result<serde_json::Value> {
        let cipher = BlockCipher::new(&request.key);
        let payload = maybe_block_in_place(|| {
            encode_part(
                &cipher,
                layout,
                request.part_index,
                request.initial_iv,
                &request.plaintext_bytes,
            )
        })?;
        let size = byte_len(&payload);
        let status = &request.status_payload;
        let form = Form::new()
            .part(
                PAYLOAD_FIELD,
                Part::bytes(payload)
                    .file_name(PAYLOAD_FIELD)
                    .mime_str(&request.content_type)?,
            )
            .text("requestBody", request.request_body.clone())
            .text("signature", status.signature.clone())
            .text("hash", status.hash.clone())
            .text("publicKey", status.public_key.clone());

        let response = self
            .reqwest
            .post(request.upload_url.clone())
            .timeout(upload_timeout(size))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(size, "uploaded part");
        Ok(response)
    }
}
