use {
    crate::{client::Client, error::Error},
    partcrypt_protocol::{
        BlockLayout, FailureKind, PartRequest, PartResponse, Segment,
        encoding::{MessageError, decode_request, encode_response, peek_part_index},
    },
    tracing::{info, warn},
};

/// Runs one pipeline per request. Holds no per-part state, so a unit can be
/// cloned freely and shared between tasks.
#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    client: Client,
    layout: BlockLayout,
}

impl ExecutionUnit {
    #[must_use]
    #[inline]
    pub const fn new(client: Client, layout: BlockLayout) -> Self {
        Self { client, layout }
    }

    #[must_use]
    #[inline]
    pub const fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Handles one part. Always produces exactly one response.
    #[inline]
    pub async fn handle(&self, request: PartRequest) -> PartResponse {
        let part_index = request.part_index();
        let response = match request {
            PartRequest::Download(request) => self
                .client
                .download_part(self.layout, &request)
                .await
                .map(|segments| PartResponse::Downloaded {
                    part_index,
                    segments: segments.into_iter().map(Segment::from).collect(),
                }),
            PartRequest::Upload(request) => self
                .client
                .upload_part(self.layout, &request)
                .await
                .map(|response| PartResponse::Uploaded {
                    part_index,
                    response,
                }),
        };
        match response {
            Ok(response) => {
                info!(part_index, "part done");
                response
            }
            Err(err) => {
                warn!(part_index, error = %err, "part failed");
                err.into_response(Some(part_index))
            }
        }
    }

    /// Handles one serialized request and returns the serialized response.
    ///
    /// A request that cannot be parsed is answered with a `malformedMessage`
    /// failure, tagged with its part index if one can be recovered.
    #[inline]
    pub async fn handle_message(&self, text: &str) -> String {
        let response = match decode_request(text) {
            Ok(request) => self.handle(request).await,
            Err(err) => reject_message(text, err),
        };
        encode_reply(&response)
    }
}

/// Builds the `malformedMessage` failure for a request that could not be
/// decoded, tagged with its part index if one can be recovered.
#[must_use]
#[inline]
pub fn reject_message(text: &str, err: MessageError) -> PartResponse {
    let part_index = peek_part_index(text);
    warn!(?part_index, error = %err, "rejected malformed request");
    Error::from(err).into_response(part_index)
}

/// Serializes a response, falling back to a bare `failed` message if the
/// response itself cannot be encoded.
#[must_use]
#[inline]
pub fn encode_reply(response: &PartResponse) -> String {
    encode_response(response).unwrap_or_else(|err| {
        serde_json::json!({
            "status": "failed",
            "partIndex": response.part_index(),
            "kind": FailureKind::MalformedMessage,
            "message": format!("failed to encode response: {err}"),
        })
        .to_string()
    })
}
