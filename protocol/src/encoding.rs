use {
    crate::messages::{PartRequest, PartResponse},
    thiserror::Error,
};

#[derive(Debug, Error)]
#[error("malformed message: {0}")]
pub struct MessageError(#[from] serde_json::Error);

pub fn decode_request(text: &str) -> Result<PartRequest, MessageError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_request(request: &PartRequest) -> Result<String, MessageError> {
    Ok(serde_json::to_string(request)?)
}

pub fn decode_response(text: &str) -> Result<PartResponse, MessageError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_response(response: &PartResponse) -> Result<String, MessageError> {
    Ok(serde_json::to_string(response)?)
}

/// Best-effort lookup of `partIndex` in a message that failed to decode,
/// so the failure can still be attributed to a part.
#[must_use]
pub fn peek_part_index(text: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()?
        .get("partIndex")?
        .as_u64()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::messages::{FailureKind, Segment},
    };

    #[test]
    fn response_survives_encoding() {
        let response = PartResponse::Downloaded {
            part_index: 4,
            segments: vec![Segment(vec![0, 159, 146, 150].into())],
        };
        let text = encode_response(&response).unwrap();
        assert_eq!(decode_response(&text).unwrap(), response);
    }

    #[test]
    fn malformed_requests() {
        decode_request("").unwrap_err();
        decode_request("{\"direction\":\"download\"}").unwrap_err();
        assert_eq!(peek_part_index("{\"partIndex\":7,\"key\":\"zz\"}"), Some(7));
        assert_eq!(peek_part_index("{\"partIndex\":\"7\"}"), None);
        assert_eq!(peek_part_index("not json"), None);
    }

    #[test]
    fn failure_kind_names() {
        let text = encode_response(&PartResponse::failed(
            Some(1),
            FailureKind::MalformedPhysicalData,
            "bad tail",
        ))
        .unwrap();
        assert!(text.contains("\"kind\":\"malformedPhysicalData\""));
    }
}
