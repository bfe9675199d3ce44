//! In-process storage node for command tests. Serves one stored file and
//! answers `Range` requests with 206.

use {
    crate::{Ctx, config::Config},
    http_body_util::Full,
    hyper::{
        Request, Response, StatusCode,
        body::{Bytes, Incoming},
        header::RANGE,
        server::conn::http1,
        service::service_fn,
    },
    hyper_util::rt::TokioIo,
    partcrypt_protocol::{BlockLayout, EncryptionKey, Iv, layout::BLOCK_SIZE},
    partcrypt_sdk::{crypto::BlockCipher, encode::encode_part},
    std::convert::Infallible,
    tokio::net::TcpListener,
    url::Url,
};

/// Blocks per part used by [`test_ctx`]; parts are 128 KiB of plaintext.
const BLOCKS_PER_PART: u64 = 2;

pub fn test_key() -> EncryptionKey {
    EncryptionKey::from_bytes([0x42; 32])
}

pub fn test_layout() -> BlockLayout {
    BlockLayout::new(BLOCK_SIZE, BLOCKS_PER_PART).unwrap()
}

pub fn test_ctx() -> Ctx {
    Ctx::new(Config {
        encryption_key: Some(test_key()),
        workers: 2,
        blocks_per_part: BLOCKS_PER_PART,
        ..Config::default()
    })
    .unwrap()
}

/// Encrypts `plaintext` part by part, as uploads would have stored it.
pub fn encrypt_file(plaintext: &[u8]) -> Vec<u8> {
    let cipher = BlockCipher::new(&test_key());
    let part_size = usize::try_from(test_layout().logical_part_size()).unwrap();
    (0_u64..)
        .zip(plaintext.chunks(part_size))
        .flat_map(|(part_index, part)| {
            encode_part(&cipher, test_layout(), part_index, Iv::default(), part).unwrap()
        })
        .collect()
}

fn ranged(stored: &Bytes, request: &Request<Incoming>) -> Response<Full<Bytes>> {
    let range = request
        .headers()
        .get(RANGE)
        .and_then(|value| value.to_str().ok()?.strip_prefix("bytes=")?.split_once('-'))
        .and_then(|(start, end)| Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?)));
    let Some((start, end)) = range.filter(|&(start, end)| start <= end && end < stored.len())
    else {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
        return response;
    };
    let mut response = Response::new(Full::new(stored.slice(start..=end)));
    *response.status_mut() = StatusCode::PARTIAL_CONTENT;
    response
}

pub struct StorageNode {
    pub url: Url,
    pub key: EncryptionKey,
    stored: Bytes,
}

impl StorageNode {
    pub async fn start(stored: Vec<u8>) -> Self {
        let stored = Bytes::from(stored);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = stored.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let stored = served.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request| {
                        let response = ranged(&stored, &request);
                        async move { Ok::<_, Infallible>(response) }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });
        Self {
            url: format!("http://{addr}/files/1").parse().unwrap(),
            key: test_key(),
            stored,
        }
    }

    pub async fn with_plaintext(plaintext: &[u8]) -> Self {
        Self::start(encrypt_file(plaintext)).await
    }

    pub fn physical_len(&self) -> u64 {
        self.stored.len().try_into().unwrap()
    }
}
