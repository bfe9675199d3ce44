use {
    crate::layout::IV_LEN,
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        borrow::Cow,
        fmt::{self, Debug, Display},
        str::FromStr,
    },
    thiserror::Error,
};

pub const KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CredentialError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid length; got {actual}, expected {expected}")]
    Length { actual: usize, expected: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], CredentialError> {
    let bytes = hex::decode(s)?;
    <[u8; N]>::try_from(bytes).map_err(|bytes| CredentialError::Length {
        actual: bytes.len(),
        expected: N,
    })
}

/// AES-256 key used to seal and open every block of a file.
///
/// Supplied by the caller for the duration of one pipeline invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    #[must_use]
    #[inline]
    pub fn generate() -> Self {
        Self(rand::random())
    }

    #[must_use]
    #[inline]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    #[must_use]
    #[inline]
    pub fn display_unmasked(&self) -> impl Display + '_ {
        hex::encode(self.0)
    }
}

impl FromStr for EncryptionKey {
    type Err = CredentialError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl Debug for EncryptionKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey").finish()
    }
}

impl<'de> Deserialize<'de> for EncryptionKey {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Cow::<'_, str>::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Serialize for EncryptionKey {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(self.0).serialize(serializer)
    }
}

/// 128-bit initialization vector stored at the end of every physical block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    #[must_use]
    #[inline]
    pub fn random() -> Self {
        Self(rand::random())
    }

    #[must_use]
    #[inline]
    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }

    /// Treats the IV as a big-endian counter and moves it `steps` forward,
    /// wrapping around at 2^128.
    #[must_use]
    #[inline]
    pub const fn advanced(&self, steps: u128) -> Self {
        Self(u128::from_be_bytes(self.0).wrapping_add(steps).to_be_bytes())
    }
}

impl FromStr for Iv {
    type Err = CredentialError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl Display for Iv {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for Iv {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iv({self})")
    }
}

impl<'de> Deserialize<'de> for Iv {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Cow::<'_, str>::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Serialize for Iv {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}
