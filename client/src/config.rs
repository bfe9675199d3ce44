use {
    crate::cli::default_config_path,
    anyhow::{Context as _, Result},
    derivative::Derivative,
    partcrypt_protocol::{EncryptionKey, layout::BLOCKS_PER_PART},
    serde::{Deserialize, Serialize},
    std::{
        io,
        path::{Path, PathBuf},
        time::Duration,
    },
    tracing::debug,
};

#[derive(Derivative, Clone, Serialize, Deserialize)]
#[derivative(Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Required for transfers. Its `Debug` output is masked.
    pub encryption_key: Option<EncryptionKey>,
    /// Number of parts processed at once.
    #[derivative(Default(value = "4"))]
    pub workers: usize,
    #[derivative(Default(value = "BLOCKS_PER_PART"))]
    pub blocks_per_part: u64,
    #[serde(with = "humantime_serde")]
    #[derivative(Default(value = "Duration::from_secs(30)"))]
    pub request_timeout: Duration,
    pub log_file: Option<PathBuf>,
    #[derivative(Default(value = "\"info\".into()"))]
    pub log_filter: String,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(json5::from_str(text)?)
    }

    /// Reads the config from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the default config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path()?, false),
        };
        match fs_err::read_to_string(&path) {
            Ok(text) => Self::parse(&text).with_context(|| format!("invalid config {path:?}")),
            Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "config not found, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn defaults() {
        let config = Config::parse("{}").unwrap();
        assert!(config.encryption_key.is_none());
        assert_eq!(config.workers, 4);
        assert_eq!(config.blocks_per_part, 80);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn full_config() {
        let key = "11".repeat(32);
        let config = Config::parse(&format!(
            r#"{{
                // json5 allows comments
                encryption_key: "{key}",
                workers: 8,
                blocks_per_part: 16,
                request_timeout: "2m 30s",
                log_file: "/tmp/partcrypt.log",
                log_filter: "partcrypt_sdk=debug",
            }}"#
        ))
        .unwrap();
        assert_eq!(
            config.encryption_key.unwrap(),
            EncryptionKey::from_bytes([0x11; 32])
        );
        assert_eq!(config.workers, 8);
        assert_eq!(config.blocks_per_part, 16);
        assert_eq!(config.request_timeout, Duration::from_secs(150));
        assert_eq!(config.log_file, Some("/tmp/partcrypt.log".into()));
        assert_eq!(config.log_filter, "partcrypt_sdk=debug");
    }

    #[test]
    fn key_is_masked() {
        let config = Config::parse(&format!("{{ encryption_key: \"{}\" }}", "ab".repeat(32))).unwrap();
        assert!(!format!("{config:?}").contains("abab"));
    }

    #[test]
    fn invalid_configs() {
        Config::parse("{ encryption_key: \"abcd\" }").unwrap_err();
        Config::parse("{ unknown_field: 1 }").unwrap_err();
        Config::parse("{ request_timeout: \"soon\" }").unwrap_err();
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        Config::load(Some(&dir.path().join("missing.json5"))).unwrap_err();

        let path = dir.path().join("partcrypt.json5");
        fs_err::File::create(&path)
            .unwrap()
            .write_all(b"{ workers: 2 }")
            .unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().workers, 2);
    }
}
