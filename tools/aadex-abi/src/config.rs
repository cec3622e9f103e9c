use std::collections::BTreeSet;
use std::fs::read_to_string;
use std::io::{self, ErrorKind};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE: &str = "abi.toml";

pub const DEFAULT_ABI_DIR: &str = "abi";

/// Relative to the ABI directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "../artifacts/contracts";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    NotFound { path: Utf8PathBuf },

    #[error("failed to read configuration from {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration from {path}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("configuration {path} declares no targets")]
    NoTargets { path: Utf8PathBuf },

    #[error("output {output} is produced by more than one target")]
    DuplicateOutput { output: Utf8PathBuf },
}

/// One build artifact and the ABI file extracted from it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AbiTarget {
    pub name: String,
    /// Relative to the artifacts directory.
    pub artifact: Utf8PathBuf,
    /// Relative to the ABI directory.
    pub output: Utf8PathBuf,
}

impl AbiTarget {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        artifact: impl Into<Utf8PathBuf>,
        output: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
            output: output.into(),
        }
    }

    #[must_use]
    pub fn entry_point() -> Self {
        Self::new(
            "entrypoint",
            "entrypoint/AADexEntryPoint.sol/AADexEntryPoint.json",
            "EntryPoint.abi",
        )
    }

    #[must_use]
    pub fn dex_manager() -> Self {
        Self::new(
            "dexmanager",
            "aadex/AADexManager.sol/AADexManager.json",
            "DexManager.abi",
        )
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::entry_point(), Self::dex_manager()]
    }
}

/// On-disk overrides, every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    artifacts: Option<Utf8PathBuf>,
    #[serde(rename = "target")]
    targets: Option<Vec<AbiTarget>>,
}

impl ConfigFile {
    fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_owned(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct AbiConfig {
    pub abi_dir: Utf8PathBuf,
    pub artifacts_dir: Utf8PathBuf,
    pub targets: Vec<AbiTarget>,
}

impl AbiConfig {
    /// The fixed layout: Hardhat's `artifacts/contracts` next to the ABI
    /// directory, and the entry point and DEX manager contracts.
    #[must_use]
    pub fn with_defaults(abi_dir: impl Into<Utf8PathBuf>) -> Self {
        let abi_dir = abi_dir.into();

        Self {
            artifacts_dir: abi_dir.join(DEFAULT_ARTIFACTS_DIR),
            abi_dir,
            targets: AbiTarget::defaults(),
        }
    }

    /// Builds the configuration for `abi_dir`.
    ///
    /// An explicit `config` file must exist; otherwise `abi.toml` inside the
    /// ABI directory is applied when present.
    pub fn load(abi_dir: &Utf8Path, config: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let mut this = Self::with_defaults(abi_dir);

        let path = match config {
            Some(path) => path.to_owned(),
            None => {
                let implicit = abi_dir.join(CONFIG_FILE);
                if !implicit.is_file() {
                    debug!(%abi_dir, "no {CONFIG_FILE}, using default targets");
                    return Ok(this);
                }
                implicit
            }
        };

        debug!(%path, "loading configuration");

        let file = ConfigFile::load(&path)?;

        if let Some(artifacts) = file.artifacts {
            this.artifacts_dir = abi_dir.join(artifacts);
        }

        if let Some(targets) = file.targets {
            if targets.is_empty() {
                return Err(ConfigError::NoTargets { path });
            }
            this.targets = targets;
        }

        this.validate()?;

        Ok(this)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();

        for target in &self.targets {
            if !seen.insert(&target.output) {
                return Err(ConfigError::DuplicateOutput {
                    output: target.output.clone(),
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn artifact_path(&self, target: &AbiTarget) -> Utf8PathBuf {
        self.artifacts_dir.join(&target.artifact)
    }

    #[must_use]
    pub fn output_path(&self, target: &AbiTarget) -> Utf8PathBuf {
        self.abi_dir.join(&target.output)
    }
}
