//! Artifact → ABI file extraction.
//!
//! Every build artifact is read and parsed before any output is touched, so
//! a missing or malformed artifact leaves all outputs as they were. The ABIs
//! are then taken and written in target order; the first failure stops the
//! run and outputs of targets that already completed stay on disk.

use core::fmt;
use std::fs::{read, write};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::{read_artifact, render_abi, take_abi, ArtifactError};
use crate::config::{AbiConfig, AbiTarget};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("failed to extract ABI for `{target}`")]
    Artifact {
        target: String,
        #[source]
        source: ArtifactError,
    },

    #[error("failed to write ABI file {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ABI files are out of date: {}", format_paths(.paths))]
    Stale { paths: Vec<Utf8PathBuf> },
}

impl ExtractError {
    fn artifact(target: &AbiTarget, source: ArtifactError) -> Self {
        Self::Artifact {
            target: target.name.clone(),
            source,
        }
    }
}

fn format_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Create or overwrite every output.
    #[default]
    Write,
    /// Compare against the outputs on disk without touching them.
    Check,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Written,
    Unchanged,
    Stale,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Written => "written",
            Self::Unchanged => "unchanged",
            Self::Stale => "stale",
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Outcome {
    pub name: String,
    pub output: Utf8PathBuf,
    pub status: Status,
}

/// Runs every configured target.
///
/// In [`Mode::Check`] all targets are compared before failing, so the error
/// lists every stale output at once.
pub fn extract(config: &AbiConfig, mode: Mode) -> Result<Vec<Outcome>, ExtractError> {
    let mut documents = Vec::with_capacity(config.targets.len());

    for target in &config.targets {
        let artifact = config.artifact_path(target);

        debug!(contract = %target.name, %artifact, "loading build artifact");

        let document =
            read_artifact(&artifact).map_err(|source| ExtractError::artifact(target, source))?;

        documents.push((target, artifact, document));
    }

    let mut outcomes = Vec::with_capacity(documents.len());

    for (target, artifact, document) in documents {
        let output = config.output_path(target);

        let contents = take_abi(&artifact, document)
            .and_then(|abi| render_abi(&abi))
            .map_err(|source| ExtractError::artifact(target, source))?;

        let status = match mode {
            Mode::Write => {
                if write_if_changed(&output, &contents)? {
                    Status::Written
                } else {
                    Status::Unchanged
                }
            }
            Mode::Check => {
                if is_current(&output, &contents) {
                    Status::Unchanged
                } else {
                    Status::Stale
                }
            }
        };

        match status {
            Status::Stale => {
                warn!(contract = %target.name, %output, "ABI file is out of date");
            }
            _ => info!(contract = %target.name, %output, %status, "ABI extracted"),
        }

        outcomes.push(Outcome {
            name: target.name.clone(),
            output,
            status,
        });
    }

    let stale: Vec<_> = outcomes
        .iter()
        .filter(|outcome| outcome.status == Status::Stale)
        .map(|outcome| outcome.output.clone())
        .collect();

    if !stale.is_empty() {
        return Err(ExtractError::Stale { paths: stale });
    }

    Ok(outcomes)
}

fn is_current(path: &Utf8Path, contents: &[u8]) -> bool {
    read(path).is_ok_and(|existing| existing == contents)
}

/// Only write the file if its contents differ.
fn write_if_changed(path: &Utf8Path, contents: &[u8]) -> Result<bool, ExtractError> {
    if is_current(path, contents) {
        return Ok(false);
    }

    write(path, contents).map_err(|source| ExtractError::Write {
        path: path.to_owned(),
        source,
    })?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};
    use tempfile::{tempdir, TempDir};

    use super::*;

    struct Project {
        _dir: TempDir,
        config: AbiConfig,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            let abi_dir = root.join("abi");
            fs::create_dir_all(&abi_dir).unwrap();

            Self {
                _dir: dir,
                config: AbiConfig::with_defaults(abi_dir),
            }
        }

        fn write_artifact(&self, target: &AbiTarget, document: &Value) {
            let path = self.config.artifact_path(target);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, serde_json::to_string(document).unwrap()).unwrap();
        }

        fn read_output(&self, target: &AbiTarget) -> String {
            fs::read_to_string(self.config.output_path(target)).unwrap()
        }
    }

    #[test]
    fn test_extracts_both_default_targets() {
        let project = Project::new();
        project.write_artifact(
            &AbiTarget::entry_point(),
            &json!({"abi": [{"type": "function", "name": "foo"}], "bytecode": "0x6080"}),
        );
        project.write_artifact(
            &AbiTarget::dex_manager(),
            &json!({"_format": "hh-sol-artifact-1", "abi": [{"type": "event", "name": "Swap"}]}),
        );

        let outcomes = extract(&project.config, Mode::Write).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.status == Status::Written));
        assert_eq!(
            project.read_output(&AbiTarget::entry_point()),
            "[\n  {\n    \"type\": \"function\",\n    \"name\": \"foo\"\n  }\n]"
        );
        let manager: Value =
            serde_json::from_str(&project.read_output(&AbiTarget::dex_manager())).unwrap();
        assert_eq!(manager, json!([{"type": "event", "name": "Swap"}]));
    }

    #[test]
    fn test_second_run_is_unchanged_and_identical() {
        let project = Project::new();
        for target in AbiTarget::defaults() {
            project.write_artifact(&target, &json!({"abi": []}));
        }

        let _ = extract(&project.config, Mode::Write).unwrap();
        let first = project.read_output(&AbiTarget::entry_point());

        let outcomes = extract(&project.config, Mode::Write).unwrap();

        assert!(outcomes.iter().all(|o| o.status == Status::Unchanged));
        assert_eq!(project.read_output(&AbiTarget::entry_point()), first);
    }

    #[test]
    fn test_missing_first_artifact_writes_nothing() {
        let project = Project::new();
        project.write_artifact(&AbiTarget::dex_manager(), &json!({"abi": []}));

        let err = extract(&project.config, Mode::Write).unwrap_err();

        assert!(
            matches!(
                err,
                ExtractError::Artifact {
                    source: ArtifactError::NotFound { .. },
                    ..
                }
            ),
            "unexpected error: {err:?}"
        );
        for target in AbiTarget::defaults() {
            assert!(!project.config.output_path(&target).exists());
        }
    }

    #[test]
    fn test_manager_without_abi_keeps_entry_point_output() {
        let project = Project::new();
        project.write_artifact(&AbiTarget::entry_point(), &json!({"abi": []}));
        project.write_artifact(&AbiTarget::dex_manager(), &json!({"bytecode": "0x"}));

        let err = extract(&project.config, Mode::Write).unwrap_err();

        assert!(
            matches!(
                err,
                ExtractError::Artifact {
                    ref target,
                    source: ArtifactError::MissingAbi { .. },
                } if target == "dexmanager"
            ),
            "unexpected error: {err:?}"
        );
        assert_eq!(project.read_output(&AbiTarget::entry_point()), "[]");
        assert!(!project
            .config
            .output_path(&AbiTarget::dex_manager())
            .exists());
    }

    #[test]
    fn test_missing_manager_artifact_writes_nothing() {
        let project = Project::new();
        project.write_artifact(&AbiTarget::entry_point(), &json!({"abi": []}));

        let err = extract(&project.config, Mode::Write).unwrap_err();

        assert!(
            matches!(
                err,
                ExtractError::Artifact {
                    ref target,
                    source: ArtifactError::NotFound { .. },
                } if target == "dexmanager"
            ),
            "unexpected error: {err:?}"
        );
        for target in AbiTarget::defaults() {
            assert!(
                !project.config.output_path(&target).exists(),
                "{} should not have been written",
                target.output
            );
        }
    }

    #[test]
    fn test_malformed_manager_artifact_keeps_existing_outputs() {
        let project = Project::new();
        let entry_point = project.config.output_path(&AbiTarget::entry_point());
        fs::write(&entry_point, "previous").unwrap();
        project.write_artifact(
            &AbiTarget::entry_point(),
            &json!({"abi": [{"type": "function", "name": "foo"}]}),
        );
        let manager = project.config.artifact_path(&AbiTarget::dex_manager());
        fs::create_dir_all(manager.parent().unwrap()).unwrap();
        fs::write(&manager, r#"{"abi": [}"#).unwrap();

        let err = extract(&project.config, Mode::Write).unwrap_err();

        assert!(
            matches!(
                err,
                ExtractError::Artifact {
                    source: ArtifactError::Parse { .. },
                    ..
                }
            ),
            "unexpected error: {err:?}"
        );
        assert_eq!(fs::read_to_string(&entry_point).unwrap(), "previous");
        assert!(!project
            .config
            .output_path(&AbiTarget::dex_manager())
            .exists());
    }

    #[test]
    fn test_check_reports_stale_without_writing() {
        let project = Project::new();
        for target in AbiTarget::defaults() {
            project.write_artifact(&target, &json!({"abi": [{"type": "receive"}]}));
        }
        let _ = extract(&project.config, Mode::Write).unwrap();

        let outcomes = extract(&project.config, Mode::Check).unwrap();
        assert!(outcomes.iter().all(|o| o.status == Status::Unchanged));

        project.write_artifact(&AbiTarget::dex_manager(), &json!({"abi": []}));
        let before = project.read_output(&AbiTarget::dex_manager());

        let err = extract(&project.config, Mode::Check).unwrap_err();

        let ExtractError::Stale { paths } = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(
            *paths,
            vec![project.config.output_path(&AbiTarget::dex_manager())]
        );
        assert_eq!(project.read_output(&AbiTarget::dex_manager()), before);
        assert_eq!(
            err.to_string(),
            format!(
                "ABI files are out of date: {}",
                project.config.output_path(&AbiTarget::dex_manager())
            )
        );
    }
}
