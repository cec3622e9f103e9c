//! Reading Hardhat build artifacts and pulling their `abi` out.
//!
//! The ABI value is opaque here: it is moved out of the parsed artifact and
//! rendered back untouched, with object key order and number literals
//! preserved.

use std::fs::read_to_string;
use std::io::{self, ErrorKind, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Serializer, Value};
use thiserror::Error;

/// Key holding the ABI in a build artifact.
pub const ABI_KEY: &str = "abi";

const INDENT: &[u8] = b"  ";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArtifactError {
    #[error("build artifact not found: {path} (have the contracts been compiled?)")]
    NotFound { path: Utf8PathBuf },

    #[error("failed to read build artifact {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("build artifact {path} is not valid JSON")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("build artifact {path} has no `abi` field")]
    MissingAbi { path: Utf8PathBuf },

    #[error("failed to serialize ABI")]
    Render(#[source] serde_json::Error),
}

/// Reads and parses a build artifact.
pub fn read_artifact(path: &Utf8Path) -> Result<Value, ArtifactError> {
    let content = read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.to_owned(),
            }
        } else {
            ArtifactError::Read {
                path: path.to_owned(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Moves the `abi` value out of a parsed artifact.
///
/// A root that is not an object has no `abi` either.
pub fn take_abi(path: &Utf8Path, mut document: Value) -> Result<Value, ArtifactError> {
    document
        .as_object_mut()
        .and_then(|object| object.remove(ABI_KEY))
        .ok_or_else(|| ArtifactError::MissingAbi {
            path: path.to_owned(),
        })
}

/// Loads the ABI of the build artifact at `path`.
pub fn load_abi(path: &Utf8Path) -> Result<Value, ArtifactError> {
    let document = read_artifact(path)?;

    take_abi(path, document)
}

/// Pretty printer writing every character outside printable ASCII as a
/// `\uXXXX` escape, surrogate pairs included.
#[derive(Debug)]
struct AbiFormatter {
    pretty: PrettyFormatter<'static>,
}

impl AbiFormatter {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for AbiFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;

        for (index, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }

            writer.write_all(&fragment.as_bytes()[start..index])?;

            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }

            start = index.saturating_add(ch.len_utf8());
        }

        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Renders an ABI the way it is stored on disk: 2-space indentation, ASCII
/// only, and no trailing newline.
pub fn render_abi(abi: &Value) -> Result<Vec<u8>, ArtifactError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, AbiFormatter::new());

    abi.serialize(&mut serializer).map_err(ArtifactError::Render)?;

    Ok(buf)
}
