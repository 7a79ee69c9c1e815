//! Output sink: display and/or persist a generation result.
//!
//! Files are plain UTF-8 text. Timestamped names carry the channel, the mode
//! and the UTC time at seconds resolution; two results for the same channel
//! and mode in the same second get the same name. Such a collision is
//! reported as an error rather than overwriting the earlier file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::types::GenerationResult;
use crate::error::DealError;

/// Prefix of timestamped output files.
pub const FILE_PREFIX: &str = "dealcloser";

/// UTC timestamp layout used in timestamped file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// How output files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// `<channel>.txt`, replaced on every run.
    Channel,
    /// `dealcloser_<channel>_<mode>_<UTC timestamp>.txt`, never replaced.
    Timestamped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub dir: PathBuf,
    pub naming: FileNaming,
}

/// Where a result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Display,
    File(FileTarget),
    Both(FileTarget),
}

/// What the sink did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub displayed: bool,
    pub path: Option<PathBuf>,
}

/// File name for `result` under `naming`.
pub fn file_name(result: &GenerationResult, naming: FileNaming) -> String {
    match naming {
        FileNaming::Channel => format!("{}.txt", result.channel),
        FileNaming::Timestamped => format!(
            "{FILE_PREFIX}_{}_{}_{}.txt",
            result.channel,
            result.source_mode,
            result.generated_at.format(TIMESTAMP_FORMAT)
        ),
    }
}

/// Sink writing displayed results to `W` (stdout in the CLI, unless JSON
/// output replaces the plain text).
pub struct OutputSink<W> {
    display: W,
}

impl<W: Write> OutputSink<W> {
    pub fn new(display: W) -> Self {
        Self { display }
    }

    pub fn into_inner(self) -> W {
        self.display
    }

    pub fn persist(
        &mut self,
        result: &GenerationResult,
        destination: &Destination,
    ) -> Result<Receipt, DealError> {
        let (display, target) = match destination {
            Destination::Display => (true, None),
            Destination::File(target) => (false, Some(target)),
            Destination::Both(target) => (true, Some(target)),
        };

        let path = match target {
            Some(target) => Some(write_file(result, target)?),
            None => None,
        };
        if display {
            writeln!(self.display, "{}", result.text).map_err(|source| DealError::Output {
                path: PathBuf::from("<display>"),
                source,
            })?;
        }
        Ok(Receipt {
            displayed: display,
            path,
        })
    }
}

fn write_file(result: &GenerationResult, target: &FileTarget) -> Result<PathBuf, DealError> {
    fs::create_dir_all(&target.dir).map_err(|source| DealError::Output {
        path: target.dir.clone(),
        source,
    })?;
    let path = target.dir.join(file_name(result, target.naming));
    debug!(path = %path.display(), naming = ?target.naming, "writing result");

    let written = match target.naming {
        FileNaming::Channel => fs::write(&path, result.text.as_bytes()),
        FileNaming::Timestamped => write_new(&path, result.text.as_bytes()),
    };
    written.map_err(|source| DealError::Output {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), channel = %result.channel, "draft written");
    Ok(path)
}

fn write_new(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents)
}
