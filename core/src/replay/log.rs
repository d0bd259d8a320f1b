//! Input logs: raw [`InputFrame`] records back to back, no header
//!
//! The record count is implied by the file length. A short read means the
//! log is exhausted.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::ReplayError;
use crate::input::{INPUT_FRAME_SIZE, InputFrame};

pub struct InputLogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl InputLogWriter {
    /// Create (or truncate) the log at `path`.
    pub fn create(path: &Path) -> Result<Self, ReplayError> {
        let file = File::create(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, frame: &InputFrame) -> Result<(), ReplayError> {
        self.writer
            .write_all(frame.as_bytes())
            .map_err(|source| ReplayError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Flush buffered records and close the file.
    pub fn finish(mut self) -> Result<(), ReplayError> {
        self.writer.flush().map_err(|source| ReplayError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

pub struct InputLogReader {
    path: PathBuf,
    reader: BufReader<File>,
}

impl InputLogReader {
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        })
    }

    /// Next full record, or `None` at end of log (including a trailing partial record).
    pub fn next_frame(&mut self) -> Result<Option<InputFrame>, ReplayError> {
        let mut record = [0u8; INPUT_FRAME_SIZE];
        let mut filled = 0;
        while filled < INPUT_FRAME_SIZE {
            match self.reader.read(&mut record[filled..]) {
                Ok(0) => return Ok(None),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(ReplayError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }
        Ok(Some(bytemuck::pod_read_unaligned(&record)))
    }
}
