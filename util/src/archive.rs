//! Struct archiving functionality
//!
//! An [`Archiver`] writes a stream of serialisable records into a CSV file, one row per record,
//! with the header taken from the record's field names. Records must be flat: every field a
//! scalar or an `Option` of one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Cannot write to the archive: {0}")]
    WriteError(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver writing to the given file inside the session directory.
    pub fn from_session(session: &Session, file_name: &str) -> Result<Self, ArchiveError> {
        Self::from_path(session.file_path(file_name))
    }

    /// Create a new archiver writing to the given path, truncating any existing file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(ArchiveError::CreateError)?;

        let writer = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer })
    }

    /// Serialise a record into the archive.
    ///
    /// The archive is flushed after every record so a crashed run still leaves its history.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        self.writer.serialize(record)?;
        self.writer.flush().map_err(csv::Error::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        tick: u64,
        value: f64,
        flag: bool,
        latch: Option<f64>,
    }

    #[test]
    fn test_archive_rows() {
        let path = std::env::temp_dir().join(format!("util_archive_{}.csv", std::process::id()));

        let mut arch = Archiver::from_path(&path).unwrap();
        arch.serialise(Row {
            tick: 1,
            value: 2.5,
            flag: true,
            latch: None,
        })
        .unwrap();
        arch.serialise(Row {
            tick: 2,
            value: -1.0,
            flag: false,
            latch: Some(730.0),
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["tick,value,flag,latch", "1,2.5,true,", "2,-1.0,false,730.0"]);
    }
}
