//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot write the archive record: {0}")]
    CsvError(csv::Error),

    #[error("The archiver has not been initialised")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a timestamped csv.
///
/// To implement this trait, the struct shall have an `Archiver` member which
/// shall be setup in the struct's `init` or `new` functions.
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        Self::from_file(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given file, which is truncated.
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = file_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::FileError)?;
        }

        // Create the file if it does not exist
        File::create(file_path.as_ref()).map_err(ArchiveError::FileError)?;

        // Open the file in append mode
        let file = OpenOptions::new()
            .append(true)
            .open(file_path.as_ref())
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    ///
    /// The record must serialise as a flat struct (no nested sequences or
    /// maps), its field names become the CSV header.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::CsvError)?;
                w.flush().map_err(ArchiveError::FileError)?
            }
            None => return Err(ArchiveError::NotInitialised),
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        time_s: f64,
        phase: u64,
        hip_l_deg: f64,
    }

    #[test]
    fn test_archiver_writes_rows() {
        let path = std::env::temp_dir()
            .join("exo_sw_archive_test")
            .join("rows.csv");

        let mut arch = Archiver::from_file(&path).unwrap();
        arch.serialise(Row {
            time_s: 0.0,
            phase: 0,
            hip_l_deg: -6.5,
        })
        .unwrap();
        arch.serialise(Row {
            time_s: 0.001,
            phase: 1,
            hip_l_deg: -6.25,
        })
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time_s,phase,hip_l_deg");
        assert_eq!(lines[2], "0.001,1,-6.25");
    }

    #[test]
    fn test_uninitialised_archiver() {
        let mut arch = Archiver::default();
        match arch.serialise(Row {
            time_s: 0.0,
            phase: 0,
            hip_l_deg: 0.0,
        }) {
            Err(ArchiveError::NotInitialised) => (),
            r => panic!("Expected not initialised, got {:?}", r),
        }
    }
}
