//! Error and failure handing types

use thiserror::Error;

use csv::Error as CSVError;
use reqwest::Error as ReqwestError;
use rusqlite::Error as SqliteError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError;

/// A `Result` alias where the `Err` case is `genshin_data::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Errors that may occur in the genshin-data crate APIs.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not find the artifact table in the wiki page")]
    MissingArtifactTable,
    #[error("Unrecognised rarity {0:?}")]
    InvalidRarity(String),

    // Passthroughs from other libraries
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    ReqwestError(#[from] ReqwestError),
    #[error(transparent)]
    SerdeJsonError(#[from] SerdeJsonError),
    #[error(transparent)]
    SqliteError(#[from] SqliteError),
    #[error(transparent)]
    CSVError(#[from] CSVError),
    #[error(transparent)]
    IoError(#[from] IoError),
}
