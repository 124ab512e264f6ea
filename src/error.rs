use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid raster {path:?}: {reason}")]
    InvalidRaster { path: PathBuf, reason: String },

    #[error(
        "raster of {width}x{height} pixels is too small, at least 2x2 is required to derive spacing"
    )]
    DegenerateGrid { width: usize, height: usize },

    #[error("grid needs {expected} values, raster holds {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("coordinate out of UTM range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },

    #[error(
        "invalid variable name {0:?}: must be non-empty ASCII without '\"', '<', '>' or '&'"
    )]
    InvalidVariableName(String),

    #[error("payload of {0} values does not fit a 32-bit byte count")]
    PayloadTooLarge(usize),

    #[error("invalid VTI file: {0}")]
    InvalidVti(String),
}
