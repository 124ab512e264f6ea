use std::path::{Path, PathBuf};

use crate::grid::EARTH_RADIUS_KM;

pub const DEFAULT_VARIABLE_NAME: &str = "Elevation";

/// Settings for one GeoTIFF to VTI conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Label of the scalar field in the VTI file.
    pub variable_name: String,
    /// Sphere radius used to turn degrees into kilometres. Override for non-Earth bodies.
    pub earth_radius_km: f64,
}

impl ConversionConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            variable_name: DEFAULT_VARIABLE_NAME.to_string(),
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }

    pub fn with_variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = name.into();
        self
    }

    pub fn with_earth_radius_km(mut self, radius_km: f64) -> Self {
        self.earth_radius_km = radius_km;
        self
    }

    /// Same settings for another input, writing `<stem>.vti` into `output_dir`.
    pub fn for_input_in_dir(&self, input_path: &Path, output_dir: &Path) -> Self {
        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        Self {
            input_path: input_path.to_path_buf(),
            output_path: output_dir.join(format!("{}.vti", stem)),
            ..self.clone()
        }
    }
}

/// Settings for one lat/lon CSV to UTM CSV conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvConversionConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl CsvConversionConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }
}
