use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use crate::config::{ConversionConfig, CsvConversionConfig};
use crate::csv_utm;
use crate::error::Result;
use crate::grid::geo_origin;
use crate::model::{GeoOrigin, PhysicalGrid};
use crate::raster::GeoTiffReader;
use crate::utm::{Projector, UtmProjector};
use crate::vti::{VtiDocument, VtiWriter};

/// Summary of a finished GeoTIFF to VTI conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub origin: GeoOrigin,
    pub grid: PhysicalGrid,
    pub elevation_range: Option<(f32, f32)>,
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File to convert:   {}", self.input_path.display())?;
        writeln!(f, "File to create:    {}", self.output_path.display())?;
        writeln!(
            f,
            "Origin:            [UTM Easting: {:.6}, UTM Northing: {:.6}, Elev: {:.6}] (zone {}{})",
            self.origin.easting(),
            self.origin.northing(),
            self.grid.oz,
            self.origin.utm.zone,
            self.origin.utm.band
        )?;
        writeln!(f, "Data width:        {} km", self.grid.width_km)?;
        writeln!(f, "Data height:       {} km", self.grid.height_km)?;
        match self.elevation_range {
            Some((min, max)) => {
                writeln!(f, "Min elevation:     {}", min)?;
                write!(f, "Max elevation:     {}", max)
            }
            None => write!(f, "Min/Max elevation: no valid data"),
        }
    }
}

/// Summary of a finished CSV conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub points_written: usize,
}

pub fn convert_geotiff(config: &ConversionConfig) -> Result<ConversionReport> {
    convert_geotiff_with(config, &UtmProjector::new())
}

/// Reads the raster, derives the grid and writes the VTI file.
///
/// Everything that can fail on the input side happens before the output file
/// is created.
pub fn convert_geotiff_with<P: Projector + ?Sized>(
    config: &ConversionConfig,
    projector: &P,
) -> Result<ConversionReport> {
    tracing::info!("Converting {:?} -> {:?}", config.input_path, config.output_path);

    let raster = GeoTiffReader::new().read(&config.input_path)?;
    let origin = geo_origin(&raster, projector)?;
    let grid = PhysicalGrid::from_origin(&raster, config.earth_radius_km, &origin)?;
    let doc = VtiDocument::from_raster(&raster, grid, &config.variable_name)?;

    VtiWriter::new().write(&doc, &config.output_path)?;

    let report = ConversionReport {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        origin,
        grid,
        elevation_range: raster.elevation_range(),
    };
    tracing::info!("Written VTI: {:?}", config.output_path);

    Ok(report)
}

pub fn convert_csv(config: &CsvConversionConfig) -> Result<CsvReport> {
    convert_csv_with(config, &UtmProjector::new())
}

pub fn convert_csv_with<P: Projector + ?Sized>(
    config: &CsvConversionConfig,
    projector: &P,
) -> Result<CsvReport> {
    tracing::info!("Converting {:?} -> {:?}", config.input_path, config.output_path);

    let file = File::open(&config.input_path)?;
    let points = csv_utm::read_points(BufReader::new(file))?;
    let projected = csv_utm::project_points(&points, projector)?;

    let file = File::create(&config.output_path)?;
    let mut writer = BufWriter::new(file);
    csv_utm::write_points(&mut writer, &projected)?;
    writer.flush()?;

    tracing::info!("Written {} points to {:?}", projected.len(), config.output_path);

    Ok(CsvReport {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        points_written: projected.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::raster::test_support::{gtiff_available, write_test_geotiff};
    use crate::vti::VtiReader;
    use crate::utm::UtmCoord;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingProjector {
        calls: Cell<usize>,
    }

    impl Projector for CountingProjector {
        fn project(&self, lat: f64, lon: f64) -> Result<UtmCoord> {
            self.calls.set(self.calls.get() + 1);
            UtmProjector.project(lat, lon)
        }
    }

    #[test]
    fn test_convert_geotiff() {
        if !gtiff_available() {
            eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("dem.tif");
        let output = temp_dir.path().join("dem.vti");
        write_test_geotiff(
            &input,
            3,
            2,
            [-118.0, 0.01, 0.0, 34.02, 0.0, -0.01],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            None,
        );

        let config = ConversionConfig::new(&input, &output).with_variable_name("Height");
        let report = convert_geotiff(&config).unwrap();

        assert_eq!(report.elevation_range, Some((1.0, 6.0)));
        let corner = UtmProjector.project(report.origin.bottom, -118.0).unwrap();
        assert_eq!(report.origin.utm, corner);
        assert!((report.origin.bottom - 34.0).abs() < 1e-9);

        let doc = VtiReader::new().read(&output).unwrap();
        assert_eq!(doc.variable_name, "Height");
        assert_eq!((doc.grid.nx, doc.grid.ny, doc.grid.nz), (3, 2, 1));
        assert_eq!(doc.values, vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);

        let summary = report.to_string();
        assert!(summary.contains("Min elevation:     1"));
        assert!(summary.contains("Max elevation:     6"));
    }

    #[test]
    fn test_origin_and_grid_share_one_projection() {
        if !gtiff_available() {
            eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("dem.tif");
        let output = temp_dir.path().join("dem.vti");
        write_test_geotiff(
            &input,
            2,
            2,
            [5.0, 0.5, 0.0, 45.0, 0.0, -0.5],
            vec![1.0, 2.0, 3.0, 4.0],
            None,
        );

        let projector = CountingProjector::default();
        let report =
            convert_geotiff_with(&ConversionConfig::new(&input, &output), &projector).unwrap();

        assert_eq!(projector.calls.get(), 1);
        assert_eq!(report.grid.ox, report.origin.easting());
        assert_eq!(report.grid.oy, report.origin.northing());
    }

    #[test]
    fn test_degenerate_raster_creates_no_output() {
        if !gtiff_available() {
            eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("strip.tif");
        let output = temp_dir.path().join("strip.vti");
        write_test_geotiff(
            &input,
            1,
            4,
            [10.0, 0.1, 0.0, 50.0, 0.0, -0.1],
            vec![1.0, 2.0, 3.0, 4.0],
            None,
        );

        let result = convert_geotiff(&ConversionConfig::new(&input, &output));
        assert!(matches!(
            result,
            Err(Error::DegenerateGrid {
                width: 1,
                height: 4
            })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_creates_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.vti");
        let config = ConversionConfig::new(temp_dir.path().join("missing.tif"), &output);

        assert!(convert_geotiff(&config).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_convert_csv() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("trace.csv");
        let output = temp_dir.path().join("trace_utm.csv");
        std::fs::write(
            &input,
            "Points, Latitude, Longitude\n1,34.0,-118.0\n2,,-118.1\n3,34.2,-118.2\n",
        )
        .unwrap();

        let report = convert_csv(&CsvConversionConfig::new(&input, &output)).unwrap();
        assert_eq!(report.points_written, 2);

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Point, Easting, Northing");
        assert!(lines[1].starts_with("1.000000, "));
        assert!(lines[2].starts_with("3.000000, "));

        let first = UtmProjector.project(34.0, -118.0).unwrap();
        assert_eq!(
            lines[1],
            format!("1.000000, {:.6}, {:.6}", first.easting, first.northing)
        );
    }

    #[test]
    fn test_csv_out_of_range_creates_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("polar.csv");
        let output = temp_dir.path().join("polar_utm.csv");
        std::fs::write(&input, "Points,Latitude,Longitude\n1,88.0,10.0\n").unwrap();

        let result = convert_csv(&CsvConversionConfig::new(&input, &output));
        assert!(matches!(result, Err(Error::OutOfRange { .. })));
        assert!(!output.exists());
    }
}
