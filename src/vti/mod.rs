//! VTK XML ImageData (`.vti`) files with a single raw appended `Float32` array.
//!
//! Layout of a file written by [`VtiWriter`]:
//!
//! ```text
//! <?xml version="1.0"?>
//! <VTKFile type="ImageData" version="0.1" byte_order="LittleEndian">
//! <ImageData WholeExtent="0 nx-1 0 ny-1 0 nz-1" Origin="ox oy oz" Spacing="dx dy dz">
//! <Piece Extent="0 nx-1 0 ny-1 0 nz-1">
//! <PointData Scalars="NAME">
//! <DataArray type="Float32" Name="NAME" format="appended" offset="0" />
//! </PointData>
//! <CellData>
//! </CellData>
//! </Piece>
//! </ImageData>
//! <AppendedData encoding="raw">
//! _<i32 byte count><f32 values...>
//! </AppendedData>
//! </VTKFile>
//! ```
//!
//! The byte count is `nx*ny*nz*4 + 4`, and the values are the raster pixels
//! mirrored left to right within each row.

pub mod reader;
pub mod writer;

pub use reader::VtiReader;
pub use writer::VtiWriter;

use crate::error::{Error, Result};
use crate::model::{PhysicalGrid, RasterGrid};

pub(crate) const APPENDED_DATA_TAG: &str = "<AppendedData encoding=\"raw\">";
pub(crate) const RAW_MARKER: u8 = b'_';
pub(crate) const TRAILER: &str = "\n</AppendedData>\n</VTKFile>\n";

const BYTES_PER_INT: usize = 4;
const BYTES_PER_FLOAT: usize = 4;
const COMPONENTS: usize = 1;

/// A complete ImageData document: geometry, scalar name and payload values.
#[derive(Debug, Clone, PartialEq)]
pub struct VtiDocument {
    pub grid: PhysicalGrid,
    pub variable_name: String,
    pub values: Vec<f32>,
}

impl VtiDocument {
    /// Builds the document for `raster`, applying the left-right flip.
    pub fn from_raster(
        raster: &RasterGrid,
        grid: PhysicalGrid,
        variable_name: &str,
    ) -> Result<Self> {
        validate_variable_name(variable_name)?;
        let values = raster.flipped_horizontally();
        if values.len() != grid.point_count() {
            return Err(Error::ValueCountMismatch {
                expected: grid.point_count(),
                actual: values.len(),
            });
        }
        let doc = Self {
            grid,
            variable_name: variable_name.to_string(),
            values,
        };
        doc.byte_count()?;
        Ok(doc)
    }

    /// Value of the length prefix: payload bytes plus the 4 bytes of the prefix itself.
    pub fn byte_count(&self) -> Result<i32> {
        let n = self.grid.point_count();
        n.checked_mul(COMPONENTS * BYTES_PER_FLOAT)
            .and_then(|bytes| bytes.checked_add(BYTES_PER_INT))
            .and_then(|bytes| i32::try_from(bytes).ok())
            .ok_or(Error::PayloadTooLarge(n))
    }

    /// Everything up to and including the `_` raw data marker.
    pub fn header(&self) -> String {
        let g = &self.grid;
        let extent = g.extent();
        let name = &self.variable_name;

        let mut header = String::new();
        header.push_str("<?xml version=\"1.0\"?>\n");
        header.push_str("<VTKFile type=\"ImageData\" version=\"0.1\" byte_order=\"LittleEndian\">\n");
        header.push_str(&format!(
            "<ImageData WholeExtent=\"{}\" Origin=\"{:.6} {:.6} {:.6}\" Spacing=\"{:.6} {:.6} {:.6}\">\n",
            extent, g.ox, g.oy, g.oz, g.dx, g.dy, g.dz
        ));
        header.push_str(&format!("<Piece Extent=\"{}\">\n", extent));
        header.push_str(&format!("<PointData Scalars=\"{}\">\n", name));
        header.push_str(&format!(
            "<DataArray type=\"Float32\" Name=\"{}\" format=\"appended\" offset=\"0\" />\n",
            name
        ));
        header.push_str("</PointData>\n");
        header.push_str("<CellData>\n");
        header.push_str("</CellData>\n");
        header.push_str("</Piece>\n");
        header.push_str("</ImageData>\n");
        header.push_str(APPENDED_DATA_TAG);
        header.push('\n');
        header.push(RAW_MARKER as char);
        header
    }

    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

pub fn validate_variable_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.is_ascii()
        && !name.chars().any(|c| matches!(c, '"' | '<' | '>' | '&') || c.is_ascii_control());
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidVariableName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn sample_grid() -> PhysicalGrid {
        PhysicalGrid {
            nx: 2,
            ny: 2,
            nz: 1,
            dx: 111.19492664455873,
            dy: 111.19492664455873,
            dz: 1.0,
            ox: 166021.443080,
            oy: 0.0,
            oz: 0.0,
            width_km: 111.19492664455873,
            height_km: 111.19492664455873,
        }
    }

    fn sample_raster() -> RasterGrid {
        RasterGrid {
            width: 2,
            height: 2,
            band_count: 1,
            values: vec![1.0, 2.0, 3.0, 4.0],
            bounds: BoundingBox {
                left: 0.0,
                right: 1.0,
                top: 1.0,
                bottom: 0.0,
            },
            resolution: (0.5, -0.5),
            no_data: None,
        }
    }

    #[test]
    fn test_header_layout() {
        let doc = VtiDocument::from_raster(&sample_raster(), sample_grid(), "Elevation").unwrap();
        let expected = concat!(
            "<?xml version=\"1.0\"?>\n",
            "<VTKFile type=\"ImageData\" version=\"0.1\" byte_order=\"LittleEndian\">\n",
            "<ImageData WholeExtent=\"0 1 0 1 0 0\" Origin=\"166021.443080 0.000000 0.000000\" Spacing=\"111.194927 111.194927 1.000000\">\n",
            "<Piece Extent=\"0 1 0 1 0 0\">\n",
            "<PointData Scalars=\"Elevation\">\n",
            "<DataArray type=\"Float32\" Name=\"Elevation\" format=\"appended\" offset=\"0\" />\n",
            "</PointData>\n",
            "<CellData>\n",
            "</CellData>\n",
            "</Piece>\n",
            "</ImageData>\n",
            "<AppendedData encoding=\"raw\">\n",
            "_",
        );
        assert_eq!(doc.header(), expected);
    }

    #[test]
    fn test_byte_count_includes_prefix() {
        let doc = VtiDocument::from_raster(&sample_raster(), sample_grid(), "Elevation").unwrap();
        assert_eq!(doc.byte_count().unwrap(), 20);
        assert_eq!(doc.values, vec![2.0, 1.0, 4.0, 3.0]);
    }

    #[test]
    fn test_payload_too_large() {
        let mut grid = sample_grid();
        grid.nx = 1 << 15;
        grid.ny = 1 << 15;
        let doc = VtiDocument {
            grid,
            variable_name: "Elevation".to_string(),
            values: Vec::new(),
        };
        assert!(matches!(doc.byte_count(), Err(Error::PayloadTooLarge(_))));
    }

    #[test]
    fn test_mismatched_value_count() {
        let mut grid = sample_grid();
        grid.nz = 2;
        let result = VtiDocument::from_raster(&sample_raster(), grid, "Elevation");
        assert!(matches!(
            result,
            Err(Error::ValueCountMismatch {
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_variable_names() {
        assert!(validate_variable_name("Elevation").is_ok());
        assert!(validate_variable_name("elev_m").is_ok());
        assert!(validate_variable_name("").is_err());
        assert!(validate_variable_name("a\"b").is_err());
        assert!(validate_variable_name("<x>").is_err());
        assert!(validate_variable_name("höhe").is_err());
    }
}
