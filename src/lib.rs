pub mod config;
pub mod csv_utm;
pub mod error;
pub mod grid;
pub mod model;
pub mod pipeline;
pub mod raster;
pub mod utm;
pub mod vti;

pub use config::{ConversionConfig, CsvConversionConfig};
pub use error::{Error, Result};
pub use model::{BoundingBox, GeoOrigin, PhysicalGrid, RasterGrid};
pub use pipeline::{convert_csv, convert_geotiff, ConversionReport, CsvReport};
pub use raster::GeoTiffReader;
pub use utm::{Projector, UtmCoord, UtmProjector};
pub use vti::{VtiDocument, VtiReader, VtiWriter};
