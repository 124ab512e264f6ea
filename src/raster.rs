use gdal::raster::Buffer;
use gdal::Dataset;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{BoundingBox, RasterGrid};

#[derive(Default)]
pub struct GeoTiffReader {}

impl GeoTiffReader {
    pub fn new() -> Self {
        Self {}
    }

    /// Opens `path` and loads every band into memory as `f32`.
    pub fn read(&self, path: &Path) -> Result<RasterGrid> {
        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count();

        if band_count == 0 {
            return Err(Error::InvalidRaster {
                path: path.to_path_buf(),
                reason: "no raster bands".to_string(),
            });
        }
        if band_count > 1 {
            tracing::warn!(
                "{:?} has {} bands, all of them are written as stacked z-slices",
                path,
                band_count
            );
        }

        let gt = dataset.geo_transform().map_err(|e| Error::InvalidRaster {
            path: path.to_path_buf(),
            reason: format!("missing geotransform: {}", e),
        })?;
        if gt[2] != 0.0 || gt[4] != 0.0 {
            tracing::warn!("{:?} has a rotated geotransform, rotation is ignored", path);
        }
        let bounds = BoundingBox::from_geo_transform(&gt, width, height);

        tracing::info!(
            "Reading raster {:?}: {} x {} pixels, {} band(s)",
            path,
            width,
            height,
            band_count
        );

        let mut values = Vec::with_capacity(width * height * band_count);
        let mut no_data = None;
        for index in 1..=band_count {
            let band = dataset.rasterband(index)?;
            if index == 1 {
                no_data = band.no_data_value();
            }
            let buffer: Buffer<f32> = band.read_as((0, 0), (width, height), (width, height), None)?;
            values.extend_from_slice(buffer.data());
        }

        Ok(RasterGrid {
            width,
            height,
            band_count,
            values,
            bounds,
            resolution: (gt[1], gt[5]),
            no_data,
        })
    }
}
