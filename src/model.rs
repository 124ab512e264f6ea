use crate::utm::UtmCoord;

/// Geographic extent of a raster in decimal degrees, as reported by its geotransform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BoundingBox {
    /// Bounds of a `width` x `height` raster under a north-up GDAL geotransform.
    /// Rotation terms are ignored.
    pub fn from_geo_transform(gt: &[f64; 6], width: usize, height: usize) -> Self {
        let left = gt[0];
        let top = gt[3];
        Self {
            left,
            right: left + gt[1] * width as f64,
            top,
            bottom: top + gt[5] * height as f64,
        }
    }

    pub fn width_deg(&self) -> f64 {
        (self.right - self.left).abs()
    }

    pub fn height_deg(&self) -> f64 {
        (self.top - self.bottom).abs()
    }
}

/// Decoded GeoTIFF content.
///
/// `values` holds `band_count` bands one after the other, each band stored
/// row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub values: Vec<f32>,
    pub bounds: BoundingBox,
    pub resolution: (f64, f64),
    pub no_data: Option<f64>,
}

impl RasterGrid {
    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn point_count(&self) -> usize {
        self.width * self.height * self.band_count
    }

    /// Smallest and largest value, ignoring NaN and the band's nodata value.
    /// `None` when no valid value is present.
    pub fn elevation_range(&self) -> Option<(f32, f32)> {
        let mut min_elevation = f32::INFINITY;
        let mut max_elevation = f32::NEG_INFINITY;

        for &value in &self.values {
            if value.is_nan() || self.no_data.is_some_and(|nd| value as f64 == nd) {
                continue;
            }
            min_elevation = min_elevation.min(value);
            max_elevation = max_elevation.max(value);
        }

        if min_elevation > max_elevation {
            None
        } else {
            Some((min_elevation, max_elevation))
        }
    }

    /// Pixel values mirrored left to right, row by row and band by band.
    pub fn flipped_horizontally(&self) -> Vec<f32> {
        let mut flipped = self.values.clone();
        if self.width > 0 {
            for row in flipped.chunks_exact_mut(self.width) {
                row.reverse();
            }
        }
        flipped
    }
}

/// Lower-left corner of a raster together with its UTM projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoOrigin {
    pub bottom: f64,
    pub left: f64,
    pub utm: UtmCoord,
}

impl GeoOrigin {
    pub fn easting(&self) -> f64 {
        self.utm.easting
    }

    pub fn northing(&self) -> f64 {
        self.utm.northing
    }
}

/// Point counts, spacing and origin of the VTI grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalGrid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub ox: f64,
    pub oy: f64,
    pub oz: f64,
    pub width_km: f64,
    pub height_km: f64,
}

impl PhysicalGrid {
    pub fn point_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// `"0 {nx-1} 0 {ny-1} 0 {nz-1}"`
    pub fn extent(&self) -> String {
        format!(
            "0 {} 0 {} 0 {}",
            self.nx.saturating_sub(1),
            self.ny.saturating_sub(1),
            self.nz.saturating_sub(1)
        )
    }
}
