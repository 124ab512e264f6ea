use crate::error::{Error, Result};
use crate::model::{GeoOrigin, PhysicalGrid, RasterGrid};
use crate::utm::Projector;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn degrees_to_km(degrees: f64, radius_km: f64) -> f64 {
    degrees * radius_km * (std::f64::consts::PI / 180.0)
}

/// Projects the lower-left corner of the raster.
pub fn geo_origin<P: Projector + ?Sized>(raster: &RasterGrid, projector: &P) -> Result<GeoOrigin> {
    let bottom = raster.bounds.bottom;
    let left = raster.bounds.left;
    let utm = projector.project(bottom, left)?;
    Ok(GeoOrigin { bottom, left, utm })
}

fn check_dimensions(raster: &RasterGrid) -> Result<()> {
    if raster.width < 2 || raster.height < 2 {
        return Err(Error::DegenerateGrid {
            width: raster.width,
            height: raster.height,
        });
    }
    Ok(())
}

impl PhysicalGrid {
    /// Derives the VTI grid geometry from a raster, projecting its lower-left
    /// corner with `projector`.
    ///
    /// Rasters narrower than two pixels in either direction are rejected
    /// before anything is projected.
    pub fn from_raster<P: Projector + ?Sized>(
        raster: &RasterGrid,
        earth_radius_km: f64,
        projector: &P,
    ) -> Result<Self> {
        check_dimensions(raster)?;
        let origin = geo_origin(raster, projector)?;
        Self::from_origin(raster, earth_radius_km, &origin)
    }

    /// Derives the VTI grid geometry from a raster whose corner is already
    /// projected.
    ///
    /// Extents are converted with a small-angle arc length on a sphere of
    /// `earth_radius_km`. No cos(latitude) factor is applied to the east-west
    /// extent, so widths are overstated away from the equator. Spacing is in
    /// kilometres while the origin is in UTM metres.
    pub fn from_origin(
        raster: &RasterGrid,
        earth_radius_km: f64,
        origin: &GeoOrigin,
    ) -> Result<Self> {
        check_dimensions(raster)?;
        let (nx, ny, nz) = (raster.width, raster.height, raster.band_count);

        let width_km = degrees_to_km(raster.bounds.width_deg(), earth_radius_km);
        let height_km = degrees_to_km(raster.bounds.height_deg(), earth_radius_km);

        let dx = width_km / (nx - 1) as f64;
        let dy = height_km / (ny - 1) as f64;
        let dz = 1.0;

        tracing::debug!(
            "Physical grid: n=({}, {}, {}) d=({}, {}, {}) origin=({}, {})",
            nx,
            ny,
            nz,
            dx,
            dy,
            dz,
            origin.easting(),
            origin.northing()
        );

        Ok(PhysicalGrid {
            nx,
            ny,
            nz,
            dx,
            dy,
            dz,
            ox: origin.easting(),
            oy: origin.northing(),
            oz: 0.0,
            width_km,
            height_km,
        })
    }
}
