use std::io::{Read, Write};

use crate::error::Result;
use crate::utm::Projector;

pub const OUTPUT_HEADER: &str = "Point, Easting, Northing";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonPoint {
    pub id: f64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmPoint {
    pub id: f64,
    pub easting: f64,
    pub northing: f64,
}

fn numeric_field(record: &csv::ByteRecord, index: usize) -> Option<f64> {
    std::str::from_utf8(record.get(index)?)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
}

/// Reads `Point, Latitude, Longitude` rows after a header line.
///
/// Rows with a missing, non-numeric, NaN or non-UTF-8 value in any of the three
/// columns are skipped. Columns past the third are ignored.
pub fn read_points<R: Read>(reader: R) -> Result<Vec<LatLonPoint>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (row, record) in csv_reader.byte_records().enumerate() {
        let record = record?;
        let parsed = (
            numeric_field(&record, 0),
            numeric_field(&record, 1),
            numeric_field(&record, 2),
        );
        match parsed {
            (Some(id), Some(lat), Some(lon)) => points.push(LatLonPoint { id, lat, lon }),
            _ => tracing::debug!("Skipping row {}: {:?}", row + 1, record),
        }
    }

    Ok(points)
}

pub fn project_points<P: Projector + ?Sized>(
    points: &[LatLonPoint],
    projector: &P,
) -> Result<Vec<UtmPoint>> {
    points
        .iter()
        .map(|p| {
            let utm = projector.project(p.lat, p.lon)?;
            Ok(UtmPoint {
                id: p.id,
                easting: utm.easting,
                northing: utm.northing,
            })
        })
        .collect()
}

pub fn write_points<W: Write>(writer: &mut W, points: &[UtmPoint]) -> Result<()> {
    writeln!(writer, "{}", OUTPUT_HEADER)?;
    for p in points {
        writeln!(writer, "{:.6}, {:.6}, {:.6}", p.id, p.easting, p.northing)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utm::{UtmCoord, UtmProjector};

    struct ScaleProjector;

    impl Projector for ScaleProjector {
        fn project(&self, lat: f64, lon: f64) -> Result<UtmCoord> {
            Ok(UtmCoord {
                easting: lon * 10.0,
                northing: lat * 10.0,
                zone: 1,
                band: 'N',
            })
        }
    }

    #[test]
    fn test_rows_with_missing_fields_are_dropped() {
        let input = "Points, Latitude, Longitude\n1,34.0,-118.0\n2,,-118.1\n3,34.2,-118.2\n";
        let points = read_points(input.as_bytes()).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, 1.0);
        assert_eq!(points[1].id, 3.0);
        assert_eq!(points[1].lat, 34.2);
    }

    #[test]
    fn test_non_numeric_and_nan_rows_are_dropped() {
        let input = "Point,Latitude,Longitude\n1,abc,2\nx,1,2\n3,nan,2\n4,1\n5,1.5,2.5,\n";
        let points = read_points(input.as_bytes()).unwrap();

        assert_eq!(
            points,
            vec![LatLonPoint {
                id: 5.0,
                lat: 1.5,
                lon: 2.5
            }]
        );
    }

    #[test]
    fn test_invalid_utf8_row_is_dropped() {
        let input: &[u8] = b"Points,Latitude,Longitude\n\
            1,34.0,-118.0\n\
            2,\xff\xfe,-118.1\n\
            3,34.2,-118.2\n";
        let points = read_points(input).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, 1.0);
        assert_eq!(points[1].id, 3.0);
    }

    #[test]
    fn test_output_format() {
        let points = vec![
            LatLonPoint {
                id: 1.0,
                lat: 1.5,
                lon: -2.0,
            },
            LatLonPoint {
                id: 7.0,
                lat: 0.0,
                lon: 0.25,
            },
        ];
        let projected = project_points(&points, &ScaleProjector).unwrap();

        let mut out = Vec::new();
        write_points(&mut out, &projected).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Point, Easting, Northing\n\
             1.000000, -20.000000, 15.000000\n\
             7.000000, 2.500000, 0.000000\n"
        );
    }

    #[test]
    fn test_projection_error_propagates() {
        let points = vec![LatLonPoint {
            id: 1.0,
            lat: 89.0,
            lon: 0.0,
        }];
        assert!(project_points(&points, &UtmProjector).is_err());
    }
}
