use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use super::{VtiDocument, APPENDED_DATA_TAG, RAW_MARKER, TRAILER};
use crate::error::{Error, Result};
use crate::model::PhysicalGrid;

/// Reads `.vti` files with one raw appended `Float32` point array, as written by
/// [`super::VtiWriter`].
#[derive(Default)]
pub struct VtiReader {}

#[derive(Default)]
struct HeaderFields {
    byte_order: Option<String>,
    whole_extent: Option<String>,
    origin: Option<String>,
    spacing: Option<String>,
    scalars: Option<String>,
    array_name: Option<String>,
    array_type: Option<String>,
    array_format: Option<String>,
    array_offset: Option<String>,
}

impl VtiReader {
    pub fn new() -> Self {
        Self {}
    }

    pub fn read(&self, path: &Path) -> Result<VtiDocument> {
        let bytes = std::fs::read(path)?;
        tracing::debug!("Read {} bytes from {:?}", bytes.len(), path);
        self.parse(&bytes)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<VtiDocument> {
        let tag = APPENDED_DATA_TAG.as_bytes();
        let tag_pos = bytes
            .windows(tag.len())
            .position(|w| w == tag)
            .ok_or_else(|| invalid("no raw AppendedData section"))?;

        let mut marker_pos = tag_pos + tag.len();
        while marker_pos < bytes.len() && bytes[marker_pos].is_ascii_whitespace() {
            marker_pos += 1;
        }
        if bytes.get(marker_pos) != Some(&RAW_MARKER) {
            return Err(invalid("missing '_' marker before appended data"));
        }

        let header = std::str::from_utf8(&bytes[..marker_pos])
            .map_err(|e| invalid(format!("header is not UTF-8: {}", e)))?;
        let fields = parse_header(header)?;

        if fields.byte_order.as_deref() != Some("LittleEndian") {
            return Err(invalid(format!(
                "unsupported byte_order {:?}",
                fields.byte_order
            )));
        }
        if fields.array_type.as_deref() != Some("Float32") {
            return Err(invalid(format!(
                "unsupported DataArray type {:?}",
                fields.array_type
            )));
        }
        if fields.array_format.as_deref() != Some("appended") {
            return Err(invalid(format!(
                "unsupported DataArray format {:?}",
                fields.array_format
            )));
        }
        if fields.array_offset.as_deref() != Some("0") {
            return Err(invalid(format!(
                "unsupported DataArray offset {:?}",
                fields.array_offset
            )));
        }

        let variable_name = fields
            .array_name
            .clone()
            .ok_or_else(|| invalid("DataArray has no Name"))?;
        if let Some(scalars) = &fields.scalars {
            if scalars != &variable_name {
                tracing::warn!(
                    "PointData Scalars {:?} differs from DataArray Name {:?}",
                    scalars,
                    variable_name
                );
            }
        }

        let extent = parse_numbers::<usize>(required(&fields.whole_extent, "WholeExtent")?, 6)?;
        let origin = parse_numbers::<f64>(required(&fields.origin, "Origin")?, 3)?;
        let spacing = parse_numbers::<f64>(required(&fields.spacing, "Spacing")?, 3)?;

        if extent[0] != 0 || extent[2] != 0 || extent[4] != 0 {
            return Err(invalid("only extents starting at 0 are supported"));
        }
        let points_along = |upper: usize| {
            upper
                .checked_add(1)
                .ok_or_else(|| invalid(format!("extent {} is too large", upper)))
        };
        let (nx, ny, nz) = (
            points_along(extent[1])?,
            points_along(extent[3])?,
            points_along(extent[5])?,
        );
        let point_count = nx
            .checked_mul(ny)
            .and_then(|n| n.checked_mul(nz))
            .ok_or_else(|| invalid(format!("WholeExtent {:?} is too large", extent)))?;

        let grid = PhysicalGrid {
            nx,
            ny,
            nz,
            dx: spacing[0],
            dy: spacing[1],
            dz: spacing[2],
            ox: origin[0],
            oy: origin[1],
            oz: origin[2],
            width_km: spacing[0] * (nx - 1) as f64,
            height_km: spacing[1] * (ny - 1) as f64,
        };

        let payload = &bytes[marker_pos + 1..];
        let values = parse_payload(payload, point_count)?;

        Ok(VtiDocument {
            grid,
            variable_name,
            values,
        })
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidVti(reason.into())
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| invalid(format!("missing {} attribute", name)))
}

fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>> {
    Ok(element
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned()))
}

fn parse_header(header: &str) -> Result<HeaderFields> {
    let mut reader = Reader::from_str(header);
    reader.config_mut().trim_text(true);

    let mut fields = HeaderFields::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"VTKFile" => {
                    if let Some(kind) = attribute(&e, "type")? {
                        if kind != "ImageData" {
                            return Err(invalid(format!("unsupported VTKFile type {}", kind)));
                        }
                    }
                    fields.byte_order = attribute(&e, "byte_order")?;
                }
                b"ImageData" => {
                    fields.whole_extent = attribute(&e, "WholeExtent")?;
                    fields.origin = attribute(&e, "Origin")?;
                    fields.spacing = attribute(&e, "Spacing")?;
                }
                b"PointData" => fields.scalars = attribute(&e, "Scalars")?,
                b"DataArray" => {
                    if fields.array_name.is_some() {
                        return Err(invalid("more than one DataArray"));
                    }
                    fields.array_name = attribute(&e, "Name")?;
                    fields.array_type = attribute(&e, "type")?;
                    fields.array_format = attribute(&e, "format")?;
                    fields.array_offset = attribute(&e, "offset")?;
                }
                b"AppendedData" => break,
                _ => {}
            },
            Event::Eof => return Err(invalid("header ended before AppendedData")),
            _ => {}
        }
    }

    Ok(fields)
}

fn parse_numbers<T: std::str::FromStr>(text: &str, count: usize) -> Result<Vec<T>> {
    let numbers = text
        .split_whitespace()
        .map(|s| s.parse::<T>())
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|_| invalid(format!("cannot parse numbers from {:?}", text)))?;
    if numbers.len() != count {
        return Err(invalid(format!(
            "expected {} numbers, found {} in {:?}",
            count,
            numbers.len(),
            text
        )));
    }
    Ok(numbers)
}

fn parse_payload(payload: &[u8], point_count: usize) -> Result<Vec<f32>> {
    let prefix: [u8; 4] = payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("appended data is shorter than its length prefix"))?;
    let byte_count = i32::from_le_bytes(prefix);

    let data_len = point_count
        .checked_mul(4)
        .ok_or_else(|| invalid(format!("{} points do not fit in memory", point_count)))?;
    let expected = data_len
        .checked_add(4)
        .ok_or_else(|| invalid(format!("{} points do not fit in memory", point_count)))?;
    if usize::try_from(byte_count).ok() != Some(expected) {
        return Err(invalid(format!(
            "length prefix {} does not match {} points (expected {})",
            byte_count, point_count, expected
        )));
    }

    let data_end = expected;
    let data = payload
        .get(4..data_end)
        .ok_or_else(|| invalid("appended data is truncated"))?;
    let values = data
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let trailer = &payload[data_end..];
    if trailer != TRAILER.as_bytes() {
        tracing::warn!(
            "unexpected {} trailing bytes after appended data",
            trailer.len()
        );
    }

    Ok(values)
}
