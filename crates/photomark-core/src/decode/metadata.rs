//! EXIF lookups: orientation and capture date.

use std::io::Cursor;

use exif::{Exif, In, Reader, Tag, Value};

use super::Orientation;

/// Date tags in lookup order.
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTime, Tag::DateTimeDigitized];

fn read_exif(bytes: &[u8]) -> Option<Exif> {
    let mut cursor = Cursor::new(bytes);
    Reader::new().read_from_container(&mut cursor).ok()
}

/// EXIF orientation of an encoded image.
///
/// Returns `Orientation::Normal` when there is no EXIF block or no
/// orientation tag.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    read_exif(bytes)
        .as_ref()
        .and_then(orientation_of)
        .unwrap_or_default()
}

pub(super) fn orientation_of(exif: &Exif) -> Option<Orientation> {
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from)
}

/// Capture date of an encoded image as `YYYY-MM-DD`.
///
/// Tries `DateTimeOriginal`, then `DateTime`, then `DateTimeDigitized`.
pub fn exif_date(bytes: &[u8]) -> Option<String> {
    read_exif(bytes).as_ref().and_then(date_of)
}

pub(super) fn date_of(exif: &Exif) -> Option<String> {
    DATE_TAGS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, In::PRIMARY)?;
        match &field.value {
            Value::Ascii(values) => values
                .first()
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .and_then(|text| format_exif_date(&text)),
            _ => None,
        }
    })
}

/// Turn an EXIF timestamp (`YYYY:MM:DD HH:MM:SS`) into `YYYY-MM-DD`.
///
/// Values shorter than ten characters are rejected. A date part that is
/// already dash-separated is kept as is.
pub fn format_exif_date(value: &str) -> Option<String> {
    let value = value.trim_matches(char::from(0)).trim();
    if value.chars().count() < 10 {
        return None;
    }
    let date_part = value.split_whitespace().next()?;
    if date_part.contains(':') {
        let mut parts = date_part.splitn(3, ':');
        let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
        Some(format!("{y}-{m}-{d}"))
    } else {
        Some(date_part.chars().take(10).collect())
    }
}
