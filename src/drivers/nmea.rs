//! NMEA 0183 Sentence Handling
//!
//! Parses the position sentences emitted by MediaTek GPS modules and formats
//! `$PMTK` configuration commands for them.

use core::fmt::Write;

use defmt::{debug, Format};
use heapless::{String, Vec};

/// Longest sentence accepted, excluding the line terminator
pub const MAX_SENTENCE_LEN: usize = 82;

/// Most fields any supported sentence carries
const MAX_FIELDS: usize = 20;

/// Parse failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum NmeaError {
    /// Sentence is not valid ASCII / UTF-8
    Encoding,
    /// Sentence does not start with `$`
    MissingStart,
    /// Talker/sentence type we do not handle
    Unsupported,
    /// Sentence has fewer fields than the type requires
    MissingField,
    /// Numeric field could not be parsed; carries the field index
    InvalidField(u8),
    /// `*hh` checksum does not match the sentence
    Checksum,
    /// Formatted command does not fit the output buffer
    TooLong,
}

/// Sentence types we parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum SentenceKind {
    /// `$GPRMC` recommended minimum data
    Rmc,
    /// `$GPGLL` geographic position
    Gll,
    /// `$GPGGA` fix data
    Gga,
}

/// Latest known fix. Positions are kept in NMEA `ddmm.mmmm` form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Format)]
pub struct GpsFix {
    /// hhmmss.sss
    pub utc_time: f32,
    /// `A` valid, `V` void
    pub status: u8,
    pub latitude: f32,
    /// `N` or `S`
    pub lat_hemisphere: u8,
    pub longitude: f32,
    /// `E` or `W`
    pub lon_hemisphere: u8,
    /// Metres above mean sea level
    pub altitude: f32,
    /// ddmmyy
    pub date: u32,
}

impl GpsFix {
    /// Latitude in signed decimal degrees
    pub fn latitude_degrees(&self) -> f32 {
        signed_degrees(self.latitude, self.lat_hemisphere == b'S')
    }

    /// Longitude in signed decimal degrees
    pub fn longitude_degrees(&self) -> f32 {
        signed_degrees(self.longitude, self.lon_hemisphere == b'W')
    }
}

fn signed_degrees(ddmm: f32, negative: bool) -> f32 {
    let degrees = (ddmm / 100.0) as i32 as f32;
    let minutes = ddmm - degrees * 100.0;
    let value = degrees + minutes / 60.0;
    if negative {
        -value
    } else {
        value
    }
}

/// XOR of every byte between `$` and `*`
pub fn nmea_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

fn parse_hex_byte(hex: &str) -> Option<u8> {
    u8::from_str_radix(hex.get(..2)?, 16).ok()
}

struct Fields<'a> {
    fields: Vec<&'a str, MAX_FIELDS>,
}

impl<'a> Fields<'a> {
    fn get(&self, index: usize) -> Result<&'a str, NmeaError> {
        self.fields.get(index).copied().ok_or(NmeaError::MissingField)
    }

    /// Empty fields leave `target` untouched
    fn number<T: core::str::FromStr>(&self, index: usize, target: &mut T) -> Result<(), NmeaError> {
        let field = self.get(index)?;
        if field.is_empty() {
            return Ok(());
        }
        *target = field.parse().map_err(|_| NmeaError::InvalidField(index as u8))?;
        Ok(())
    }

    fn flag(&self, index: usize, target: &mut u8) -> Result<(), NmeaError> {
        if let Some(&b) = self.get(index)?.as_bytes().first() {
            *target = b;
        }
        Ok(())
    }
}

/// Parse one sentence (without line terminator) into `fix`.
///
/// Fields are split on `,` with empty fields kept, so positions stay fixed
/// even when the receiver has no value for a field. A trailing `*hh` is
/// verified when present.
pub fn parse_sentence(sentence: &[u8], fix: &mut GpsFix) -> Result<SentenceKind, NmeaError> {
    let sentence = core::str::from_utf8(sentence).map_err(|_| NmeaError::Encoding)?;
    let body = sentence.strip_prefix('$').ok_or(NmeaError::MissingStart)?;

    let body = match body.split_once('*') {
        Some((body, checksum)) => {
            let expected = parse_hex_byte(checksum).ok_or(NmeaError::Checksum)?;
            if nmea_checksum(body.as_bytes()) != expected {
                return Err(NmeaError::Checksum);
            }
            body
        }
        None => body,
    };

    let mut fields = Fields { fields: Vec::new() };
    for field in body.split(',') {
        fields.fields.push(field).map_err(|_| NmeaError::Unsupported)?;
    }

    let kind = match fields.get(0)? {
        "GPRMC" => SentenceKind::Rmc,
        "GPGLL" => SentenceKind::Gll,
        "GPGGA" => SentenceKind::Gga,
        _ => return Err(NmeaError::Unsupported),
    };

    // Parse into a copy so a bad field leaves the previous fix intact
    let mut next = *fix;
    match kind {
        SentenceKind::Rmc => {
            fields.number(1, &mut next.utc_time)?;
            fields.flag(2, &mut next.status)?;
            fields.number(3, &mut next.latitude)?;
            fields.flag(4, &mut next.lat_hemisphere)?;
            fields.number(5, &mut next.longitude)?;
            fields.flag(6, &mut next.lon_hemisphere)?;
            fields.number(9, &mut next.date)?;
        }
        SentenceKind::Gll => {
            fields.number(1, &mut next.latitude)?;
            fields.flag(2, &mut next.lat_hemisphere)?;
            fields.number(3, &mut next.longitude)?;
            fields.flag(4, &mut next.lon_hemisphere)?;
            fields.flag(6, &mut next.status)?;
        }
        SentenceKind::Gga => {
            fields.number(1, &mut next.utc_time)?;
            fields.number(2, &mut next.latitude)?;
            fields.flag(3, &mut next.lat_hemisphere)?;
            fields.number(4, &mut next.longitude)?;
            fields.flag(5, &mut next.lon_hemisphere)?;
            fields.number(9, &mut next.altitude)?;
        }
    }

    debug!("Parsed {}", kind);
    *fix = next;
    Ok(kind)
}

/// Format `$PMTKnnn[,data]*hh\r\n`
pub fn pmtk_command(command: u16, data: Option<u16>) -> Result<String<32>, NmeaError> {
    let mut body: String<24> = String::new();
    write!(body, "PMTK{:03}", command).map_err(|_| NmeaError::TooLong)?;
    if let Some(data) = data {
        write!(body, ",{}", data).map_err(|_| NmeaError::TooLong)?;
    }

    let mut out: String<32> = String::new();
    write!(out, "${}*{:02X}\r\n", body, nmea_checksum(body.as_bytes())).map_err(|_| NmeaError::TooLong)?;
    Ok(out)
}
