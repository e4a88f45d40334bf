// SPDX-License-Identifier: Apache-2.0

//! Conversion of hex trace/span identifiers into the 128-bit UUIDs Wavefront
//! uses to identify trace entities.

use crate::ExporterError;
use uuid::Uuid;

/// Parses up to 16 hex characters into an `i64`.
///
/// A full-width 16-character value with the top bit set does not fit the
/// signed range `from_str_radix` accepts, so it is parsed as two unsigned
/// 32-bit halves and recombined as `(high << 32) | low`. The result is the
/// unsigned 64-bit value reinterpreted as signed.
pub(crate) fn parse_hex(s: &str) -> Result<i64, ExporterError> {
    let invalid = || ExporterError::InvalidIdentifier(s.to_string());
    if s.len() > 16 {
        return Err(invalid());
    }
    if s.len() == 16 && s.as_bytes()[0] > b'7' {
        let (high, low) = s.split_at_checked(8).ok_or_else(invalid)?;
        let high = u32::from_str_radix(high, 16).map_err(|_| invalid())?;
        let low = u32::from_str_radix(low, 16).map_err(|_| invalid())?;
        return Ok(((high as i64) << 32) | low as i64);
    }
    i64::from_str_radix(s, 16).map_err(|_| invalid())
}

/// Derives a deterministic 128-bit UUID from a 1-32 character hex id.
///
/// Ids of 16 characters or fewer fill only the low 64 bits; longer ids split
/// at the 16-character boundary into high and low halves.
pub(crate) fn make_uuid(s: &str) -> Result<Uuid, ExporterError> {
    if s.len() <= 16 {
        return Ok(Uuid::from_u64_pair(0, parse_hex(s)? as u64));
    }
    let (high, low) = s
        .split_at_checked(16)
        .ok_or_else(|| ExporterError::InvalidIdentifier(s.to_string()))?;
    Ok(Uuid::from_u64_pair(
        parse_hex(high)? as u64,
        parse_hex(low)? as u64,
    ))
}
