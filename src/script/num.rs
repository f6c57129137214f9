//! Minimal script number encoding.
//!
//! Script numbers are little-endian with the sign carried in the high bit
//! of the last byte, trimmed of redundant leading zeroes. Consensus limits
//! operands to 4 bytes.

use crate::util::{Error, Result};

const MAX_NUM_LEN: usize = 4;
const NUM_RANGE: i64 = 1i64 << 31; // 2^31

/// Decodes a stack item to an i64 number (LE, sign in MSB).
///
/// # Errors
/// - `Error::ScriptError("Num too long: N bytes")` if over 4 bytes.
/// - `Error::ScriptError("Number out of range")` if outside [-2^31 + 1, 2^31 - 1].
///
/// # Examples
/// ```
/// use qamar::script::num::decode_num;
/// assert_eq!(decode_num(&[1]).unwrap(), 1i64);
/// assert_eq!(decode_num(&[0x81]).unwrap(), -1i64);
/// ```
#[inline]
pub fn decode_num(s: &[u8]) -> Result<i64> {
    if s.len() > MAX_NUM_LEN {
        return Err(Error::ScriptError(format!("Num too long: {} bytes", s.len())));
    }
    let high = if s.is_empty() { 0u8 } else { s[s.len() - 1] };
    let sign = (high & 0x80) != 0;
    let mut extended: Vec<u8> = s.to_vec();
    if sign {
        // Clear the sign bit before extension, then negate.
        let last = extended.len() - 1;
        extended[last] &= 0x7f;
    }
    while extended.len() < 8 {
        extended.push(0u8);
    }
    let magnitude = i64::from_le_bytes(
        extended
            .try_into()
            .map_err(|_| Error::ScriptError("Invalid extension".to_string()))?,
    );
    let n = if sign { -magnitude } else { magnitude };
    if n.abs() >= NUM_RANGE {
        return Err(Error::ScriptError("Number out of range".to_string()));
    }
    Ok(n)
}

/// Encodes an i64 to a minimal stack item (0-4 bytes LE, sign in MSB).
///
/// # Errors
/// - `Error::ScriptError("Number out of range")` if outside [-2^31 + 1, 2^31 - 1].
///
/// # Examples
/// ```
/// use qamar::script::num::encode_num;
/// assert_eq!(encode_num(1).unwrap(), vec![1]);
/// assert_eq!(encode_num(-1).unwrap(), vec![0x81]);
/// ```
#[inline]
pub fn encode_num(val: i64) -> Result<Vec<u8>> {
    if val.abs() >= NUM_RANGE {
        return Err(Error::ScriptError("Number out of range".to_string()));
    }
    if val == 0 {
        return Ok(vec![]);
    }
    let negative = val < 0;
    let mut magnitude = val.unsigned_abs();
    let mut bytes = Vec::with_capacity(5);
    while magnitude > 0 {
        bytes.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    // A set high bit would read as a sign, so the sign gets its own byte.
    if bytes[bytes.len() - 1] & 0x80 != 0 {
        bytes.push(if negative { 0x80 } else { 0 });
    } else if negative {
        let last = bytes.len() - 1;
        bytes[last] |= 0x80;
    }
    Ok(bytes)
}
