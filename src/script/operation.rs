//! A single script operation: one opcode plus its optional push payload.

use crate::script::op_codes::{self, MAX_PUSH_DATA_SIZE};
use crate::script::num;
use crate::util::{ByteReader, Result, Serializable};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt;
use std::io;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

/// One parsed script operation.
///
/// The payload is shared and immutable, so cloning an operation into many
/// scripts costs a reference count, not a copy. An operation parsed from a
/// stream that truncated mid-push is retained with the bytes that arrived
/// and `is_underflow()` set; it serializes to the same number of bytes it
/// consumed but fails execution.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    code: u8,
    data: Arc<[u8]>,
    underflow: bool,
}

fn no_data() -> Arc<[u8]> {
    Arc::from(Vec::new())
}

impl Operation {
    /// Creates an operation from an opcode alone.
    #[must_use]
    pub fn from_code(code: u8) -> Operation {
        Operation {
            code,
            data: no_data(),
            underflow: false,
        }
    }

    /// Creates a push operation from payload bytes.
    ///
    /// With `minimal` true the smallest push envelope is chosen, converting
    /// single small numbers to their numeric opcodes (which then carry the
    /// value, so the payload is dropped). With `minimal` false the smallest
    /// size-based envelope is used and the payload kept literally.
    #[must_use]
    pub fn from_push_data(data: &[u8], minimal: bool) -> Operation {
        let code = if minimal {
            op_codes::minimal_opcode_from_data(data)
        } else {
            op_codes::nominal_opcode_from_data(data)
        };
        let data = if minimal && op_codes::is_numeric(code) {
            no_data()
        } else {
            Arc::from(data)
        };
        Operation {
            code,
            data,
            underflow: false,
        }
    }

    /// Reads an operation from a sticky-failure reader. Never fails.
    ///
    /// A missing opcode byte yields the default invalid operation. A
    /// truncated payload yields the opcode with the bytes that arrived and
    /// the underflow flag set, leaving the reader failed.
    #[must_use]
    pub fn read_from(reader: &mut ByteReader) -> Operation {
        if reader.is_failed() {
            return Operation::default();
        }
        let code = reader.read_u8();
        if reader.is_failed() {
            return Operation::default();
        }
        let size = match code {
            len @ 1..=75 => len as usize,
            op_codes::OP_PUSHDATA1 => reader.read_u8() as usize,
            op_codes::OP_PUSHDATA2 => reader.read_u16_le() as usize,
            op_codes::OP_PUSHDATA4 => reader.read_u32_le() as usize,
            _ => {
                return Operation {
                    code,
                    data: no_data(),
                    underflow: false,
                };
            }
        };
        let data = reader.read_bytes(size);
        Operation {
            code,
            data: data.into(),
            underflow: reader.is_failed(),
        }
    }

    /// Reads an operation from a byte slice. Never fails.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Operation {
        let mut cursor = Cursor::new(bytes);
        let mut reader = ByteReader::new(&mut cursor);
        Operation::read_from(&mut reader)
    }

    /// Serializes the operation to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size());
        self.write(&mut bytes).unwrap();
        bytes
    }

    /// Parses a single mnemonic token.
    ///
    /// A token is an opcode name in either case, `[hex]` for a literal
    /// (nominal) push, or a decimal number for a numeric push. Anything
    /// else yields the default invalid operation.
    #[must_use]
    pub fn from_mnemonic(token: &str) -> Operation {
        let token = token.trim();
        if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            return match hex::decode(inner) {
                Ok(data) => Operation::from_push_data(&data, false),
                Err(_) => Operation::default(),
            };
        }
        if let Ok(value) = token.parse::<i64>() {
            return match value {
                -1 => Operation::from_code(op_codes::OP_1NEGATE),
                0 => Operation::from_code(op_codes::OP_0),
                1..=16 => Operation::from_code(op_codes::opcode_from_positive(value as u8)),
                _ => match num::encode_num(value) {
                    Ok(data) => Operation::from_push_data(&data, true),
                    Err(_) => Operation::default(),
                },
            };
        }
        match op_codes::from_name(token) {
            Some(code) => Operation::from_code(code),
            None => Operation::default(),
        }
    }

    /// Renders the operation as a mnemonic token.
    #[must_use]
    pub fn to_mnemonic(&self) -> String {
        if self.underflow {
            format!("<{}>", hex::encode(&self.data))
        } else if self.code != op_codes::OP_0 && op_codes::is_payload(self.code) {
            format!("[{}]", hex::encode(&self.data))
        } else if let Some(name) = op_codes::name(self.code) {
            name.to_string()
        } else {
            format!("OP_UNKNOWN_{}", self.code)
        }
    }

    /// The opcode.
    #[must_use]
    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    /// The push payload, empty for non-payload opcodes.
    #[must_use]
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A shared handle to the payload.
    #[must_use]
    #[inline]
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Whether the operation was parsed from a stream that truncated
    /// mid-push. Underflow operations fail execution.
    #[must_use]
    #[inline]
    pub fn is_underflow(&self) -> bool {
        self.underflow
    }

    /// False only for the fixed-invalid (disabled) opcodes that are not
    /// merely truncated. Reserved codes and underflow are execution
    /// failures, not encoding failures.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        !(op_codes::is_invalid(self.code) && !self.underflow)
    }

    /// Serialized size: opcode byte, size prefix, payload.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        1 + Operation::size_prefix_len(self.code) + self.data.len()
    }

    /// Whether the payload exceeds the 520-byte push limit.
    #[must_use]
    #[inline]
    pub fn is_oversized(&self) -> bool {
        self.data.len() > MAX_PUSH_DATA_SIZE
    }

    /// Whether the opcode is the minimal encoding of the payload.
    ///
    /// Numeric opcodes are judged against the number they carry.
    #[must_use]
    pub fn is_minimal_push(&self) -> bool {
        self.code == op_codes::minimal_opcode_from_data(&self.numeric_data())
    }

    /// Whether the opcode is the nominal (size-based) encoding of the
    /// payload.
    #[must_use]
    pub fn is_nominal_push(&self) -> bool {
        self.code == op_codes::nominal_opcode_from_data(&self.data)
    }

    /// Category predicate, see [`op_codes::is_push`].
    #[must_use]
    #[inline]
    pub fn is_push(&self) -> bool {
        op_codes::is_push(self.code)
    }

    /// Category predicate, see [`op_codes::is_payload`].
    #[must_use]
    #[inline]
    pub fn is_payload(&self) -> bool {
        op_codes::is_payload(self.code)
    }

    /// Category predicate, see [`op_codes::is_counted`].
    #[must_use]
    #[inline]
    pub fn is_counted(&self) -> bool {
        op_codes::is_counted(self.code)
    }

    /// Category predicate, see [`op_codes::is_version`].
    #[must_use]
    #[inline]
    pub fn is_version(&self) -> bool {
        op_codes::is_version(self.code)
    }

    /// Category predicate, see [`op_codes::is_numeric`].
    #[must_use]
    #[inline]
    pub fn is_numeric(&self) -> bool {
        op_codes::is_numeric(self.code)
    }

    /// Category predicate, see [`op_codes::is_positive`].
    #[must_use]
    #[inline]
    pub fn is_positive(&self) -> bool {
        op_codes::is_positive(self.code)
    }

    /// Category predicate, see [`op_codes::is_invalid`].
    #[must_use]
    #[inline]
    pub fn is_invalid(&self) -> bool {
        op_codes::is_invalid(self.code)
    }

    /// Category predicate, see [`op_codes::is_reserved`].
    #[must_use]
    #[inline]
    pub fn is_reserved(&self) -> bool {
        op_codes::is_reserved(self.code)
    }

    /// Category predicate, see [`op_codes::is_conditional`].
    #[must_use]
    #[inline]
    pub fn is_conditional(&self) -> bool {
        op_codes::is_conditional(self.code)
    }

    /// Category predicate, see [`op_codes::is_relaxed_push`].
    #[must_use]
    #[inline]
    pub fn is_relaxed_push(&self) -> bool {
        op_codes::is_relaxed_push(self.code)
    }

    // The payload a numeric opcode stands for, for minimality checks.
    fn numeric_data(&self) -> Vec<u8> {
        if op_codes::is_positive(self.code) {
            vec![op_codes::opcode_to_positive(self.code)]
        } else if self.code == op_codes::OP_1NEGATE {
            vec![0x81]
        } else {
            self.data.to_vec()
        }
    }

    fn size_prefix_len(code: u8) -> usize {
        match code {
            op_codes::OP_PUSHDATA1 => 1,
            op_codes::OP_PUSHDATA2 => 2,
            op_codes::OP_PUSHDATA4 => 4,
            _ => 0,
        }
    }
}

impl Default for Operation {
    fn default() -> Operation {
        Operation {
            code: op_codes::OP_INVALIDOPCODE,
            data: no_data(),
            underflow: true,
        }
    }
}

impl Serializable<Operation> for Operation {
    /// Reads an operation. Total: truncation yields `Ok` with
    /// `is_underflow()` set rather than an error.
    fn read(reader: &mut dyn Read) -> Result<Operation> {
        let mut reader = ByteReader::new(reader);
        Ok(Operation::read_from(&mut reader))
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u8(self.code)?;
        match self.code {
            op_codes::OP_PUSHDATA1 => writer.write_u8(self.data.len() as u8)?,
            op_codes::OP_PUSHDATA2 => writer.write_u16::<LittleEndian>(self.data.len() as u16)?,
            op_codes::OP_PUSHDATA4 => writer.write_u32::<LittleEndian>(self.data.len() as u32)?,
            _ => {}
        }
        writer.write_all(&self.data)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_mnemonic())
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Operation")
            .field("code", &self.code)
            .field("data", &hex::encode(&self.data))
            .field("underflow", &self.underflow)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::op_codes::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn empty_push() {
        let op = Operation::from_bytes(&[0x00]);
        assert_eq!(op.code(), OP_0);
        assert!(op.data().is_empty());
        assert!(!op.is_underflow());
        assert_eq!(op.to_bytes(), vec![0x00]);
    }

    #[test]
    fn minimal_single_byte_seven() {
        let op = Operation::from_push_data(&[0x07], true);
        assert_eq!(op.code(), OP_7);
        assert!(op.data().is_empty());
        assert_eq!(op.to_bytes(), vec![0x57]);
        assert!(op.is_minimal_push());
    }

    #[test]
    fn nominal_single_byte_seven() {
        let op = Operation::from_push_data(&[0x07], false);
        assert_eq!(op.code(), 1);
        assert_eq!(op.data(), &[0x07]);
        assert_eq!(op.to_bytes(), vec![0x01, 0x07]);
        assert!(!op.is_minimal_push());
        assert!(op.is_nominal_push());
    }

    #[test]
    fn pushdata1_envelope_boundary() {
        let op = Operation::from_push_data(&[0u8; 76], true);
        assert_eq!(op.code(), OP_PUSHDATA1);
        let bytes = op.to_bytes();
        assert_eq!(&bytes[..3], &[0x4c, 0x4c, 0x00]);
        assert_eq!(bytes.len(), 78);
    }

    #[test]
    fn truncated_final_push() {
        let input = [0x4c, 0x05, 0xaa, 0xbb];
        let mut cursor = Cursor::new(&input[..]);
        let mut reader = ByteReader::new(&mut cursor);
        let op = Operation::read_from(&mut reader);
        assert_eq!(op.code(), OP_PUSHDATA1);
        assert_eq!(op.data(), &[0xaa, 0xbb]);
        assert!(op.is_underflow());
        assert!(reader.is_failed());
        // Re-serialization emits the same number of bytes it consumed.
        assert_eq!(op.to_bytes().len(), input.len());
    }

    #[test]
    fn empty_input_yields_default() {
        let op = Operation::from_bytes(&[]);
        assert_eq!(op, Operation::default());
        assert_eq!(op.code(), OP_INVALIDOPCODE);
        assert!(op.is_underflow());
        assert!(op.is_valid());
        assert_ne!(op, Operation::from_bytes(&[OP_DUP]));
    }

    #[test]
    fn non_push_opcode_parses_clean() {
        let op = Operation::from_bytes(&[OP_DUP]);
        assert_eq!(op.code(), OP_DUP);
        assert!(op.data().is_empty());
        assert!(!op.is_underflow());
        assert!(op.is_valid());
        assert_eq!(op.serialized_size(), 1);
    }

    #[test]
    fn disabled_opcode_is_invalid() {
        let op = Operation::from_code(OP_CAT);
        assert!(!op.is_valid());
        assert!(op.is_invalid());
        // Disabled codes still serialize.
        assert_eq!(op.to_bytes(), vec![OP_CAT]);
    }

    #[test]
    fn envelope_boundaries_serialize_correctly() {
        for (len, code, prefix) in [
            (0usize, OP_0, 0usize),
            (1, 1, 0),
            (75, 75, 0),
            (76, OP_PUSHDATA1, 1),
            (255, OP_PUSHDATA1, 1),
            (256, OP_PUSHDATA2, 2),
            (65535, OP_PUSHDATA2, 2),
            (65536, OP_PUSHDATA4, 4),
        ] {
            let data = vec![0xabu8; len];
            let op = Operation::from_push_data(&data, false);
            assert_eq!(op.code(), code, "len {}", len);
            assert_eq!(op.serialized_size(), 1 + prefix + len, "len {}", len);
            let parsed = Operation::from_bytes(&op.to_bytes());
            assert_eq!(parsed, op, "len {}", len);
            assert!(!parsed.is_underflow());
        }
    }

    #[test]
    fn minimal_never_longer_than_nominal() {
        for len in [0usize, 1, 2, 75, 76, 255, 256] {
            for fill in [0u8, 1, 7, 0x81, 0xff] {
                let data = vec![fill; len];
                let minimal = Operation::from_push_data(&data, true);
                let nominal = Operation::from_push_data(&data, false);
                assert!(
                    minimal.serialized_size() <= nominal.serialized_size(),
                    "len {} fill {}",
                    len,
                    fill
                );
                assert!(minimal.is_minimal_push(), "len {} fill {}", len, fill);
            }
        }
    }

    #[test]
    fn oversized_boundary() {
        assert!(!Operation::from_push_data(&[0; 520], false).is_oversized());
        assert!(Operation::from_push_data(&[0; 521], false).is_oversized());
    }

    #[test]
    fn numeric_zero_uses_op_0() {
        let op = Operation::from_push_data(&[], true);
        assert_eq!(op.code(), OP_0);
        assert!(op.is_minimal_push());
    }

    #[test]
    fn negative_one_converts() {
        let op = Operation::from_push_data(&[0x81], true);
        assert_eq!(op.code(), OP_1NEGATE);
        assert!(op.data().is_empty());
        assert!(op.is_minimal_push());
        assert_eq!(Operation::from_bytes(&[0x4f]), op);
    }

    #[test]
    fn clone_shares_payload() {
        let op = Operation::from_push_data(&[5; 100], false);
        let copy = op.clone();
        assert!(Arc::ptr_eq(&op.shared_data(), &copy.shared_data()));
        assert_eq!(op, copy);
    }

    #[test]
    fn mnemonic_names() {
        assert_eq!(Operation::from_mnemonic("OP_DUP").code(), OP_DUP);
        assert_eq!(Operation::from_mnemonic("op_hash160").code(), OP_HASH160);
        assert_eq!(Operation::from_mnemonic("OP_NOP2").code(), OP_CHECKLOCKTIMEVERIFY);
        assert_eq!(Operation::from_mnemonic("nonsense"), Operation::default());
        assert_eq!(Operation::from_code(OP_DUP).to_mnemonic(), "OP_DUP");
    }

    #[test]
    fn mnemonic_numbers() {
        assert_eq!(Operation::from_mnemonic("-1").code(), OP_1NEGATE);
        assert_eq!(Operation::from_mnemonic("0").code(), OP_0);
        assert_eq!(Operation::from_mnemonic("7").code(), OP_7);
        assert_eq!(Operation::from_mnemonic("16").code(), OP_16);
        let op = Operation::from_mnemonic("1000");
        assert_eq!(op.code(), 2);
        assert_eq!(op.data(), &[0xe8, 0x03]);
        assert_eq!(Operation::from_mnemonic("99999999999"), Operation::default());
    }

    #[test]
    fn mnemonic_hex_literal() {
        let op = Operation::from_mnemonic("[aabb]");
        assert_eq!(op.code(), 2);
        assert_eq!(op.data(), &[0xaa, 0xbb]);
        assert_eq!(op.to_mnemonic(), "[aabb]");
        assert_eq!(Operation::from_mnemonic("[xyz]"), Operation::default());
    }

    #[test]
    fn mnemonic_underflow_renders_angled() {
        let op = Operation::from_bytes(&[0x02, 0xaa]);
        assert!(op.is_underflow());
        assert_eq!(op.to_mnemonic(), "<aa>");
    }

    proptest! {
        #[test]
        fn round_trip_nominal(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let op = Operation::from_push_data(&data, false);
            let parsed = Operation::from_bytes(&op.to_bytes());
            prop_assert_eq!(parsed, op);
        }

        #[test]
        fn round_trip_minimal(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let op = Operation::from_push_data(&data, true);
            let parsed = Operation::from_bytes(&op.to_bytes());
            prop_assert_eq!(&parsed, &op);
            prop_assert!(parsed.is_minimal_push());
        }

        #[test]
        fn complete_single_op_round_trips_exact(code in 0u8..=255) {
            // A lone non-payload opcode byte is always a complete image.
            prop_assume!(!crate::script::op_codes::is_payload(code));
            let op = Operation::from_bytes(&[code]);
            prop_assert_eq!(op.to_bytes(), vec![code]);
        }
    }
}
