//! Script container and the opcode model for Bitcoin consensus.

pub mod num;
pub mod op_codes;
mod operation;

pub use self::operation::Operation;

use crate::util::{ByteReader, Error, Result};
use std::fmt;
use std::io::Cursor;

/// Maximum serialized script length (consensus rule).
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum keys in a CHECKMULTISIG, also its inaccurate sigop weight.
pub const MAX_MULTISIG_KEYS: usize = 20;

/// Transaction script.
///
/// Stored as raw bytes, so any byte image round-trips exactly even when it
/// ends in a truncated push. [`Script::ops`] views the bytes as parsed
/// operations.
#[derive(Default, PartialEq, Eq, Hash, Clone)]
pub struct Script(pub Vec<u8>);

impl Script {
    /// Creates a new empty script.
    #[must_use]
    pub fn new() -> Script {
        Script(vec![])
    }

    /// Appends a single opcode.
    #[inline]
    pub fn append(&mut self, op: u8) {
        self.0.push(op);
    }

    /// Appends raw bytes without a push opcode.
    #[inline]
    pub fn append_slice(&mut self, slice: &[u8]) {
        self.0.extend_from_slice(slice);
    }

    /// Appends a minimally-encoded push of the data.
    pub fn append_data(&mut self, data: &[u8]) {
        self.append_op(&Operation::from_push_data(data, true));
    }

    /// Appends a minimally-encoded numeric push.
    ///
    /// # Errors
    /// `Error::ScriptError` if the number is outside the 4-byte range.
    pub fn append_num(&mut self, n: i64) -> Result<()> {
        let bytes = num::encode_num(n)?;
        self.append_data(&bytes);
        Ok(())
    }

    /// Appends a serialized operation.
    pub fn append_op(&mut self, op: &Operation) {
        self.0.extend_from_slice(&op.to_bytes());
    }

    /// Builds a script from a sequence of operations.
    #[must_use]
    pub fn from_ops(ops: &[Operation]) -> Script {
        let mut script = Script::new();
        for op in ops {
            script.append_op(op);
        }
        script
    }

    /// Parses whitespace-separated mnemonic tokens into a script.
    ///
    /// Round-trip with [`fmt::Display`] is not bit-exact: a `[hex]` token
    /// always takes the nominal push envelope.
    ///
    /// # Errors
    /// `Error::BadData` naming the first token that does not parse.
    pub fn from_mnemonics(text: &str) -> Result<Script> {
        let mut script = Script::new();
        for token in text.split_whitespace() {
            let op = Operation::from_mnemonic(token);
            if op == Operation::default() {
                return Err(Error::BadData(format!("Unknown token: {}", token)));
            }
            script.append_op(&op);
        }
        Ok(script)
    }

    /// Parses the script into operations. Never fails.
    ///
    /// A script ending in a truncated push yields a final operation with
    /// `is_underflow()` set, retaining the bytes that were present.
    #[must_use]
    pub fn ops(&self) -> Vec<Operation> {
        let mut cursor = Cursor::new(&self.0[..]);
        let mut reader = ByteReader::new(&mut cursor);
        let mut ops = Vec::new();
        loop {
            let op = Operation::read_from(&mut reader);
            if reader.is_failed() {
                // End of script, or a truncated final push worth keeping.
                if op != Operation::default() {
                    ops.push(op);
                }
                return ops;
            }
            ops.push(op);
        }
    }

    /// Whether every operation is a push under the relaxed (BIP-62)
    /// definition. False for scripts with a truncated final push.
    #[must_use]
    pub fn is_push_only(&self) -> bool {
        self.ops()
            .iter()
            .all(|op| !op.is_underflow() && op.is_relaxed_push())
    }

    /// Recognizes a witness program: a version opcode followed by a single
    /// 2-40 byte push and nothing else (BIP-141). Returns the version value
    /// and the program bytes.
    #[must_use]
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        let bytes = &self.0;
        if bytes.len() < 4 || !op_codes::is_version(bytes[0]) {
            return None;
        }
        let len = bytes[1] as usize;
        if !(2..=40).contains(&len) || bytes.len() != len + 2 {
            return None;
        }
        let version = if bytes[0] == op_codes::OP_0 {
            0
        } else {
            op_codes::opcode_to_positive(bytes[0])
        };
        Some((version, &bytes[2..]))
    }

    /// Builds a version-0 pay-to-witness-public-key-hash program.
    #[must_use]
    pub fn p2wpkh(hash: &[u8; 20]) -> Script {
        let mut script = Script::new();
        script.append(op_codes::OP_0);
        script.append_data(hash);
        script
    }

    /// Builds a version-0 pay-to-witness-script-hash program.
    #[must_use]
    pub fn p2wsh(hash: &[u8; 32]) -> Script {
        let mut script = Script::new();
        script.append(op_codes::OP_0);
        script.append_data(hash);
        script
    }

    /// Counts signature operations in the script.
    ///
    /// CHECKSIG weighs 1 and CHECKMULTISIG weighs 20, unless `accurate` and
    /// the key count is a preceding small-integer push, in which case that
    /// count is used. Counting stops at a truncated push.
    #[must_use]
    pub fn sig_op_count(&self, accurate: bool) -> usize {
        let mut count = 0;
        let mut last_code = op_codes::OP_INVALIDOPCODE;
        for op in self.ops() {
            if op.is_underflow() {
                break;
            }
            match op.code() {
                op_codes::OP_CHECKSIG | op_codes::OP_CHECKSIGVERIFY => count += 1,
                op_codes::OP_CHECKMULTISIG | op_codes::OP_CHECKMULTISIGVERIFY => {
                    count += if accurate && op_codes::is_positive(last_code) {
                        op_codes::opcode_to_positive(last_code) as usize
                    } else {
                        MAX_MULTISIG_KEYS
                    };
                }
                _ => {}
            }
            last_code = op.code();
        }
        count
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for op in self.ops() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(&op.to_mnemonic())?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::op_codes::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn build_and_parse() {
        let mut script = Script::new();
        script.append(OP_DUP);
        script.append(OP_HASH160);
        script.append_data(&[7; 20]);
        script.append(OP_EQUALVERIFY);
        script.append(OP_CHECKSIG);
        let ops = script.ops();
        assert_eq!(ops.len(), 5);
        assert_eq!(ops[0].code(), OP_DUP);
        assert_eq!(ops[2].data(), &[7; 20]);
        assert_eq!(Script::from_ops(&ops), script);
    }

    #[test]
    fn parse_retains_truncated_tail() {
        let script = Script(vec![OP_DUP, 0x4c, 0x05, 0xaa, 0xbb]);
        let ops = script.ops();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].code(), OP_DUP);
        assert!(ops[1].is_underflow());
        assert_eq!(ops[1].data(), &[0xaa, 0xbb]);
    }

    #[test]
    fn push_only() {
        let mut script = Script::new();
        script.append(OP_0);
        script.append_data(&[1, 2, 3]);
        script.append(OP_16);
        script.append(OP_RESERVED); // relaxed definition admits reserved 80
        assert!(script.is_push_only());
        script.append(OP_DUP);
        assert!(!script.is_push_only());
    }

    #[test]
    fn witness_program_detection() {
        let p2wpkh = Script::p2wpkh(&[3; 20]);
        assert_eq!(p2wpkh.0.len(), 22);
        let (version, program) = p2wpkh.witness_program().unwrap();
        assert_eq!(version, 0);
        assert_eq!(program, &[3; 20]);

        let p2wsh = Script::p2wsh(&[4; 32]);
        assert_eq!(p2wsh.0.len(), 34);
        let (version, program) = p2wsh.witness_program().unwrap();
        assert_eq!(version, 0);
        assert_eq!(program.len(), 32);

        // Future version program
        let mut v1 = Script::new();
        v1.append(OP_1);
        v1.append_data(&[9; 32]);
        assert_eq!(v1.witness_program().unwrap().0, 1);

        // Not programs: wrong leading opcode, wrong push length, trailing bytes
        assert!(Script(vec![OP_DUP, 2, 0, 0]).witness_program().is_none());
        assert!(Script(vec![OP_0, 1, 0]).witness_program().is_none());
        assert!(Script(vec![OP_0, 41]).witness_program().is_none());
        let mut trailing = Script::p2wpkh(&[3; 20]);
        trailing.append(OP_NOP);
        assert!(trailing.witness_program().is_none());
    }

    #[test]
    fn sig_op_counting() {
        let mut script = Script::new();
        script.append(OP_CHECKSIG);
        script.append(OP_CHECKSIGVERIFY);
        assert_eq!(script.sig_op_count(false), 2);

        let mut multi = Script::new();
        multi.append(OP_2);
        multi.append_data(&[2; 33]);
        multi.append_data(&[3; 33]);
        multi.append(OP_2);
        multi.append(OP_CHECKMULTISIG);
        assert_eq!(multi.sig_op_count(false), 20);
        assert_eq!(multi.sig_op_count(true), 2);

        // No preceding key count, accurate falls back to 20
        let mut bare = Script::new();
        bare.append(OP_CHECKMULTISIGVERIFY);
        assert_eq!(bare.sig_op_count(true), 20);
    }

    #[test]
    fn append_num_minimal() {
        let mut script = Script::new();
        script.append_num(0).unwrap();
        script.append_num(7).unwrap();
        script.append_num(1000).unwrap();
        assert_eq!(script.0, vec![OP_0, OP_7, 0x02, 0xe8, 0x03]);
        assert!(script.append_num(1i64 << 33).is_err());
    }

    #[test]
    fn display_as_mnemonics() {
        let mut script = Script::new();
        script.append(OP_DUP);
        script.append_data(&[0xaa, 0xbb]);
        script.append(OP_CHECKSIG);
        assert_eq!(script.to_string(), "OP_DUP [aabb] OP_CHECKSIG");
        assert_eq!(Script::from_mnemonics(&script.to_string()).unwrap(), script);
    }

    #[test]
    fn from_mnemonics_rejects_unknown_tokens() {
        let script = Script::from_mnemonics("OP_1 OP_2 OP_ADD").unwrap();
        assert_eq!(script.0, vec![OP_1, OP_2, OP_ADD]);
        assert_eq!(
            Script::from_mnemonics("OP_1 bogus").unwrap_err().to_string(),
            "Bad data: Unknown token: bogus"
        );
    }
}
