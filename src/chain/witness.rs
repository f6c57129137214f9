//! Segregated witness stack attached to a transaction input (BIP-141).

use crate::chain::Tx;
use crate::script::op_codes::{self, MAX_PUSH_DATA_SIZE};
use crate::script::Script;
use crate::util::{var_int, Error, Result};
use bitcoin_hashes::sha256 as bh_sha256;
use bitcoin_hashes::Hash as BHHash;
use std::fmt;
use std::io;
use std::io::{Cursor, Read, Write};

/// Leading byte of the reserved single-entry witness pattern.
const WITNESS_RESERVED_MARKER: u8 = op_codes::OP_RESERVED;

/// Witness program length for pay-to-witness-public-key-hash.
const P2WPKH_PROGRAM_SIZE: usize = 20;
/// Witness program length for pay-to-witness-script-hash.
const P2WSH_PROGRAM_SIZE: usize = 32;

/// Script engine callback used by [`Witness::verify`].
///
/// The full interpreter lives outside this crate; verification hands it
/// the extracted script, the initial stack, and the spending context
/// (transaction, input index, fork flags, and the prevout value used for
/// BIP-143 signature hashing).
pub trait Interpreter {
    /// Evaluates a script against an initial stack for one input.
    ///
    /// # Errors
    /// `Error::ScriptError` when evaluation fails.
    fn eval(
        &mut self,
        script: &Script,
        stack: &[Vec<u8>],
        tx: &Tx,
        input: usize,
        flags: u32,
        value: u64,
    ) -> Result<()>;
}

/// Ordered stack of byte strings plus a validity flag.
///
/// The default witness is invalid with an empty stack; it compares unequal
/// to a valid empty-stack witness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Witness {
    stack: Vec<Vec<u8>>,
    valid: bool,
}

impl Default for Witness {
    fn default() -> Witness {
        Witness {
            stack: vec![],
            valid: false,
        }
    }
}

impl Witness {
    /// Creates a valid witness from a raw stack.
    #[must_use]
    pub fn from_stack(stack: Vec<Vec<u8>>) -> Witness {
        Witness { stack, valid: true }
    }

    /// Reads a witness from a stream.
    ///
    /// With `prefix` true the stack entry count is read as a leading var
    /// int; with `prefix` false entries are read until end-of-stream, the
    /// count having been supplied by the enclosing container.
    ///
    /// # Errors
    /// Propagates IO errors, including truncation.
    pub fn read(reader: &mut dyn Read, prefix: bool) -> Result<Witness> {
        let mut stack = Vec::new();
        if prefix {
            let count = var_int::read(reader)?;
            for _ in 0..count {
                let len = var_int::read(reader)? as usize;
                stack.push(Witness::read_element(len, reader)?);
            }
        } else {
            loop {
                let mut first = [0u8; 1];
                let n = reader.read(&mut first).map_err(Error::IOError)?;
                if n == 0 {
                    break;
                }
                let len = var_int::read_given(first[0], reader)? as usize;
                stack.push(Witness::read_element(len, reader)?);
            }
        }
        Ok(Witness { stack, valid: true })
    }

    /// Reads a witness from a byte slice. Never fails: a bad image yields
    /// the default invalid witness with an empty stack.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], prefix: bool) -> Witness {
        let mut cursor = Cursor::new(bytes);
        Witness::read(&mut cursor, prefix).unwrap_or_default()
    }

    /// Writes the witness with or without the leading count.
    ///
    /// # Errors
    /// IO errors.
    pub fn write(&self, writer: &mut dyn Write, prefix: bool) -> io::Result<()> {
        if prefix {
            var_int::write(self.stack.len() as u64, writer)?;
        }
        for item in &self.stack {
            var_int::write(item.len() as u64, writer)?;
            writer.write_all(item)?;
        }
        Ok(())
    }

    /// Serializes the witness to bytes.
    #[must_use]
    pub fn to_bytes(&self, prefix: bool) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size(prefix));
        self.write(&mut bytes, prefix).unwrap();
        bytes
    }

    /// Returns the serialized size in bytes.
    #[must_use]
    pub fn serialized_size(&self, prefix: bool) -> usize {
        let body: usize = self
            .stack
            .iter()
            .map(|item| var_int::size(item.len() as u64) + item.len())
            .sum();
        if prefix {
            var_int::size(self.stack.len() as u64) + body
        } else {
            body
        }
    }

    /// The witness stack.
    #[must_use]
    #[inline]
    pub fn stack(&self) -> &[Vec<u8>] {
        &self.stack
    }

    /// Whether construction or deserialization succeeded.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the stack has no entries.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of stack entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether every stack element is within the push size limit.
    #[must_use]
    pub fn is_push_size(stack: &[Vec<u8>]) -> bool {
        stack.iter().all(|item| item.len() <= MAX_PUSH_DATA_SIZE)
    }

    /// Whether the stack is the reserved single-entry pattern: one element
    /// of 2 to 41 bytes led by the reserved version marker.
    #[must_use]
    pub fn is_reserved_pattern(stack: &[Vec<u8>]) -> bool {
        stack.len() == 1
            && (2..42).contains(&stack[0].len())
            && stack[0][0] == WITNESS_RESERVED_MARKER
    }

    /// Extracts the script and initial stack for a version-0 witness
    /// program.
    ///
    /// For a 20-byte program (P2WPKH) the script is the implied
    /// `DUP HASH160 <program> EQUALVERIFY CHECKSIG` and the stack is the
    /// whole witness, which must hold exactly two entries. For a 32-byte
    /// program (P2WSH) the top entry is popped as the script, which must
    /// hash to the program, and the rest is the stack.
    ///
    /// # Errors
    /// `Error::ScriptError` for anything that is not a well-formed v0
    /// program spend.
    pub fn extract_script(&self, program_script: &Script) -> Result<(Script, Vec<Vec<u8>>)> {
        let program = Witness::v0_program(program_script)?;
        match program.len() {
            P2WPKH_PROGRAM_SIZE => {
                if self.stack.len() != 2 {
                    return Err(Error::ScriptError(format!(
                        "P2WPKH witness requires 2 entries, got {}",
                        self.stack.len()
                    )));
                }
                Ok((Witness::key_hash_script(program), self.stack.clone()))
            }
            P2WSH_PROGRAM_SIZE => {
                let mut stack = self.stack.clone();
                let embedded = stack
                    .pop()
                    .ok_or_else(|| Error::ScriptError("P2WSH witness is empty".to_string()))?;
                let hash = bh_sha256::Hash::hash(&embedded).to_byte_array();
                if hash != *program {
                    return Err(Error::ScriptError(
                        "Witness script does not hash to program".to_string(),
                    ));
                }
                Ok((Script(embedded), stack))
            }
            len => Err(Error::ScriptError(format!(
                "Invalid v0 witness program length: {}",
                len
            ))),
        }
    }

    /// Extracts only the script used for signature-operation counting
    /// under the witness-v0 rules. The P2WSH script is taken unverified;
    /// an empty witness counts against an empty script.
    ///
    /// # Errors
    /// `Error::ScriptError` if the previous output is not a v0 program.
    pub fn extract_sigop_script(&self, program_script: &Script) -> Result<Script> {
        let program = Witness::v0_program(program_script)?;
        match program.len() {
            P2WPKH_PROGRAM_SIZE => Ok(Witness::key_hash_script(program)),
            P2WSH_PROGRAM_SIZE => Ok(self
                .stack
                .last()
                .map(|item| Script(item.clone()))
                .unwrap_or_default()),
            len => Err(Error::ScriptError(format!(
                "Invalid v0 witness program length: {}",
                len
            ))),
        }
    }

    /// Verifies this witness against the previous output script by
    /// extracting the script and stack and delegating to the interpreter.
    ///
    /// # Errors
    /// `Error::ScriptError` for extraction or evaluation failure.
    pub fn verify<I: Interpreter>(
        &self,
        interpreter: &mut I,
        tx: &Tx,
        input: usize,
        flags: u32,
        program_script: &Script,
        value: u64,
    ) -> Result<()> {
        let (script, stack) = self.extract_script(program_script)?;
        if !Witness::is_push_size(&stack) {
            return Err(Error::ScriptError(
                "Witness element exceeds push size".to_string(),
            ));
        }
        interpreter.eval(&script, &stack, tx, input, flags, value)
    }

    fn v0_program(program_script: &Script) -> Result<&[u8]> {
        let (version, program) = program_script
            .witness_program()
            .ok_or_else(|| Error::ScriptError("Not a witness program".to_string()))?;
        if version != 0 {
            return Err(Error::ScriptError(format!(
                "Unhandled witness version: {}",
                version
            )));
        }
        Ok(program)
    }

    // The implied P2WPKH script: DUP HASH160 <program> EQUALVERIFY CHECKSIG.
    fn key_hash_script(program: &[u8]) -> Script {
        let mut script = Script::new();
        script.append(op_codes::OP_DUP);
        script.append(op_codes::OP_HASH160);
        script.append_data(program);
        script.append(op_codes::OP_EQUALVERIFY);
        script.append(op_codes::OP_CHECKSIG);
        script
    }

    fn read_element(len: usize, reader: &mut dyn Read) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let got = (&mut *reader)
            .take(len as u64)
            .read_to_end(&mut bytes)
            .map_err(Error::IOError)?;
        if got < len {
            return Err(Error::IOError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "witness element truncated",
            )));
        }
        Ok(bytes)
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for item in &self.stack {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "[{}]", hex::encode(item))?;
            first = false;
        }
        Ok(())
    }
}
