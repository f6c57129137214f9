//! Transaction input.

use crate::chain::out_point::OutPoint;
use crate::chain::witness::Witness;
use crate::script::{Script, MAX_SCRIPT_SIZE};
use crate::util::{var_int, Error, Result, Serializable};
use std::io;
use std::io::{Read, Write};

/// Transaction input.
///
/// The witness rides with the input but is not part of the input's own
/// wire image; the enclosing transaction serializes witnesses separately
/// (BIP-144).
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct TxIn {
    /// The previous output transaction reference.
    pub prev_output: OutPoint,
    /// Computational Script for confirming transaction authorization.
    pub unlock_script: Script,
    /// Transaction version as defined by the sender for replacement or negotiation.
    pub sequence: u32,
    /// Segregated witness stack for this input.
    pub witness: Witness,
}

impl TxIn {
    /// Returns the size of the transaction input in bytes, excluding the
    /// witness.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        OutPoint::SIZE
            + var_int::size(self.unlock_script.0.len() as u64)
            + self.unlock_script.0.len()
            + 4
    }
}

impl Serializable<TxIn> for TxIn {
    fn read(reader: &mut dyn Read) -> Result<TxIn> {
        let prev_output = OutPoint::read(reader)?;
        let script_len = var_int::read(reader)? as usize;
        if script_len > MAX_SCRIPT_SIZE {
            return Err(Error::BadData(format!("Unlock script too long: {}", script_len)));
        }
        let mut unlock_script = vec![0; script_len];
        reader.read_exact(&mut unlock_script).map_err(Error::IOError)?;
        let mut sequence = [0u8; 4];
        reader.read_exact(&mut sequence).map_err(Error::IOError)?;
        let sequence = u32::from_le_bytes(sequence);
        Ok(TxIn {
            prev_output,
            unlock_script: Script(unlock_script),
            sequence,
            witness: Witness::default(),
        })
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        self.prev_output.write(writer)?;
        var_int::write(self.unlock_script.0.len() as u64, writer)?;
        writer.write_all(&self.unlock_script.0)?;
        writer.write_all(&self.sequence.to_le_bytes())?;
        Ok(())
    }
}
