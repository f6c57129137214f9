//! Bitcoin transaction with segregated witness serialization (BIP-144).

use crate::chain::out_point::{COINBASE_OUTPOINT_HASH, COINBASE_OUTPOINT_INDEX};
use crate::chain::tx_in::TxIn;
use crate::chain::tx_out::{TxOut, MAX_SATOSHIS};
use crate::chain::witness::Witness;
use crate::util::{sha256d, var_int, Error, Hash256, Result, Serializable};
use std::fmt;
use std::io;
use std::io::{Read, Write};

/// Maximum number of inputs (safety cap for deserialization).
const MAX_INPUTS: u64 = 1_000_000;
/// Maximum number of outputs (safety cap for deserialization).
const MAX_OUTPUTS: u64 = 1_000_000;

/// Marker byte distinguishing the extended serialization.
const SEGWIT_MARKER: u8 = 0x00;
/// Flag byte of the extended serialization.
const SEGWIT_FLAG: u8 = 0x01;

/// Bitcoin transaction.
#[derive(Default, PartialEq, Eq, Hash, Clone)]
pub struct Tx {
    /// Transaction version.
    pub version: u32,
    /// Transaction inputs.
    pub inputs: Vec<TxIn>,
    /// Transaction outputs.
    pub outputs: Vec<TxOut>,
    /// The block number or timestamp at which this transaction is unlocked.
    pub lock_time: u32,
}

impl Tx {
    /// Calculates the hash of the transaction (txid).
    ///
    /// The txid always covers the witness-free image, so it is unchanged
    /// by witness data.
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        let mut b = Vec::with_capacity(self.base_size());
        self.write_base(&mut b).unwrap();
        sha256d(&b)
    }

    /// Calculates the witness transaction hash (wtxid) over the full
    /// serialization. Equals the txid when no input carries a witness.
    #[must_use]
    pub fn wtxid(&self) -> Hash256 {
        let mut b = Vec::with_capacity(self.size());
        self.write(&mut b).unwrap();
        sha256d(&b)
    }

    /// Whether any input carries a non-empty witness.
    #[must_use]
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|tx_in| !tx_in.witness.is_empty())
    }

    /// Returns the full serialized size in bytes, including any witness
    /// envelope.
    #[must_use]
    pub fn size(&self) -> usize {
        if !self.has_witness() {
            return self.base_size();
        }
        self.base_size()
            + 2
            + self
                .inputs
                .iter()
                .map(|tx_in| tx_in.witness.serialized_size(true))
                .sum::<usize>()
    }

    /// Returns the serialized size of the witness-free image.
    #[must_use]
    pub fn base_size(&self) -> usize {
        8 + var_int::size(self.inputs.len() as u64)
            + self.inputs.iter().map(|tx_in| tx_in.size()).sum::<usize>()
            + var_int::size(self.outputs.len() as u64)
            + self.outputs.iter().map(|tx_out| tx_out.size()).sum::<usize>()
    }

    /// Transaction weight: three times the base size plus the total size
    /// (BIP-141).
    #[must_use]
    pub fn weight(&self) -> usize {
        3 * self.base_size() + self.size()
    }

    /// Virtual size: weight divided by four, rounded up.
    #[must_use]
    pub fn vsize(&self) -> usize {
        self.weight().div_ceil(4)
    }

    /// Returns whether the transaction is the block reward (coinbase).
    #[must_use]
    #[inline]
    pub fn coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].prev_output.hash == COINBASE_OUTPOINT_HASH
            && self.inputs[0].prev_output.index == COINBASE_OUTPOINT_INDEX
    }

    /// Validates the structure of a non-coinbase transaction.
    ///
    /// Script evaluation is the interpreter's concern and is not performed
    /// here.
    ///
    /// # Errors
    /// `Error::BadData` for empty or excessive inputs/outputs, satoshi
    /// range violations, or a coinbase input outside a coinbase.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::BadData("inputs empty".to_string()));
        }
        if self.inputs.len() as u64 > MAX_INPUTS {
            return Err(Error::BadData(format!("Too many inputs: {}", self.inputs.len())));
        }
        if self.outputs.is_empty() {
            return Err(Error::BadData("outputs empty".to_string()));
        }
        if self.outputs.len() as u64 > MAX_OUTPUTS {
            return Err(Error::BadData(format!("Too many outputs: {}", self.outputs.len())));
        }

        let mut total_out = 0i64;
        for tx_out in &self.outputs {
            tx_out.validate()?;
            total_out = total_out
                .checked_add(tx_out.satoshis)
                .ok_or_else(|| Error::BadData("Total out overflow".to_string()))?;
        }
        if total_out > MAX_SATOSHIS {
            return Err(Error::BadData("Total out exceeds max satoshis".to_string()));
        }

        for tx_in in &self.inputs {
            if tx_in.prev_output.hash == COINBASE_OUTPOINT_HASH
                && tx_in.prev_output.index == COINBASE_OUTPOINT_INDEX
            {
                return Err(Error::BadData("Unexpected coinbase".to_string()));
            }
        }

        Ok(())
    }

    // The legacy layout, which is also the txid preimage.
    fn write_base(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.version.to_le_bytes())?;
        var_int::write(self.inputs.len() as u64, writer)?;
        for tx_in in &self.inputs {
            tx_in.write(writer)?;
        }
        var_int::write(self.outputs.len() as u64, writer)?;
        for tx_out in &self.outputs {
            tx_out.write(writer)?;
        }
        writer.write_all(&self.lock_time.to_le_bytes())?;
        Ok(())
    }
}

impl Serializable<Tx> for Tx {
    fn read(reader: &mut dyn Read) -> Result<Tx> {
        let mut version = [0u8; 4];
        reader.read_exact(&mut version).map_err(Error::IOError)?;
        let version = u32::from_le_bytes(version);
        let mut n_inputs = var_int::read(reader)?;
        let mut segwit = false;
        // A zero input count is the BIP-144 marker; the flag byte follows.
        if n_inputs == 0 {
            let mut flag = [0u8; 1];
            reader.read_exact(&mut flag).map_err(Error::IOError)?;
            if flag[0] != SEGWIT_FLAG {
                return Err(Error::BadData(format!("Unknown segwit flag: {}", flag[0])));
            }
            segwit = true;
            n_inputs = var_int::read(reader)?;
        }
        if n_inputs > MAX_INPUTS {
            return Err(Error::BadData(format!("Too many inputs: {}", n_inputs)));
        }
        let mut inputs = Vec::with_capacity(n_inputs as usize);
        for _ in 0..n_inputs {
            inputs.push(TxIn::read(reader)?);
        }
        let n_outputs = var_int::read(reader)?;
        if n_outputs > MAX_OUTPUTS {
            return Err(Error::BadData(format!("Too many outputs: {}", n_outputs)));
        }
        let mut outputs = Vec::with_capacity(n_outputs as usize);
        for _ in 0..n_outputs {
            outputs.push(TxOut::read(reader)?);
        }
        if segwit {
            for tx_in in &mut inputs {
                tx_in.witness = Witness::read(reader, true)?;
            }
        }
        let mut lock_time = [0u8; 4];
        reader.read_exact(&mut lock_time).map_err(Error::IOError)?;
        let lock_time = u32::from_le_bytes(lock_time);
        Ok(Tx {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        if !self.has_witness() {
            return self.write_base(writer);
        }
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&[SEGWIT_MARKER, SEGWIT_FLAG])?;
        var_int::write(self.inputs.len() as u64, writer)?;
        for tx_in in &self.inputs {
            tx_in.write(writer)?;
        }
        var_int::write(self.outputs.len() as u64, writer)?;
        for tx_out in &self.outputs {
            tx_out.write(writer)?;
        }
        for tx_in in &self.inputs {
            tx_in.witness.write(writer, true)?;
        }
        writer.write_all(&self.lock_time.to_le_bytes())?;
        Ok(())
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inputs_str = format!("[<{} inputs>]", self.inputs.len());
        let outputs_str = format!("[<{} outputs>]", self.outputs.len());
        f.debug_struct("Tx")
            .field("version", &self.version)
            .field(
                "inputs",
                if self.inputs.len() <= 3 { &self.inputs } else { &inputs_str },
            )
            .field(
                "outputs",
                if self.outputs.len() <= 3 { &self.outputs } else { &outputs_str },
            )
            .field("lock_time", &self.lock_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::out_point::OutPoint;
    use crate::script::Script;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn legacy_tx() -> Tx {
        Tx {
            version: 1,
            inputs: vec![
                TxIn {
                    prev_output: OutPoint {
                        hash: Hash256([9; 32]),
                        index: 9,
                    },
                    unlock_script: Script(vec![1, 3, 5, 7, 9]),
                    sequence: 100,
                    witness: Witness::default(),
                },
                TxIn {
                    prev_output: OutPoint {
                        hash: Hash256([0; 32]),
                        index: 8,
                    },
                    unlock_script: Script(vec![3; 333]),
                    sequence: 22,
                    witness: Witness::default(),
                },
            ],
            outputs: vec![
                TxOut {
                    satoshis: 99,
                    lock_script: Script(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 100, 99, 98, 97, 96]),
                },
                TxOut {
                    satoshis: 199,
                    lock_script: Script(vec![56, 78, 90, 90, 78, 56]),
                },
            ],
            lock_time: 1000,
        }
    }

    #[test]
    fn write_read_legacy() {
        let mut v = Vec::new();
        let t = legacy_tx();
        t.write(&mut v).unwrap();
        assert_eq!(v.len(), t.size());
        assert_eq!(v.len(), t.base_size());
        assert_eq!(Tx::read(&mut Cursor::new(&v)).unwrap(), t);
    }

    #[test]
    fn write_read_segwit() {
        let mut t = legacy_tx();
        t.inputs[0].witness = Witness::from_stack(vec![vec![0x30, 0x45], vec![0x02, 0x79]]);
        t.inputs[1].witness = Witness::from_stack(vec![]);
        let mut v = Vec::new();
        t.write(&mut v).unwrap();
        assert_eq!(v.len(), t.size());
        assert!(v.len() > t.base_size());
        assert_eq!(&v[4..6], &[SEGWIT_MARKER, SEGWIT_FLAG]);
        let parsed = Tx::read(&mut Cursor::new(&v)).unwrap();
        assert_eq!(parsed, t);
        assert!(parsed.inputs[0].witness.is_valid());
        assert_eq!(parsed.inputs[0].witness.stack().len(), 2);
        assert!(parsed.inputs[1].witness.is_valid());
        assert!(parsed.inputs[1].witness.is_empty());
    }

    #[test]
    fn bad_segwit_flag_rejected() {
        let mut v = Vec::new();
        let mut t = legacy_tx();
        t.inputs[0].witness = Witness::from_stack(vec![vec![1]]);
        t.write(&mut v).unwrap();
        v[5] = 0x02;
        assert_eq!(
            Tx::read(&mut Cursor::new(&v)).unwrap_err().to_string(),
            "Bad data: Unknown segwit flag: 2"
        );
    }

    #[test]
    fn txid_ignores_witness() {
        let legacy = legacy_tx();
        let mut witnessed = legacy.clone();
        witnessed.inputs[0].witness = Witness::from_stack(vec![vec![0xaa; 70]]);
        assert_eq!(legacy.hash(), witnessed.hash());
        assert_eq!(legacy.hash(), legacy.wtxid());
        assert_ne!(witnessed.hash(), witnessed.wtxid());
    }

    #[test]
    fn weight_and_vsize() {
        let legacy = legacy_tx();
        assert_eq!(legacy.weight(), 4 * legacy.base_size());
        assert_eq!(legacy.vsize(), legacy.base_size());

        let mut witnessed = legacy;
        witnessed.inputs[0].witness = Witness::from_stack(vec![vec![0xaa; 10]]);
        assert_eq!(
            witnessed.weight(),
            3 * witnessed.base_size() + witnessed.size()
        );
        assert_eq!(witnessed.vsize(), witnessed.weight().div_ceil(4));
    }

    #[test]
    fn hash() {
        let tx = Tx {
            version: 1,
            inputs: vec![TxIn {
                prev_output: OutPoint {
                    hash: COINBASE_OUTPOINT_HASH,
                    index: COINBASE_OUTPOINT_INDEX,
                },
                unlock_script: Script(vec![4, 255, 255, 0, 29, 1, 11]),
                sequence: 0xffffffff,
                witness: Witness::default(),
            }],
            outputs: vec![TxOut {
                satoshis: 5000000000,
                lock_script: Script(vec![
                    65, 4, 114, 17, 168, 36, 245, 91, 80, 82, 40, 228, 195, 213, 25, 76, 31, 207,
                    170, 21, 164, 86, 171, 223, 55, 249, 185, 217, 122, 64, 64, 175, 192, 115, 222,
                    230, 200, 144, 100, 152, 79, 3, 56, 82, 55, 217, 33, 103, 193, 62, 35, 100, 70,
                    180, 23, 171, 121, 160, 252, 174, 65, 42, 227, 49, 107, 119, 172,
                ]),
            }],
            lock_time: 0,
        };
        let h = "9b0fc92260312ce44e74ef369f5c66bbb85848f2eddd5a7a1cde251e54ccfdd5";
        assert_eq!(tx.hash(), Hash256::decode(h).unwrap());
        assert!(tx.coinbase());
    }

    #[test]
    fn validate() {
        let tx = Tx {
            version: 2,
            inputs: vec![TxIn {
                prev_output: OutPoint {
                    hash: Hash256([5; 32]),
                    index: 3,
                },
                unlock_script: Script(vec![crate::script::op_codes::OP_1]),
                sequence: 0,
                witness: Witness::default(),
            }],
            outputs: vec![
                TxOut {
                    satoshis: 10,
                    lock_script: Script(vec![]),
                },
                TxOut {
                    satoshis: 20,
                    lock_script: Script(vec![]),
                },
            ],
            lock_time: 0,
        };
        assert!(tx.validate().is_ok());

        let mut tx_test = tx.clone();
        tx_test.inputs = vec![];
        assert_eq!(
            tx_test.validate().unwrap_err().to_string(),
            "Bad data: inputs empty"
        );

        let mut tx_test = tx.clone();
        tx_test.outputs = vec![];
        assert_eq!(
            tx_test.validate().unwrap_err().to_string(),
            "Bad data: outputs empty"
        );

        let mut tx_test = tx.clone();
        tx_test.outputs[0].satoshis = -1;
        assert_eq!(
            tx_test.validate().unwrap_err().to_string(),
            "Bad data: Negative satoshis"
        );

        let mut tx_test = tx.clone();
        tx_test.outputs[0].satoshis = MAX_SATOSHIS;
        tx_test.outputs[1].satoshis = MAX_SATOSHIS;
        assert_eq!(
            tx_test.validate().unwrap_err().to_string(),
            "Bad data: Total out exceeds max satoshis"
        );

        let mut tx_test = tx.clone();
        tx_test.inputs[0].prev_output.hash = COINBASE_OUTPOINT_HASH;
        tx_test.inputs[0].prev_output.index = COINBASE_OUTPOINT_INDEX;
        assert_eq!(
            tx_test.validate().unwrap_err().to_string(),
            "Bad data: Unexpected coinbase"
        );
    }
}
