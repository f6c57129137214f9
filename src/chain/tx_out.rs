//! Transaction output.

use crate::script::{Script, MAX_SCRIPT_SIZE};
use crate::util::{var_int, Error, Result, Serializable};
use std::io;
use std::io::{Read, Write};

/// Maximum number of satoshis possible (21M BTC).
pub const MAX_SATOSHIS: i64 = 21_000_000 * 100_000_000;

/// Transaction output.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct TxOut {
    /// Number of satoshis to spend.
    pub satoshis: i64,
    /// Public key script to claim the output.
    pub lock_script: Script,
}

impl TxOut {
    /// Returns the size of the transaction output in bytes.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        8 + var_int::size(self.lock_script.0.len() as u64) + self.lock_script.0.len()
    }

    /// Validates the transaction output.
    ///
    /// # Errors
    /// `Error::BadData` if satoshis are negative or exceed the money
    /// supply, or the lock script is too long.
    pub fn validate(&self) -> Result<()> {
        if self.satoshis < 0 {
            return Err(Error::BadData("Negative satoshis".to_string()));
        }
        if self.satoshis > MAX_SATOSHIS {
            return Err(Error::BadData("Satoshis exceeds max".to_string()));
        }
        if self.lock_script.0.len() > MAX_SCRIPT_SIZE {
            return Err(Error::BadData(format!(
                "Lock script too long: {}",
                self.lock_script.0.len()
            )));
        }
        Ok(())
    }
}

impl Serializable<TxOut> for TxOut {
    fn read(reader: &mut dyn Read) -> Result<TxOut> {
        let mut satoshis = [0u8; 8];
        reader.read_exact(&mut satoshis).map_err(Error::IOError)?;
        let satoshis = i64::from_le_bytes(satoshis);
        let script_len = var_int::read(reader)? as usize;
        if script_len > MAX_SCRIPT_SIZE {
            return Err(Error::BadData(format!("Lock script too long: {}", script_len)));
        }
        let mut lock_script = vec![0; script_len];
        reader.read_exact(&mut lock_script).map_err(Error::IOError)?;
        Ok(TxOut {
            satoshis,
            lock_script: Script(lock_script),
        })
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.satoshis.to_le_bytes())?;
        var_int::write(self.lock_script.0.len() as u64, writer)?;
        writer.write_all(&self.lock_script.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn write_read() {
        let mut v = Vec::new();
        let t = TxOut {
            satoshis: 4_400_044_000,
            lock_script: Script(vec![1, 2, 3, 4, 5]),
        };
        t.write(&mut v).unwrap();
        assert_eq!(v.len(), t.size());
        assert_eq!(TxOut::read(&mut Cursor::new(&v)).unwrap(), t);
    }

    #[test]
    fn validate() {
        let good = TxOut {
            satoshis: 100,
            lock_script: Script(vec![]),
        };
        assert!(good.validate().is_ok());

        let mut negative = good.clone();
        negative.satoshis = -1;
        assert_eq!(
            negative.validate().unwrap_err().to_string(),
            "Bad data: Negative satoshis"
        );

        let mut excessive = good.clone();
        excessive.satoshis = MAX_SATOSHIS + 1;
        assert_eq!(
            excessive.validate().unwrap_err().to_string(),
            "Bad data: Satoshis exceeds max"
        );

        let mut oversized = good;
        oversized.lock_script = Script(vec![0; MAX_SCRIPT_SIZE + 1]);
        assert!(oversized.validate().is_err());
    }
}
