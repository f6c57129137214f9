//! Chain data types: transactions, outpoints, and segregated witnesses.

mod out_point;
mod tx;
mod tx_in;
mod tx_out;
mod witness;

pub use self::out_point::{OutPoint, COINBASE_OUTPOINT_HASH, COINBASE_OUTPOINT_INDEX};
pub use self::tx::Tx;
pub use self::tx_in::TxIn;
pub use self::tx_out::{TxOut, MAX_SATOSHIS};
pub use self::witness::{Interpreter, Witness};
