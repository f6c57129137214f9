//! Serialization plumbing and shared helpers.

mod hash256;
mod result;
mod serdes;
mod stream;
pub(crate) mod var_int;

pub use self::hash256::{sha256d, Hash256};
pub use self::result::{Error, Result};
pub use self::serdes::Serializable;
pub use self::stream::ByteReader;
