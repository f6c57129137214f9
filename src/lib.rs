#![deny(missing_docs)]
#![deny(unsafe_code)]

/*! # Qamar

A compact Bitcoin toolkit for the consensus-critical byte layer: script
operations with their exact wire encoding, segregated witness stacks, and
the transaction serialization that carries them.

Parsing is total. Every byte sequence yields a value; truncation and
invalid opcodes are reflected in flags (`is_underflow`, `is_valid`) rather
than errors, so a malformed script still round-trips the bytes that were
witnessed on the network.

## Usage
use qamar::script::Operation;
let op = Operation::from_push_data(&[0x07], true);
assert_eq!(op.to_bytes(), vec![0x57]); // OP_7 carries the value itself

## Scope
Script evaluation and signature checking live outside this crate; the
[`chain::Interpreter`] trait is the seam through which
[`chain::Witness::verify`] hands an extracted script to an engine.

## Security
- Consensus tables (opcode categories, push envelopes) must match the
  network bit-for-bit; they are covered by exhaustive tests.
- Run `cargo audit` monthly to check for dependency vulnerabilities.
*/

pub mod chain;
pub mod script;
pub mod util;
