//! Script opcodes for Bitcoin consensus execution.
//!
//! Constants grouped by category, with the category predicates and push
//! opcode derivation rules the network enforces. Predicate membership is
//! consensus-critical: it must match deployed network behavior exactly.
//!
//! # Examples
//! ```
//! use qamar::script::op_codes::*;
//! assert_eq!(OP_IF, 99);
//! assert!(is_conditional(OP_IF));
//! ```

// Pushdata and Constants
/// Pushes empty array (0/false) onto the stack.
pub const OP_0: u8 = 0;
/// Alias of [`OP_0`].
pub const OP_FALSE: u8 = 0;

/// Opcodes 1-75 push that many following bytes.
pub const OP_PUSHBYTES_1_TO_75: u8 = 1;

/// Next byte is push length (up to 255 bytes).
pub const OP_PUSHDATA1: u8 = 76;
/// Next two LE bytes are push length (up to 65535 bytes).
pub const OP_PUSHDATA2: u8 = 77;
/// Next four LE bytes are push length (up to 4GB).
pub const OP_PUSHDATA4: u8 = 78;

/// Pushes -1 onto the stack.
pub const OP_1NEGATE: u8 = 79;

/// Pushes 1 (true) onto the stack.
pub const OP_1: u8 = 81;
/// Alias of [`OP_1`].
pub const OP_TRUE: u8 = 81;

// Numeric constants (2-16)
/// Pushes 2 onto the stack.
pub const OP_2: u8 = 82;
/// Pushes 3 onto the stack.
pub const OP_3: u8 = 83;
/// Pushes 4 onto the stack.
pub const OP_4: u8 = 84;
/// Pushes 5 onto the stack.
pub const OP_5: u8 = 85;
/// Pushes 6 onto the stack.
pub const OP_6: u8 = 86;
/// Pushes 7 onto the stack.
pub const OP_7: u8 = 87;
/// Pushes 8 onto the stack.
pub const OP_8: u8 = 88;
/// Pushes 9 onto the stack.
pub const OP_9: u8 = 89;
/// Pushes 10 onto the stack.
pub const OP_10: u8 = 90;
/// Pushes 11 onto the stack.
pub const OP_11: u8 = 91;
/// Pushes 12 onto the stack.
pub const OP_12: u8 = 92;
/// Pushes 13 onto the stack.
pub const OP_13: u8 = 93;
/// Pushes 14 onto the stack.
pub const OP_14: u8 = 94;
/// Pushes 15 onto the stack.
pub const OP_15: u8 = 95;
/// Pushes 16 onto the stack.
pub const OP_16: u8 = 96;

// Flow Control
/// Does nothing.
pub const OP_NOP: u8 = 97;
/// If top stack is true, execute block (pops bool).
pub const OP_IF: u8 = 99;
/// If top stack is false, execute block (pops bool).
pub const OP_NOTIF: u8 = 100;
/// Inverts preceding IF/NOTIF execution.
pub const OP_ELSE: u8 = 103;
/// Ends IF/ELSE block.
pub const OP_ENDIF: u8 = 104;
/// Fails if top stack false (pops bool).
pub const OP_VERIFY: u8 = 105;
/// Ends execution as failed; remaining bytes are unexecuted data.
pub const OP_RETURN: u8 = 106;

// Stack Operations
/// Moves top item to alt stack.
pub const OP_TOALTSTACK: u8 = 107;
/// Moves top alt stack item to main stack.
pub const OP_FROMALTSTACK: u8 = 108;
/// Drops top two.
pub const OP_2DROP: u8 = 109;
/// Duplicates top two.
pub const OP_2DUP: u8 = 110;
/// Duplicates top three.
pub const OP_3DUP: u8 = 111;
/// Copies third/fourth to top.
pub const OP_2OVER: u8 = 112;
/// Moves fifth/sixth to top.
pub const OP_2ROT: u8 = 113;
/// Swaps top two pairs.
pub const OP_2SWAP: u8 = 114;
/// Duplicates top if non-zero.
pub const OP_IFDUP: u8 = 115;
/// Pushes stack depth.
pub const OP_DEPTH: u8 = 116;
/// Drops top item.
pub const OP_DROP: u8 = 117;
/// Duplicates top.
pub const OP_DUP: u8 = 118;
/// Removes second-top.
pub const OP_NIP: u8 = 119;
/// Copies second-top to top.
pub const OP_OVER: u8 = 120;
/// Copies nth item to top.
pub const OP_PICK: u8 = 121;
/// Moves nth item to top.
pub const OP_ROLL: u8 = 122;
/// Rotates top three left.
pub const OP_ROT: u8 = 123;
/// Swaps top two.
pub const OP_SWAP: u8 = 124;
/// Copies top under second-top.
pub const OP_TUCK: u8 = 125;

// Splice (disabled)
/// Concatenates top two (disabled).
pub const OP_CAT: u8 = 126;
/// Substring of top (disabled).
pub const OP_SUBSTR: u8 = 127;
/// Left portion of top (disabled).
pub const OP_LEFT: u8 = 128;
/// Right portion of top (disabled).
pub const OP_RIGHT: u8 = 129;
/// Pushes length of top (no pop).
pub const OP_SIZE: u8 = 130;

// Bitwise Logic
/// Inverts all bits in top (disabled).
pub const OP_INVERT: u8 = 131;
/// Bitwise AND top two (disabled).
pub const OP_AND: u8 = 132;
/// Bitwise OR top two (disabled).
pub const OP_OR: u8 = 133;
/// Bitwise XOR top two (disabled).
pub const OP_XOR: u8 = 134;
/// Equals top two (bytes).
pub const OP_EQUAL: u8 = 135;
/// Equals + VERIFY.
pub const OP_EQUALVERIFY: u8 = 136;

// Arithmetic
/// Adds 1 to top.
pub const OP_1ADD: u8 = 139;
/// Subtracts 1 from top.
pub const OP_1SUB: u8 = 140;
/// Doubles top (disabled).
pub const OP_2MUL: u8 = 141;
/// Halves top (disabled).
pub const OP_2DIV: u8 = 142;
/// Negates top.
pub const OP_NEGATE: u8 = 143;
/// Absolute value of top.
pub const OP_ABS: u8 = 144;
/// Logical NOT top (0/1 -> 1/0).
pub const OP_NOT: u8 = 145;
/// 0 != top (1 if non-zero).
pub const OP_0NOTEQUAL: u8 = 146;
/// Adds top two.
pub const OP_ADD: u8 = 147;
/// Subtracts top from second.
pub const OP_SUB: u8 = 148;
/// Multiplies top two (disabled).
pub const OP_MUL: u8 = 149;
/// Divides second by top (disabled).
pub const OP_DIV: u8 = 150;
/// Modulo second % top (disabled).
pub const OP_MOD: u8 = 151;
/// Left shift (disabled).
pub const OP_LSHIFT: u8 = 152;
/// Right shift (disabled).
pub const OP_RSHIFT: u8 = 153;
/// Boolean AND nums.
pub const OP_BOOLAND: u8 = 154;
/// Boolean OR nums.
pub const OP_BOOLOR: u8 = 155;
/// Numeric equal.
pub const OP_NUMEQUAL: u8 = 156;
/// Numeric equal + VERIFY.
pub const OP_NUMEQUALVERIFY: u8 = 157;
/// Numeric not equal.
pub const OP_NUMNOTEQUAL: u8 = 158;
/// a < b (nums).
pub const OP_LESSTHAN: u8 = 159;
/// a > b (nums).
pub const OP_GREATERTHAN: u8 = 160;
/// a <= b (nums).
pub const OP_LESSTHANOREQUAL: u8 = 161;
/// a >= b (nums).
pub const OP_GREATERTHANOREQUAL: u8 = 162;
/// Min(a, b) nums.
pub const OP_MIN: u8 = 163;
/// Max(a, b) nums.
pub const OP_MAX: u8 = 164;
/// min <= x < max (nums).
pub const OP_WITHIN: u8 = 165;

// Cryptography
/// RIPEMD160(top).
pub const OP_RIPEMD160: u8 = 166;
/// SHA1(top) (legacy).
pub const OP_SHA1: u8 = 167;
/// SHA256(top).
pub const OP_SHA256: u8 = 168;
/// RIPEMD160(SHA256(top)).
pub const OP_HASH160: u8 = 169;
/// SHA256(SHA256(top)).
pub const OP_HASH256: u8 = 170;
/// Starts sig matching from here.
pub const OP_CODESEPARATOR: u8 = 171;
/// Verifies sig for pubkey/tx (1/0).
pub const OP_CHECKSIG: u8 = 172;
/// CHECKSIG + VERIFY.
pub const OP_CHECKSIGVERIFY: u8 = 173;
/// m-of-n multisig verify (1/0).
pub const OP_CHECKMULTISIG: u8 = 174;
/// CHECKMULTISIG + VERIFY.
pub const OP_CHECKMULTISIGVERIFY: u8 = 175;

// Locktime
/// Fails if locktime > tx.lock_time (BIP-65, formerly OP_NOP2).
pub const OP_CHECKLOCKTIMEVERIFY: u8 = 177;
/// Fails if sequence < tx.sequence (BIP-112, formerly OP_NOP3).
pub const OP_CHECKSEQUENCEVERIFY: u8 = 178;

// Reserved (invalid only when executed)
/// Reserved word.
pub const OP_RESERVED: u8 = 80;
/// Reserved word.
pub const OP_VER: u8 = 98;
/// Reserved word, invalid even when unexecuted under pre-segwit rules.
pub const OP_VERIF: u8 = 101;
/// Reserved word, invalid even when unexecuted under pre-segwit rules.
pub const OP_VERNOTIF: u8 = 102;
/// Reserved word.
pub const OP_RESERVED1: u8 = 137;
/// Reserved word.
pub const OP_RESERVED2: u8 = 138;

// NOPs (ignored)
/// Upgradable no-op.
pub const OP_NOP1: u8 = 176;
/// Alias of [`OP_CHECKLOCKTIMEVERIFY`].
pub const OP_NOP2: u8 = 177;
/// Alias of [`OP_CHECKSEQUENCEVERIFY`].
pub const OP_NOP3: u8 = 178;
/// Upgradable no-op.
pub const OP_NOP4: u8 = 179;
/// Upgradable no-op.
pub const OP_NOP5: u8 = 180;
/// Upgradable no-op.
pub const OP_NOP6: u8 = 181;
/// Upgradable no-op.
pub const OP_NOP7: u8 = 182;
/// Upgradable no-op.
pub const OP_NOP8: u8 = 183;
/// Upgradable no-op.
pub const OP_NOP9: u8 = 184;
/// Upgradable no-op.
pub const OP_NOP10: u8 = 185;

// Pseudo-words
/// Template matching pseudo-op, never valid on the wire.
pub const OP_PUBKEYHASH: u8 = 253;
/// Template matching pseudo-op, never valid on the wire.
pub const OP_PUBKEY: u8 = 254;
/// Pseudo-op representing any invalid opcode.
pub const OP_INVALIDOPCODE: u8 = 255;

/// Maximum size of a single pushed element (consensus rule).
pub const MAX_PUSH_DATA_SIZE: usize = 520;

/// Returns true for opcodes that push a value, including numerics.
#[must_use]
#[inline]
pub fn is_push(code: u8) -> bool {
    code <= OP_16 && code != OP_RESERVED
}

/// Returns true for opcodes that carry an explicit byte payload.
#[must_use]
#[inline]
pub fn is_payload(code: u8) -> bool {
    code <= OP_PUSHDATA4
}

/// Returns true for opcodes counted toward the 201 operation limit.
#[must_use]
#[inline]
pub fn is_counted(code: u8) -> bool {
    code >= OP_NOP
}

/// Returns true for opcodes usable as a witness program version (0-16).
#[must_use]
#[inline]
pub fn is_version(code: u8) -> bool {
    code == OP_0 || is_positive(code)
}

/// Returns true for opcodes that push a number (-1 or 1-16).
#[must_use]
#[inline]
pub fn is_numeric(code: u8) -> bool {
    is_positive(code) || code == OP_1NEGATE
}

/// Returns true for opcodes that push a positive number (1-16).
#[must_use]
#[inline]
pub fn is_positive(code: u8) -> bool {
    (OP_1..=OP_16).contains(&code)
}

/// Returns true for the disabled opcodes, invalid wherever they appear.
#[must_use]
#[inline]
pub fn is_invalid(code: u8) -> bool {
    matches!(
        code,
        OP_CAT..=OP_RIGHT | OP_INVERT..=OP_XOR | OP_2MUL | OP_2DIV | OP_MUL..=OP_RSHIFT
    )
}

/// Returns true for reserved words, invalid only when executed.
#[must_use]
#[inline]
pub fn is_reserved(code: u8) -> bool {
    matches!(
        code,
        OP_RESERVED | OP_VER | OP_VERIF | OP_VERNOTIF | OP_RESERVED1 | OP_RESERVED2
    ) || code > OP_NOP10
}

/// Returns true for the conditional flow control opcodes.
#[must_use]
#[inline]
pub fn is_conditional(code: u8) -> bool {
    matches!(code, OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF)
}

/// Returns true under the relaxed (BIP-62 "push only") definition, which
/// admits the reserved word 80 alongside every push opcode.
#[must_use]
#[inline]
pub fn is_relaxed_push(code: u8) -> bool {
    code <= OP_16
}

/// Computes the push opcode for a payload size alone.
#[must_use]
#[inline]
pub fn opcode_from_size(size: usize) -> u8 {
    if size <= 75 {
        size as u8
    } else if size <= 0xff {
        OP_PUSHDATA1
    } else if size <= 0xffff {
        OP_PUSHDATA2
    } else {
        OP_PUSHDATA4
    }
}

/// Computes the smallest push encoding for the data, preferring the
/// numeric opcodes where the data is a single small number.
///
/// Callers converting to a numeric opcode should clear the data, since
/// the opcode itself carries the value.
#[must_use]
pub fn minimal_opcode_from_data(data: &[u8]) -> u8 {
    match data {
        [] => OP_0,
        [0x81] => OP_1NEGATE,
        [n @ 1..=16] => opcode_from_positive(*n),
        _ => opcode_from_size(data.len()),
    }
}

/// Computes the size-based push opcode for the data, never converting to
/// a numeric opcode.
#[must_use]
#[inline]
pub fn nominal_opcode_from_data(data: &[u8]) -> u8 {
    opcode_from_size(data.len())
}

/// Converts a witness version value (0-16) to its opcode.
#[must_use]
#[inline]
pub fn opcode_from_version(value: u8) -> u8 {
    debug_assert!(value <= 16);
    if value == 0 { OP_0 } else { opcode_from_positive(value) }
}

/// Converts a value in 1-16 to the corresponding numeric opcode.
#[must_use]
#[inline]
pub fn opcode_from_positive(value: u8) -> u8 {
    debug_assert!((1..=16).contains(&value));
    OP_1 + value - 1
}

/// Converts a numeric opcode back to its value in 1-16.
#[must_use]
#[inline]
pub fn opcode_to_positive(code: u8) -> u8 {
    debug_assert!(is_positive(code));
    code - OP_1 + 1
}

/// Returns the canonical name of an opcode, if it has one.
///
/// Sized pushes (1-75) and the unassigned range above OP_NOP10 have no
/// names of their own.
#[must_use]
pub fn name(code: u8) -> Option<&'static str> {
    let name = match code {
        OP_0 => "OP_0",
        OP_PUSHDATA1 => "OP_PUSHDATA1",
        OP_PUSHDATA2 => "OP_PUSHDATA2",
        OP_PUSHDATA4 => "OP_PUSHDATA4",
        OP_1NEGATE => "OP_1NEGATE",
        OP_RESERVED => "OP_RESERVED",
        OP_1 => "OP_1",
        OP_2 => "OP_2",
        OP_3 => "OP_3",
        OP_4 => "OP_4",
        OP_5 => "OP_5",
        OP_6 => "OP_6",
        OP_7 => "OP_7",
        OP_8 => "OP_8",
        OP_9 => "OP_9",
        OP_10 => "OP_10",
        OP_11 => "OP_11",
        OP_12 => "OP_12",
        OP_13 => "OP_13",
        OP_14 => "OP_14",
        OP_15 => "OP_15",
        OP_16 => "OP_16",
        OP_NOP => "OP_NOP",
        OP_VER => "OP_VER",
        OP_IF => "OP_IF",
        OP_NOTIF => "OP_NOTIF",
        OP_VERIF => "OP_VERIF",
        OP_VERNOTIF => "OP_VERNOTIF",
        OP_ELSE => "OP_ELSE",
        OP_ENDIF => "OP_ENDIF",
        OP_VERIFY => "OP_VERIFY",
        OP_RETURN => "OP_RETURN",
        OP_TOALTSTACK => "OP_TOALTSTACK",
        OP_FROMALTSTACK => "OP_FROMALTSTACK",
        OP_2DROP => "OP_2DROP",
        OP_2DUP => "OP_2DUP",
        OP_3DUP => "OP_3DUP",
        OP_2OVER => "OP_2OVER",
        OP_2ROT => "OP_2ROT",
        OP_2SWAP => "OP_2SWAP",
        OP_IFDUP => "OP_IFDUP",
        OP_DEPTH => "OP_DEPTH",
        OP_DROP => "OP_DROP",
        OP_DUP => "OP_DUP",
        OP_NIP => "OP_NIP",
        OP_OVER => "OP_OVER",
        OP_PICK => "OP_PICK",
        OP_ROLL => "OP_ROLL",
        OP_ROT => "OP_ROT",
        OP_SWAP => "OP_SWAP",
        OP_TUCK => "OP_TUCK",
        OP_CAT => "OP_CAT",
        OP_SUBSTR => "OP_SUBSTR",
        OP_LEFT => "OP_LEFT",
        OP_RIGHT => "OP_RIGHT",
        OP_SIZE => "OP_SIZE",
        OP_INVERT => "OP_INVERT",
        OP_AND => "OP_AND",
        OP_OR => "OP_OR",
        OP_XOR => "OP_XOR",
        OP_EQUAL => "OP_EQUAL",
        OP_EQUALVERIFY => "OP_EQUALVERIFY",
        OP_RESERVED1 => "OP_RESERVED1",
        OP_RESERVED2 => "OP_RESERVED2",
        OP_1ADD => "OP_1ADD",
        OP_1SUB => "OP_1SUB",
        OP_2MUL => "OP_2MUL",
        OP_2DIV => "OP_2DIV",
        OP_NEGATE => "OP_NEGATE",
        OP_ABS => "OP_ABS",
        OP_NOT => "OP_NOT",
        OP_0NOTEQUAL => "OP_0NOTEQUAL",
        OP_ADD => "OP_ADD",
        OP_SUB => "OP_SUB",
        OP_MUL => "OP_MUL",
        OP_DIV => "OP_DIV",
        OP_MOD => "OP_MOD",
        OP_LSHIFT => "OP_LSHIFT",
        OP_RSHIFT => "OP_RSHIFT",
        OP_BOOLAND => "OP_BOOLAND",
        OP_BOOLOR => "OP_BOOLOR",
        OP_NUMEQUAL => "OP_NUMEQUAL",
        OP_NUMEQUALVERIFY => "OP_NUMEQUALVERIFY",
        OP_NUMNOTEQUAL => "OP_NUMNOTEQUAL",
        OP_LESSTHAN => "OP_LESSTHAN",
        OP_GREATERTHAN => "OP_GREATERTHAN",
        OP_LESSTHANOREQUAL => "OP_LESSTHANOREQUAL",
        OP_GREATERTHANOREQUAL => "OP_GREATERTHANOREQUAL",
        OP_MIN => "OP_MIN",
        OP_MAX => "OP_MAX",
        OP_WITHIN => "OP_WITHIN",
        OP_RIPEMD160 => "OP_RIPEMD160",
        OP_SHA1 => "OP_SHA1",
        OP_SHA256 => "OP_SHA256",
        OP_HASH160 => "OP_HASH160",
        OP_HASH256 => "OP_HASH256",
        OP_CODESEPARATOR => "OP_CODESEPARATOR",
        OP_CHECKSIG => "OP_CHECKSIG",
        OP_CHECKSIGVERIFY => "OP_CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG",
        OP_CHECKMULTISIGVERIFY => "OP_CHECKMULTISIGVERIFY",
        OP_NOP1 => "OP_NOP1",
        OP_CHECKLOCKTIMEVERIFY => "OP_CHECKLOCKTIMEVERIFY",
        OP_CHECKSEQUENCEVERIFY => "OP_CHECKSEQUENCEVERIFY",
        OP_NOP4 => "OP_NOP4",
        OP_NOP5 => "OP_NOP5",
        OP_NOP6 => "OP_NOP6",
        OP_NOP7 => "OP_NOP7",
        OP_NOP8 => "OP_NOP8",
        OP_NOP9 => "OP_NOP9",
        OP_NOP10 => "OP_NOP10",
        OP_PUBKEYHASH => "OP_PUBKEYHASH",
        OP_PUBKEY => "OP_PUBKEY",
        OP_INVALIDOPCODE => "OP_INVALIDOPCODE",
        _ => return None,
    };
    Some(name)
}

/// Looks up an opcode by name, case-insensitively.
///
/// Accepts the aliases `OP_FALSE`, `OP_TRUE`, `OP_NOP2` and `OP_NOP3`.
#[must_use]
pub fn from_name(token: &str) -> Option<u8> {
    let upper = token.to_ascii_uppercase();
    match upper.as_str() {
        "OP_FALSE" => return Some(OP_0),
        "OP_TRUE" => return Some(OP_1),
        "OP_NOP2" => return Some(OP_CHECKLOCKTIMEVERIFY),
        "OP_NOP3" => return Some(OP_CHECKSEQUENCEVERIFY),
        _ => {}
    }
    // All remaining names are canonical; scan the name table.
    (0u8..=255).find(|&code| name(code) == Some(upper.as_str()))
}
