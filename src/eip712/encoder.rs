//! EIP-712 Type Encoding
//!
//! Implements `encodeType` and the recursive `encodeData` rules.
//! Every field is encoded into one 32-byte slot:
//! - atomic types: ABI head encoding
//! - `string`/`bytes`: keccak256 of the raw bytes
//! - structs: `hashStruct` of the nested value
//! - arrays: keccak256 of the concatenated element slots

use std::collections::{BTreeMap, BTreeSet};

use super::types::*;
use crate::error::{AuthError, AuthResult};
use crate::types::Address;
use crate::utils::crypto::{keccak256, strip_hex_prefix};

/// Schema table: struct name -> ordered fields
pub type TypeMap = BTreeMap<String, Vec<TypedDataField>>;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)" followed by
/// every referenced struct type, sorted by name.
pub fn encode_type(type_name: &str, types: &TypeMap) -> AuthResult<String> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| AuthError::UnknownType(type_name.to_string()))?;

    let mut result = format_type_string(type_name, fields);

    // BTreeSet iterates in sorted order
    for dep in find_type_dependencies(type_name, types) {
        if dep == type_name {
            continue;
        }
        if let Some(dep_fields) = types.get(&dep) {
            result.push_str(&format_type_string(&dep, dep_fields));
        }
    }

    Ok(result)
}

/// Format a single struct's type string
pub fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

/// Find all struct types reachable from `type_name`, including itself
pub fn find_type_dependencies(type_name: &str, types: &TypeMap) -> BTreeSet<String> {
    let mut dependencies = BTreeSet::new();
    let mut to_visit = vec![type_name.to_string()];

    while let Some(current) = to_visit.pop() {
        if dependencies.contains(&current) {
            continue;
        }

        if let Some(fields) = types.get(&current) {
            dependencies.insert(current.clone());

            for field in fields {
                let base_type = get_base_type(&field.type_name);
                if types.contains_key(base_type) && !dependencies.contains(base_type) {
                    to_visit.push(base_type.to_string());
                }
            }
        }
    }

    dependencies
}

/// Get the base type from a potentially array type
/// e.g., "Person[]" -> "Person", "uint256[10][]" -> "uint256"
pub fn get_base_type(type_name: &str) -> &str {
    match type_name.find('[') {
        Some(bracket_pos) => &type_name[..bracket_pos],
        None => type_name,
    }
}

/// Split the outermost array dimension: "T[2][]" -> ("T[2]", None)
fn split_array_type(type_name: &str) -> AuthResult<(&str, Option<usize>)> {
    let open = type_name
        .rfind('[')
        .ok_or_else(|| AuthError::UnknownType(type_name.to_string()))?;
    let inner = type_name[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| AuthError::UnknownType(type_name.to_string()))?;

    let length = if inner.is_empty() {
        None
    } else {
        Some(
            inner
                .parse::<usize>()
                .map_err(|_| AuthError::UnknownType(type_name.to_string()))?,
        )
    };

    Ok((&type_name[..open], length))
}

/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &TypeMap) -> AuthResult<[u8; 32]> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// encodeData(s) prefixed with its type hash: `typeHash || slot(field)...`
pub fn encode_data(type_name: &str, value: &serde_json::Value, types: &TypeMap) -> AuthResult<Vec<u8>> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| AuthError::UnknownType(type_name.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    for field in fields {
        let field_value = obj
            .get(&field.name)
            .ok_or_else(|| AuthError::MissingField(format!("{}.{}", type_name, field.name)))?;

        encoded.extend_from_slice(&encode_field(&field.type_name, field_value, types)?);
    }

    Ok(encoded)
}

/// Encode one field value into its 32-byte slot
pub fn encode_field(type_name: &str, value: &serde_json::Value, types: &TypeMap) -> AuthResult<[u8; 32]> {
    if type_name.ends_with(']') {
        return encode_array(type_name, value, types);
    }

    match type_name {
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => {
            let bytes = parse_hex_value(type_name, value)?;
            Ok(keccak256(&bytes))
        }
        _ if types.contains_key(type_name) => {
            Ok(keccak256(&encode_data(type_name, value, types)?))
        }
        _ => encode_atomic(type_name, value),
    }
}

/// Encode an array value as the hash of its element slots
fn encode_array(type_name: &str, value: &serde_json::Value, types: &TypeMap) -> AuthResult<[u8; 32]> {
    let (element_type, fixed_len) = split_array_type(type_name)?;

    let items = value
        .as_array()
        .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;

    if let Some(expected) = fixed_len {
        if items.len() != expected {
            return Err(AuthError::type_mismatch(
                type_name,
                format!("expected {} elements, got {}", expected, items.len()),
            ));
        }
    }

    let mut encoded = Vec::with_capacity(32 * items.len());
    for item in items {
        encoded.extend_from_slice(&encode_field(element_type, item, types)?);
    }

    Ok(keccak256(&encoded))
}

/// Encode an atomic (fixed-size) value
fn encode_atomic(type_name: &str, value: &serde_json::Value) -> AuthResult<[u8; 32]> {
    if type_name == "address" {
        let text = value
            .as_str()
            .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;
        let address = Address::parse(text).map_err(|_| AuthError::type_mismatch(type_name, value))?;
        return Ok(address.to_word());
    }

    if type_name == "bool" {
        let b = value
            .as_bool()
            .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;
        let mut word = [0u8; 32];
        word[31] = u8::from(b);
        return Ok(word);
    }

    if let Some((bits, signed)) = int_bits(type_name) {
        return if signed {
            encode_int(type_name, bits, value)
        } else {
            encode_uint(type_name, bits, value)
        };
    }

    if let Some(size) = fixed_bytes_len(type_name) {
        let bytes = parse_hex_value(type_name, value)?;
        if bytes.len() > size {
            return Err(AuthError::type_mismatch(
                type_name,
                format!("bytes too long: {} > {}", bytes.len(), size),
            ));
        }

        // bytesN is right-padded
        let mut word = [0u8; 32];
        word[..bytes.len()].copy_from_slice(&bytes);
        return Ok(word);
    }

    Err(AuthError::UnknownType(type_name.to_string()))
}

fn encode_uint(type_name: &str, bits: u32, value: &serde_json::Value) -> AuthResult<[u8; 32]> {
    let (negative, magnitude) = parse_integer(type_name, value)?;
    if negative && !is_zero(&magnitude) {
        return Err(AuthError::type_mismatch(type_name, value));
    }
    if !fits_bits(&magnitude, bits) {
        return Err(AuthError::type_mismatch(type_name, value));
    }
    Ok(magnitude)
}

/// Two's complement over the full 256-bit word, range-checked to N bits
fn encode_int(type_name: &str, bits: u32, value: &serde_json::Value) -> AuthResult<[u8; 32]> {
    let (negative, magnitude) = parse_integer(type_name, value)?;

    if !negative || is_zero(&magnitude) {
        if !fits_bits(&magnitude, bits - 1) {
            return Err(AuthError::type_mismatch(type_name, value));
        }
        return Ok(magnitude);
    }

    // -2^(N-1) is the smallest value: magnitude - 1 must fit in N-1 bits
    if !fits_bits(&decrement(magnitude), bits - 1) {
        return Err(AuthError::type_mismatch(type_name, value));
    }
    Ok(negate(magnitude))
}

/// Parse a JSON number, decimal string or hex string into sign + magnitude
pub(crate) fn parse_integer(type_name: &str, value: &serde_json::Value) -> AuthResult<(bool, [u8; 32])> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok((false, word_from_u64(u)));
            }
            if let Some(i) = n.as_i64() {
                return Ok((i < 0, word_from_u64(i.unsigned_abs())));
            }
            // floats and numbers beyond 64 bits lose precision in JSON
            Err(AuthError::type_mismatch(type_name, value))
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            let (negative, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s),
            };

            let magnitude = if digits.starts_with("0x") || digits.starts_with("0X") {
                parse_hex_word(strip_hex_prefix(digits))
            } else {
                parse_decimal_word(digits)
            }
            .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;

            Ok((negative, magnitude))
        }
        _ => Err(AuthError::type_mismatch(type_name, value)),
    }
}

/// Left-pad a u64 into a big-endian word
pub(crate) fn word_from_u64(n: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&n.to_be_bytes());
    word
}

fn parse_decimal_word(digits: &str) -> Option<[u8; 32]> {
    if digits.is_empty() {
        return None;
    }

    let mut word = [0u8; 32];
    for ch in digits.chars() {
        let mut carry = ch.to_digit(10)?;
        for byte in word.iter_mut().rev() {
            let v = u32::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return None;
        }
    }

    Some(word)
}

fn parse_hex_word(digits: &str) -> Option<[u8; 32]> {
    let digits = digits.trim_start_matches('0');
    if digits.len() > 64 {
        return None;
    }

    let padded = format!("{:0>64}", digits);
    let mut word = [0u8; 32];
    hex::decode_to_slice(padded, &mut word).ok()?;
    Some(word)
}

fn is_zero(word: &[u8; 32]) -> bool {
    word.iter().all(|b| *b == 0)
}

/// True when every bit at position >= `bits` is zero
fn fits_bits(word: &[u8; 32], bits: u32) -> bool {
    let bits = bits as usize;
    let full_bytes = 32 - bits.div_ceil(8);
    if word[..full_bytes].iter().any(|b| *b != 0) {
        return false;
    }

    match bits % 8 {
        0 => true,
        rem => word[full_bytes] >> rem == 0,
    }
}

fn decrement(mut word: [u8; 32]) -> [u8; 32] {
    for byte in word.iter_mut().rev() {
        let (v, borrow) = byte.overflowing_sub(1);
        *byte = v;
        if !borrow {
            break;
        }
    }
    word
}

fn negate(mut word: [u8; 32]) -> [u8; 32] {
    for byte in word.iter_mut() {
        *byte = !*byte;
    }

    for byte in word.iter_mut().rev() {
        let (v, carry) = byte.overflowing_add(1);
        *byte = v;
        if !carry {
            break;
        }
    }
    word
}

/// Decode a `0x` hex string value
fn parse_hex_value(type_name: &str, value: &serde_json::Value) -> AuthResult<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| AuthError::type_mismatch(type_name, value))?;
    hex::decode(strip_hex_prefix(text)).map_err(|_| AuthError::type_mismatch(type_name, value))
}
