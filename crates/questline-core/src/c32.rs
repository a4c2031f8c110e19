// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crockford-style base32 (c32) and c32check address encoding.
//!
//! Addresses look like `S` + version character + c32(hash160 ++ checksum),
//! where the checksum is the first four bytes of `sha256(sha256(version ++ hash160))`.

use sha2::{Digest, Sha256};

use crate::error::QuestlineError;

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Mainnet single-sig address version (`SP...`).
pub const VERSION_MAINNET_SINGLESIG: u8 = 22;
/// Mainnet multi-sig address version (`SM...`).
pub const VERSION_MAINNET_MULTISIG: u8 = 20;
/// Testnet single-sig address version (`ST...`).
pub const VERSION_TESTNET_SINGLESIG: u8 = 26;
/// Testnet multi-sig address version (`SN...`).
pub const VERSION_TESTNET_MULTISIG: u8 = 21;

fn digit_value(c: u8) -> Option<u8> {
    let c = match c.to_ascii_uppercase() {
        b'O' => b'0',
        b'L' | b'I' => b'1',
        other => other,
    };
    C32_ALPHABET.iter().position(|&a| a == c).map(|p| p as u8)
}

/// Encodes bytes as c32, preserving leading zero bytes as leading `0` digits.
pub fn encode(input: &[u8]) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(input.len() * 8 / 5 + 1);
    let mut carry: u32 = 0;
    let mut carry_bits: u32 = 0;

    for &byte in input.iter().rev() {
        let byte = u32::from(byte);
        let low_bits_to_take = 5 - carry_bits;
        let low_bits = byte & ((1 << low_bits_to_take) - 1);
        out.push(C32_ALPHABET[((low_bits << carry_bits) + carry) as usize]);
        carry_bits = 8 + carry_bits - 5;
        carry = byte >> (8 - carry_bits);
        if carry_bits >= 5 {
            out.push(C32_ALPHABET[(carry & 0x1f) as usize]);
            carry_bits -= 5;
            carry >>= 5;
        }
    }
    if carry_bits > 0 {
        out.push(C32_ALPHABET[carry as usize]);
    }

    while out.last() == Some(&C32_ALPHABET[0]) {
        out.pop();
    }
    for &byte in input {
        if byte != 0 {
            break;
        }
        out.push(C32_ALPHABET[0]);
    }

    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Decodes a c32 string. Accepts lowercase and the `O`/`L`/`I` aliases.
pub fn decode(input: &str) -> Result<Vec<u8>, QuestlineError> {
    let digits = input
        .bytes()
        .rev()
        .map(|c| {
            digit_value(c)
                .ok_or_else(|| QuestlineError::Codec(format!("invalid c32 character `{}`", c as char)))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let mut out = Vec::with_capacity(digits.len() * 5 / 8 + 1);
    let mut carry: u32 = 0;
    let mut carry_bits: u32 = 0;
    for &digit in &digits {
        carry += u32::from(digit) << carry_bits;
        carry_bits += 5;
        if carry_bits >= 8 {
            out.push((carry & 0xff) as u8);
            carry_bits -= 8;
            carry >>= 8;
        }
    }
    if carry_bits > 0 {
        out.push(carry as u8);
    }

    while out.last() == Some(&0) {
        out.pop();
    }
    for &digit in digits.iter().rev() {
        if digit != 0 {
            break;
        }
        out.push(0);
    }

    out.reverse();
    Ok(out)
}

fn checksum(version: u8, payload: &[u8]) -> [u8; 4] {
    let mut first = Sha256::new();
    first.update([version]);
    first.update(payload);
    let second = Sha256::digest(first.finalize());
    [second[0], second[1], second[2], second[3]]
}

/// Encodes `version` and a 20-byte hash as a `S`-prefixed address.
pub fn encode_address(version: u8, hash160: &[u8; 20]) -> Result<String, QuestlineError> {
    if version >= 32 {
        return Err(QuestlineError::Codec(format!(
            "address version {version} does not fit in one c32 digit"
        )));
    }
    let mut body = hash160.to_vec();
    body.extend_from_slice(&checksum(version, hash160));
    Ok(format!(
        "S{}{}",
        C32_ALPHABET[version as usize] as char,
        encode(&body)
    ))
}

/// Decodes a `S`-prefixed address into its version and 20-byte hash, verifying the checksum.
pub fn decode_address(address: &str) -> Result<(u8, [u8; 20]), QuestlineError> {
    let rest = address
        .strip_prefix('S')
        .ok_or_else(|| QuestlineError::Codec(format!("address `{address}` must start with `S`")))?;
    let mut chars = rest.bytes();
    let version = chars
        .next()
        .and_then(digit_value)
        .ok_or_else(|| QuestlineError::Codec(format!("address `{address}` has no version")))?;

    let data = decode(&rest[1..])?;
    if data.len() != 24 {
        return Err(QuestlineError::Codec(format!(
            "address `{address}` decodes to {} bytes, expected 24",
            data.len()
        )));
    }
    let (payload, sum) = data.split_at(20);
    if checksum(version, payload) != sum {
        return Err(QuestlineError::Codec(format!(
            "address `{address}` has a bad checksum"
        )));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(payload);
    Ok((version, hash))
}
