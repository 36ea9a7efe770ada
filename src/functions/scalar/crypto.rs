// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Digests, base64 and UUID functions
//!
//! Digests hash the argument's bytes in its own character set and return
//! lowercase hex in the connection collation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};
use rand::RngCore;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use uuid::Uuid;

use super::string::charset_bytes;
use super::{
    bytes_of, cast_each, int_of, int_type, register_all, string_type, text_of, uint_type, Bound,
    Builtin, Signature,
};
use crate::core::{Datum, Error, EvalType, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};

/// Longest buffer RANDOM_BYTES will produce
const MAX_RANDOM_BYTES: i64 = 1024;

/// TO_BASE64 breaks its output into lines of this many characters
const BASE64_LINE: usize = 76;

pub fn register(registry: &FunctionRegistry) {
    let sha1 = Builtin::new("SHA1", Sig::exact(1), resolve_digest, eval_sha1);
    register_all(
        registry,
        vec![
            Builtin::new("MD5", Sig::exact(1), resolve_digest, eval_md5)
                .describe("128-bit MD5 checksum as hex"),
            sha1,
            sha1.alias("SHA"),
            Builtin::new("SHA2", Sig::exact(2), resolve_sha2, eval_sha2)
                .describe("SHA-224/256/384/512 checksum as hex"),
            Builtin::new("CRC32", Sig::exact(1), resolve_crc32, eval_crc32),
            Builtin::new("RANDOM_BYTES", Sig::exact(1), resolve_random_bytes, eval_random_bytes)
                .volatile(),
            Builtin::new("TO_BASE64", Sig::exact(1), resolve_digest, eval_to_base64),
            Builtin::new("FROM_BASE64", Sig::exact(1), resolve_from_base64, eval_from_base64),
            Builtin::new("UUID", Sig::exact(0), resolve_uuid, eval_uuid)
                .volatile()
                .describe("Time-based UUID"),
            Builtin::new("UUID_TO_BIN", Sig::new(1, 2), resolve_uuid_to_bin, eval_uuid_to_bin),
            Builtin::new("BIN_TO_UUID", Sig::new(1, 2), resolve_bin_to_uuid, eval_bin_to_uuid),
            Builtin::new("IS_UUID", Sig::exact(1), resolve_is_uuid, eval_is_uuid),
        ],
    );
}

// ============================================================================
// RESOLVE
// ============================================================================

/// Strings pass through so their charset bytes are hashed
fn text_arg(arg: &ArgType, plan: &PlanContext) -> Option<FieldType> {
    match arg.eval_type() {
        EvalType::String => None,
        _ => Some(string_type(plan.collation)),
    }
}

fn resolve_digest(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)).casts(vec![text_arg(&args[0], plan)]))
}

fn resolve_sha2(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let mut casts = cast_each(&args[1..], &[int_type()]);
    casts.insert(0, text_arg(&args[0], plan));
    Ok(Signature::new(string_type(plan.collation)).casts(casts))
}

fn resolve_crc32(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(uint_type()).casts(vec![text_arg(&args[0], plan)]))
}

fn resolve_random_bytes(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::varbinary()).casts(cast_each(args, &[int_type()])))
}

fn resolve_from_base64(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::varbinary()).casts(vec![text_arg(&args[0], plan)]))
}

fn resolve_uuid(_args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)))
}

fn resolve_uuid_to_bin(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let mut casts = vec![text_arg(&args[0], plan)];
    casts.extend(cast_each(&args[1..], &[int_type()]));
    Ok(Signature::new(FieldType::varbinary()).casts(casts))
}

fn resolve_bin_to_uuid(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let mut casts = vec![text_arg(&args[0], plan)];
    casts.extend(cast_each(&args[1..], &[int_type()]));
    Ok(Signature::new(string_type(plan.collation)).casts(casts))
}

fn resolve_is_uuid(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::boolean()).casts(vec![text_arg(&args[0], plan)]))
}

// ============================================================================
// DIGESTS
// ============================================================================

fn eval_md5(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(hex::encode(Md5::digest(charset_bytes(&args[0])))))
}

fn eval_sha1(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(hex::encode(Sha1::digest(charset_bytes(&args[0])))))
}

fn eval_sha2(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let data = charset_bytes(&args[0]);
    let out = match int_of(&args[1]) {
        224 => hex::encode(Sha224::digest(&data)),
        0 | 256 => hex::encode(Sha256::digest(&data)),
        384 => hex::encode(Sha384::digest(&data)),
        512 => hex::encode(Sha512::digest(&data)),
        _ => return Ok(Datum::Null),
    };
    Ok(b.text(out))
}

fn eval_crc32(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::UInt(crc32fast::hash(&charset_bytes(&args[0])) as u64))
}

fn eval_random_bytes(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let n = int_of(&args[0]);
    if !(1..=MAX_RANDOM_BYTES).contains(&n) {
        return Err(Error::out_of_range("length", "random_bytes"));
    }
    let mut buf = vec![0u8; n as usize];
    rand::thread_rng().fill_bytes(&mut buf);
    Ok(Datum::bytes(buf))
}

// ============================================================================
// BASE64
// ============================================================================

fn eval_to_base64(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let encoded = STANDARD.encode(charset_bytes(&args[0]));
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE);
    for (n, chunk) in encoded.as_bytes().chunks(BASE64_LINE).enumerate() {
        if n > 0 {
            out.push('\n');
        }
        out.push_str(&String::from_utf8_lossy(chunk));
    }
    Ok(b.text(out))
}

/// Whitespace between groups is skipped; anything else invalid is NULL
fn eval_from_base64(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let compact: Vec<u8> = bytes_of(&args[0])
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(match STANDARD.decode(compact) {
        Ok(bytes) => Datum::bytes(bytes),
        Err(_) => Datum::Null,
    })
}

// ============================================================================
// UUID
// ============================================================================

fn eval_uuid(_args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mut node = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut node);
    // multicast bit marks a node id that is not a real MAC address
    node[0] |= 0x01;
    Ok(b.text(Uuid::now_v1(&node).hyphenated().to_string()))
}

/// Accepts 32 hex digits, the hyphenated form, or the braced form
fn parse_uuid(text: &str) -> Option<Uuid> {
    let inner = match text.strip_prefix('{') {
        Some(rest) => rest.strip_suffix('}')?,
        None => text,
    };
    match inner.len() {
        32 | 36 => Uuid::try_parse(inner).ok(),
        _ => None,
    }
}

/// Moves the time-high group to the front so values sort by time
fn swap_time(mut bytes: [u8; 16]) -> [u8; 16] {
    let head = bytes;
    bytes[0..2].copy_from_slice(&head[6..8]);
    bytes[2..4].copy_from_slice(&head[4..6]);
    bytes[4..8].copy_from_slice(&head[0..4]);
    bytes
}

fn unswap_time(mut bytes: [u8; 16]) -> [u8; 16] {
    let head = bytes;
    bytes[0..4].copy_from_slice(&head[4..8]);
    bytes[4..6].copy_from_slice(&head[2..4]);
    bytes[6..8].copy_from_slice(&head[0..2]);
    bytes
}

fn swap_flag(args: &[Datum]) -> bool {
    args.get(1).is_some_and(|d| int_of(d) != 0)
}

fn eval_uuid_to_bin(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let text = text_of(&args[0]);
    let uuid = parse_uuid(&text).ok_or_else(|| Error::WrongValueForType {
        type_name: "string".to_string(),
        value: text.to_string(),
        function: "uuid_to_bin".to_string(),
    })?;
    let bytes = *uuid.as_bytes();
    let bytes = if swap_flag(args) { swap_time(bytes) } else { bytes };
    Ok(Datum::bytes(bytes))
}

fn eval_bin_to_uuid(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let raw = charset_bytes(&args[0]);
    let bytes: [u8; 16] = raw.as_slice().try_into().map_err(|_| Error::WrongValueForType {
        type_name: "string".to_string(),
        value: hex::encode(&raw),
        function: "bin_to_uuid".to_string(),
    })?;
    let bytes = if swap_flag(args) { unswap_time(bytes) } else { bytes };
    Ok(b.text(Uuid::from_bytes(bytes).hyphenated().to_string()))
}

fn eval_is_uuid(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::boolean(parse_uuid(&text_of(&args[0])).is_some()))
}
