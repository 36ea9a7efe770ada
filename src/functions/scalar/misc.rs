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

//! Information and miscellaneous functions
//!
//! `CHARSET()`, `COLLATION()` and `COERCIBILITY()` describe the static
//! derivation of their argument, so they are answered at resolve time.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::{cast_each, register_all, string_type, text_of, Aux, Bound, Builtin, Signature};
use crate::collation::{Coercibility, Derivation, Repertoire, UTF8MB3_GENERAL_CI};
use crate::core::{Datum, Error, EvalType, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};
use crate::version;

pub fn register(registry: &FunctionRegistry) {
    let database = Builtin::new("DATABASE", Sig::exact(0), resolve_sysinfo, eval_database);
    let user = Builtin::new("USER", Sig::exact(0), resolve_sysinfo, eval_user);
    register_all(
        registry,
        vec![
            Builtin::new("VERSION", Sig::exact(0), resolve_sysinfo, eval_version),
            database,
            database.alias("SCHEMA"),
            user,
            user.alias("SESSION_USER"),
            user.alias("SYSTEM_USER"),
            Builtin::new("CURRENT_USER", Sig::exact(0), resolve_sysinfo, eval_current_user),
            Builtin::new("CONNECTION_ID", Sig::exact(0), resolve_connection_id, eval_connection_id),
            Builtin::new("CHARSET", Sig::exact(1), resolve_charset, eval_described).tolerant(),
            Builtin::new("COLLATION", Sig::exact(1), resolve_collation, eval_described).tolerant(),
            Builtin::new("COERCIBILITY", Sig::exact(1), resolve_coercibility, eval_coercibility)
                .tolerant(),
            Builtin::new("NAME_CONST", Sig::exact(2), resolve_name_const, eval_second)
                .tolerant()
                .describe("Value of a constant, named as a column"),
            Builtin::new("ANY_VALUE", Sig::exact(1), resolve_any_value, eval_first).tolerant(),
            Builtin::new("INET_ATON", Sig::exact(1), resolve_inet_aton, eval_inet_aton),
            Builtin::new("INET_NTOA", Sig::exact(1), resolve_inet_ntoa, eval_inet_ntoa),
            Builtin::new("INET6_ATON", Sig::exact(1), resolve_inet6_aton, eval_inet6_aton),
            Builtin::new("INET6_NTOA", Sig::exact(1), resolve_inet6_ntoa, eval_inet6_ntoa),
            Builtin::new("IS_IPV4", Sig::exact(1), resolve_ip_check, eval_is_ipv4),
            Builtin::new("IS_IPV6", Sig::exact(1), resolve_ip_check, eval_is_ipv6),
            Builtin::new("IS_IPV4_COMPAT", Sig::exact(1), resolve_ip_check, eval_is_ipv4_compat),
            Builtin::new("IS_IPV4_MAPPED", Sig::exact(1), resolve_ip_check, eval_is_ipv4_mapped),
        ],
    );
}

// ============================================================================
// INFORMATION FUNCTIONS
// ============================================================================

fn sysconst() -> Derivation {
    Derivation::new(&UTF8MB3_GENERAL_CI, Coercibility::SysConst, Repertoire::Unicode)
}

fn resolve_sysinfo(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(&UTF8MB3_GENERAL_CI)).derivation(sysconst()))
}

fn resolve_connection_id(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::unsigned_long_long()))
}

fn eval_version(_args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(version::server_version()))
}

fn eval_database(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(match &call.ctx.session().database {
        Some(db) => b.text(db),
        None => Datum::Null,
    })
}

fn eval_user(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(&call.ctx.session().user))
}

fn eval_current_user(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(&call.ctx.session().current_user))
}

fn eval_connection_id(_args: &[Datum], _b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::UInt(call.ctx.session().connection_id))
}

fn resolve_charset(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let name = args[0].derivation.charset().name();
    Ok(Signature::new(string_type(&UTF8MB3_GENERAL_CI))
        .derivation(sysconst())
        .aux(Aux::Text(name.to_string())))
}

fn resolve_collation(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let name = args[0].derivation.collation.name;
    Ok(Signature::new(string_type(&UTF8MB3_GENERAL_CI))
        .derivation(sysconst())
        .aux(Aux::Text(name.to_string())))
}

fn resolve_coercibility(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let level = args[0].derivation.coercibility.as_i64();
    Ok(Signature::new(FieldType::long_long()).aux(Aux::Int(level)))
}

fn eval_described(_args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    match &b.aux {
        Aux::Text(name) => Ok(b.text(name)),
        _ => Err(Error::internal("missing resolved name")),
    }
}

fn eval_coercibility(_args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    match b.aux {
        Aux::Int(level) => Ok(Datum::Int(level)),
        _ => Err(Error::internal("missing resolved coercibility")),
    }
}

// ============================================================================
// PASS-THROUGH
// ============================================================================

/// Both arguments must be constants; the result is the value
fn resolve_name_const(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    if !args[0].is_constant() || !args[1].is_constant() {
        return Err(Error::incorrect_arguments("NAME_CONST"));
    }
    Ok(Signature::new(args[1].ty.clone()).derivation(args[1].derivation))
}

fn resolve_any_value(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(args[0].ty.clone()).derivation(args[0].derivation))
}

fn eval_first(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(args[0].clone())
}

fn eval_second(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(args[1].clone())
}

// ============================================================================
// NETWORK ADDRESSES
// ============================================================================

fn resolve_inet_aton(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::unsigned_long_long())
        .casts(cast_each(args, &[string_type(plan.collation)])))
}

fn resolve_inet_ntoa(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let cast = match args[0].eval_type() {
        EvalType::Int => None,
        _ => Some(FieldType::long_long()),
    };
    Ok(Signature::new(string_type(plan.collation)).casts(vec![cast]))
}

fn resolve_inet6_aton(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::varbinary()).casts(cast_each(args, &[string_type(plan.collation)])))
}

fn resolve_inet6_ntoa(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let cast = match args[0].eval_type() {
        EvalType::String => None,
        _ => Some(string_type(plan.collation)),
    };
    Ok(Signature::new(string_type(plan.collation)).casts(vec![cast]))
}

fn resolve_ip_check(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let cast = match args[0].eval_type() {
        EvalType::String => None,
        _ => Some(string_type(plan.collation)),
    };
    Ok(Signature::new(FieldType::boolean()).casts(vec![cast]))
}

/// Dotted-quad parser with MySQL's short forms: `127.1` is `127.0.0.1`
fn inet_aton(text: &str) -> Option<u64> {
    let mut result: u64 = 0;
    let mut byte: u64 = 0;
    let mut dots = 0;
    let mut last = b'.';
    for &c in text.as_bytes() {
        last = c;
        match c {
            b'0'..=b'9' => {
                byte = byte * 10 + u64::from(c - b'0');
                if byte > 255 {
                    return None;
                }
            }
            b'.' => {
                dots += 1;
                if dots > 3 {
                    return None;
                }
                result = (result << 8) + byte;
                byte = 0;
            }
            _ => return None,
        }
    }
    if last == b'.' {
        return None;
    }
    match dots {
        1 => result <<= 16,
        2 => result <<= 8,
        _ => {}
    }
    Some((result << 8) + byte)
}

fn eval_inet_aton(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(inet_aton(&text_of(&args[0])).map_or(Datum::Null, Datum::UInt))
}

fn eval_inet_ntoa(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let n = match &args[0] {
        Datum::Int(v) => u32::try_from(*v).ok(),
        Datum::UInt(v) => u32::try_from(*v).ok(),
        _ => None,
    };
    Ok(match n {
        Some(n) => b.text(Ipv4Addr::from(n).to_string()),
        None => Datum::Null,
    })
}

fn eval_inet6_aton(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(match text_of(&args[0]).parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Datum::bytes(v4.octets()),
        Ok(IpAddr::V6(v6)) => Datum::bytes(v6.octets()),
        Err(_) => Datum::Null,
    })
}

/// Only binary strings of 4 or 16 bytes are addresses
fn eval_inet6_ntoa(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let Datum::Bytes(raw) = &args[0] else {
        return Ok(Datum::Null);
    };
    if let Ok(v4) = <[u8; 4]>::try_from(&raw[..]) {
        return Ok(b.text(Ipv4Addr::from(v4).to_string()));
    }
    Ok(match <[u8; 16]>::try_from(&raw[..]) {
        Ok(v6) => b.text(Ipv6Addr::from(v6).to_string()),
        Err(_) => Datum::Null,
    })
}

fn eval_is_ipv4(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::boolean(text_of(&args[0]).parse::<Ipv4Addr>().is_ok()))
}

fn eval_is_ipv6(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::boolean(text_of(&args[0]).parse::<Ipv6Addr>().is_ok()))
}

fn ipv6_bytes(d: &Datum) -> Option<[u8; 16]> {
    match d {
        Datum::Bytes(raw) => <[u8; 16]>::try_from(&raw[..]).ok(),
        _ => None,
    }
}

/// `::a.b.c.d`
fn eval_is_ipv4_compat(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let compat = ipv6_bytes(&args[0]).is_some_and(|b| b[..12].iter().all(|&x| x == 0));
    Ok(Datum::boolean(compat))
}

/// `::ffff:a.b.c.d`
fn eval_is_ipv4_mapped(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mapped = ipv6_bytes(&args[0])
        .is_some_and(|b| b[..10].iter().all(|&x| x == 0) && b[10] == 0xff && b[11] == 0xff);
    Ok(Datum::boolean(mapped))
}
