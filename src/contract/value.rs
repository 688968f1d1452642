//! Strict conversion of decoded ABI values into Rust types.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, B256, U256};

/// A Rust type a decoded ABI value converts into without coercion.
///
/// The error string describes the mismatch; callers attach the method or
/// event it came from.
pub trait FromSolValue: Sized {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &DynSolValue) -> String {
    match value.sol_type_name() {
        Some(actual) => format!("expected {expected}, got {actual}"),
        None => format!("expected {expected}, got {value:?}"),
    }
}

impl FromSolValue for U256 {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::Uint(v, 256) => Ok(v),
            other => Err(mismatch("uint256", &other)),
        }
    }
}

impl FromSolValue for u8 {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::Uint(v, _) => {
                u8::try_from(v).map_err(|_| format!("{v} does not fit in uint8"))
            }
            other => Err(mismatch("uint8", &other)),
        }
    }
}

impl FromSolValue for String {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromSolValue for Address {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::Address(a) => Ok(a),
            other => Err(mismatch("address", &other)),
        }
    }
}

impl FromSolValue for bool {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromSolValue for Bytes {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::Bytes(b) => Ok(Bytes::from(b)),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

/// Topic word of an indexed dynamic value (`string`, `bytes`) or a `bytes32`.
impl FromSolValue for B256 {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        match value {
            DynSolValue::FixedBytes(word, 32) => Ok(word),
            other => Err(mismatch("bytes32", &other)),
        }
    }
}
