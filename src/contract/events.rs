//! Decoded contract events and indexed-field filters.
//!
//! # Design Decisions
//! - One tagged record type for every event kind; typed views convert from it
//! - Indexed `string`/`bytes` fields are only available as their keccak-256 topic

use alloy::dyn_abi::{DynSolType, DynSolValue, EventExt, Specifier};
use alloy::json_abi::Event;
use alloy::primitives::{keccak256, Address, TxHash, B256};
use alloy::rpc::types::Log;

use crate::contract::value::FromSolValue;
use crate::error::{SdkError, SdkResult};

/// One named event field.
#[derive(Debug, Clone, PartialEq)]
pub struct EventField {
    pub name: String,
    pub value: DynSolValue,
    pub indexed: bool,
}

/// Where a log came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMeta {
    pub address: Address,
    pub block_number: Option<u64>,
    pub block_hash: Option<B256>,
    pub transaction_hash: Option<TxHash>,
    pub log_index: Option<u64>,
    /// Set when the log was dropped by a reorg.
    pub removed: bool,
}

impl From<&Log> for LogMeta {
    fn from(log: &Log) -> Self {
        Self {
            address: log.inner.address,
            block_number: log.block_number,
            block_hash: log.block_hash,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
            removed: log.removed,
        }
    }
}

/// A decoded event of any kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event name, e.g. `Transfer`.
    pub kind: String,
    /// Fields in declaration order.
    pub fields: Vec<EventField>,
    pub meta: LogMeta,
}

impl EventRecord {
    /// Raw value of a field.
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Field converted to `T`. Missing fields and type mismatches are decode errors.
    pub fn get<T: FromSolValue>(&self, name: &str) -> SdkResult<T> {
        let value = self
            .field(name)
            .cloned()
            .ok_or_else(|| SdkError::decode(&self.kind, format!("missing field {name}")))?;
        T::from_sol_value(value).map_err(|reason| {
            SdkError::decode(format!("{}.{name}", self.kind), reason)
        })
    }

    /// Fail unless this record is a `kind` event.
    pub(crate) fn expect_kind(&self, kind: &str) -> SdkResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(SdkError::decode(
                kind,
                format!("record is a {} event", self.kind),
            ))
        }
    }
}

/// Decode a raw log emitted by `address` as `event`.
pub(crate) fn decode_log(event: &Event, address: Address, log: &Log) -> SdkResult<EventRecord> {
    if log.inner.address != address {
        return Err(SdkError::decode(
            &event.name,
            format!("log emitted by {}, expected {address}", log.inner.address),
        ));
    }

    if !event.anonymous {
        let selector = event.selector();
        match log.inner.data.topics().first() {
            Some(topic) if *topic == selector => {}
            Some(topic) => {
                return Err(SdkError::decode(
                    &event.name,
                    format!("topic 0 is {topic}, expected {selector}"),
                ));
            }
            None => return Err(SdkError::decode(&event.name, "log has no topics")),
        }
    }

    let decoded = event
        .decode_log(&log.inner.data)
        .map_err(|e| SdkError::decode(&event.name, e))?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut fields = Vec::with_capacity(event.inputs.len());

    for param in &event.inputs {
        let value = if param.indexed {
            indexed.next()
        } else {
            body.next()
        };
        let value = value.ok_or_else(|| {
            SdkError::decode(&event.name, format!("missing value for {}", param.name))
        })?;
        fields.push(EventField {
            name: param.name.clone(),
            value,
            indexed: param.indexed,
        });
    }

    Ok(EventRecord {
        kind: event.name.clone(),
        fields,
        meta: LogMeta::from(log),
    })
}

/// Positional constraints on an event's indexed fields.
///
/// Rule `i` applies to the `i`-th indexed field; an empty rule matches anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallFilter {
    rules: Vec<Vec<DynSolValue>>,
}

impl CallFilter {
    /// Match every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rule for the next indexed field.
    pub fn rule(mut self, values: Vec<DynSolValue>) -> Self {
        self.rules.push(values);
        self
    }

    /// Append a rule matching any of `addresses`.
    pub fn addresses(self, addresses: &[Address]) -> Self {
        self.rule(addresses.iter().copied().map(DynSolValue::Address).collect())
    }

    /// Append a rule matching any of `values`.
    pub fn strings<S: AsRef<str>>(self, values: &[S]) -> Self {
        self.rule(
            values
                .iter()
                .map(|s| DynSolValue::String(s.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rules.iter().all(|r| r.is_empty())
    }

    /// Topic sets for `event`; position 0 is the selector.
    pub(crate) fn topics(&self, event: &Event) -> SdkResult<Vec<Vec<B256>>> {
        let indexed: Vec<_> = event.inputs.iter().filter(|p| p.indexed).collect();
        if self.rules.len() > indexed.len() {
            return Err(SdkError::Abi(format!(
                "{} has {} indexed fields, filter has {} rules",
                event.name,
                indexed.len(),
                self.rules.len()
            )));
        }

        let mut topics = Vec::with_capacity(self.rules.len() + 1);
        topics.push(if event.anonymous {
            Vec::new()
        } else {
            vec![event.selector()]
        });

        for (param, values) in indexed.iter().zip(&self.rules) {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| SdkError::Abi(format!("{}.{}: {e}", event.name, param.name)))?;
            let set = values
                .iter()
                .map(|value| topic_for(&ty, value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| {
                    SdkError::Abi(format!("{}.{}: {reason}", event.name, param.name))
                })?;
            topics.push(set);
        }

        Ok(topics)
    }
}

/// Topic word an indexed value is stored as.
fn topic_for(ty: &DynSolType, value: &DynSolValue) -> Result<B256, String> {
    if !ty.matches(value) {
        return Err(format!("filter value {value:?} does not match type {ty}"));
    }
    match value {
        DynSolValue::String(s) => Ok(keccak256(s.as_bytes())),
        DynSolValue::Bytes(b) => Ok(keccak256(b)),
        other => other
            .as_word()
            .ok_or_else(|| format!("unsupported indexed type {ty}")),
    }
}
