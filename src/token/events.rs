//! Typed views over token events.

use alloy::primitives::Address;

use crate::blockchain::types::Amount;
use crate::contract::events::{EventRecord, LogMeta};
use crate::error::SdkError;

/// `Transfer(from, to, value)`. Mints come from and burns go to the zero address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: Amount,
    pub meta: LogMeta,
}

impl TryFrom<EventRecord> for TransferEvent {
    type Error = SdkError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        record.expect_kind("Transfer")?;
        Ok(Self {
            from: record.get("from")?,
            to: record.get("to")?,
            value: record.get("value")?,
            meta: record.meta,
        })
    }
}

/// `Approval(owner, spender, value)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub value: Amount,
    pub meta: LogMeta,
}

impl TryFrom<EventRecord> for ApprovalEvent {
    type Error = SdkError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        record.expect_kind("Approval")?;
        Ok(Self {
            owner: record.get("owner")?,
            spender: record.get("spender")?,
            value: record.get("value")?,
            meta: record.meta,
        })
    }
}

/// `OwnershipTransferred(previousOwner, newOwner)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipTransferredEvent {
    pub previous_owner: Address,
    pub new_owner: Address,
    pub meta: LogMeta,
}

impl TryFrom<EventRecord> for OwnershipTransferredEvent {
    type Error = SdkError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        record.expect_kind("OwnershipTransferred")?;
        Ok(Self {
            previous_owner: record.get("previousOwner")?,
            new_owner: record.get("newOwner")?,
            meta: record.meta,
        })
    }
}
