//! Stake ledger records and typed event views.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{keccak256, Address, B256};

use crate::blockchain::types::{Amount, DeviceId};
use crate::contract::events::{EventRecord, LogMeta};
use crate::contract::value::FromSolValue;
use crate::error::SdkError;

/// Ledger entry for one DeviceID.
///
/// `exists == false` means the device has never staked; amount and wallet are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeRecord {
    pub amount: Amount,
    pub device_id: DeviceId,
    pub wallet_address: Address,
    pub exists: bool,
}

impl StakeRecord {
    /// Record for a device with no stake.
    pub fn absent(device_id: DeviceId) -> Self {
        Self {
            amount: Amount::ZERO,
            device_id,
            wallet_address: Address::ZERO,
            exists: false,
        }
    }
}

/// Decodes the `(uint256 amount, string deviceID, address walletAddress, bool exists)` tuple.
impl FromSolValue for StakeRecord {
    fn from_sol_value(value: DynSolValue) -> Result<Self, String> {
        let fields = value
            .as_tuple()
            .ok_or_else(|| format!("expected stake info tuple, got {value:?}"))?
            .to_vec();
        let [amount, device_id, wallet_address, exists]: [DynSolValue; 4] = fields
            .try_into()
            .map_err(|f: Vec<DynSolValue>| format!("stake info has {} fields, expected 4", f.len()))?;

        Ok(Self {
            amount: Amount::from_sol_value(amount)?,
            device_id: DeviceId::new(String::from_sol_value(device_id)?),
            wallet_address: Address::from_sol_value(wallet_address)?,
            exists: bool::from_sol_value(exists)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeEventKind {
    Deposited,
    Withdrawn,
}

impl StakeEventKind {
    pub fn event_name(self) -> &'static str {
        match self {
            StakeEventKind::Deposited => "StakeDeposited",
            StakeEventKind::Withdrawn => "StakeWithdrawn",
        }
    }
}

/// `StakeDeposited` / `StakeWithdrawn`.
///
/// The device ID is indexed as a string, so logs carry only its keccak-256 hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeEvent {
    pub kind: StakeEventKind,
    pub device_id_hash: B256,
    pub wallet_address: Address,
    pub amount: Amount,
    pub meta: LogMeta,
}

impl StakeEvent {
    /// Whether this event belongs to `device_id`.
    pub fn is_for(&self, device_id: &DeviceId) -> bool {
        self.device_id_hash == keccak256(device_id.as_str())
    }
}

impl TryFrom<EventRecord> for StakeEvent {
    type Error = SdkError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let kind = match record.kind.as_str() {
            "StakeDeposited" => StakeEventKind::Deposited,
            "StakeWithdrawn" => StakeEventKind::Withdrawn,
            other => {
                return Err(SdkError::decode(
                    "StakeEvent",
                    format!("record is a {other} event"),
                ))
            }
        };
        Ok(Self {
            kind,
            device_id_hash: record.get("deviceID")?,
            wallet_address: record.get("walletAddress")?,
            amount: record.get("amount")?,
            meta: record.meta,
        })
    }
}
