//! Stake orchestrator: the approve → wait-mined → stake workflow and the
//! other StakeWallet ledger operations.
//!
//! # Workflow
//! ```text
//! Authenticated
//!     → approve(stake contract, amount) on the token      [ApprovalSubmitted]
//!     → wait until mined, bounded by the policy deadline   [ApprovalConfirmed]
//!     → stake(amount, deviceID, caller) on the ledger      [StakeSubmitted]
//! ```
//!
//! # Invariants
//! - Exactly one approval per stake; the stake call is never sent unless that
//!   approval was mined successfully
//! - Both submissions are signed from the same credential snapshot
//! - Failures carry the phase they happened in

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, TxHash};

use crate::blockchain::client::ChainConnection;
use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::types::{Amount, BlockRange, DeviceId};
use crate::contract::binding::ContractBinding;
use crate::contract::events::CallFilter;
use crate::contract::logs::LogQuery;
use crate::contract::subscription::LogSubscription;
use crate::error::{SdkError, SdkResult, StakePhase};
use crate::stake::record::{StakeEvent, StakeEventKind, StakeRecord};
use crate::token::facade::TokenFacade;

/// Progress of one stake operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakeState {
    Unauthenticated,
    Authenticated { from: Address },
    ApprovalSubmitted { tx_hash: TxHash },
    ApprovalConfirmed { block_number: u64 },
    /// Terminal success.
    StakeSubmitted { tx_hash: TxHash },
    /// Terminal failure.
    Failed { reason: String },
}

fn amount(value: Amount) -> DynSolValue {
    DynSolValue::Uint(value, 256)
}

fn device(id: &DeviceId) -> DynSolValue {
    DynSolValue::String(id.as_str().to_string())
}

#[derive(Debug, Clone)]
pub struct StakeOrchestrator {
    connection: ChainConnection,
    token: TokenFacade,
    binding: ContractBinding,
}

impl StakeOrchestrator {
    pub fn new(connection: ChainConnection, token: TokenFacade, binding: ContractBinding) -> Self {
        Self {
            connection,
            token,
            binding,
        }
    }

    /// Stake contract address (the approval spender).
    pub fn address(&self) -> Address {
        self.binding.address()
    }

    pub fn binding(&self) -> &ContractBinding {
        &self.binding
    }

    /// Approve, wait for the approval to be mined, then stake.
    ///
    /// Returns the submitted stake transaction; awaiting it is up to the caller.
    pub async fn stake(&self, value: Amount, device_id: &DeviceId) -> SdkResult<PendingTransaction> {
        self.stake_observed(value, device_id, |_| {}).await
    }

    /// [`stake`](Self::stake), reporting every state entered to `on_transition`.
    pub async fn stake_observed<F>(
        &self,
        value: Amount,
        device_id: &DeviceId,
        mut on_transition: F,
    ) -> SdkResult<PendingTransaction>
    where
        F: FnMut(&StakeState) + Send,
    {
        let mut enter = |state: StakeState| {
            tracing::info!(device_id = %device_id, state = ?state, "Stake state transition");
            on_transition(&state);
        };

        enter(StakeState::Unauthenticated);
        let ctx = match self.connection.transact_options() {
            Ok(ctx) => ctx,
            Err(e) => {
                enter(StakeState::Failed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        enter(StakeState::Authenticated { from: ctx.from() });

        let approval = match self.token.approve(&ctx, self.address(), value).await {
            Ok(tx) => tx,
            Err(e) => return Err(fail(&mut enter, e.in_phase(StakePhase::Approve))),
        };
        enter(StakeState::ApprovalSubmitted {
            tx_hash: approval.hash(),
        });

        let policy = self.connection.confirmation_policy();
        let receipt = match approval.confirm(&policy).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(fail(&mut enter, e.in_phase(StakePhase::Approve))),
        };
        enter(StakeState::ApprovalConfirmed {
            block_number: receipt.block_number,
        });

        let args = [amount(value), device(device_id), DynSolValue::Address(ctx.from())];
        let stake = match self.binding.transact(&ctx, "stake", &args).await {
            Ok(tx) => tx,
            Err(e) => return Err(fail(&mut enter, e.in_phase(StakePhase::Stake))),
        };
        enter(StakeState::StakeSubmitted {
            tx_hash: stake.hash(),
        });

        Ok(stake)
    }

    /// Ledger entry for `device_id`. Unknown devices yield `exists == false`.
    pub async fn get_stake_info(&self, device_id: &DeviceId) -> SdkResult<StakeRecord> {
        let record: StakeRecord = self
            .binding
            .call_one("getStakeInfo", &[device(device_id)])
            .await?;

        if record.exists {
            Ok(record)
        } else {
            Ok(StakeRecord::absent(device_id.clone()))
        }
    }

    pub async fn get_balance(&self, device_id: &DeviceId) -> SdkResult<Amount> {
        self.binding
            .call_one("getBalanceByDeviceID", &[device(device_id)])
            .await
    }

    /// Withdraw `value` from `device_id`'s stake to its bound wallet.
    pub async fn withdraw_stake(
        &self,
        device_id: &DeviceId,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        let ctx = self.connection.transact_options()?;
        self.binding
            .transact(&ctx, "withdrawFunds", &[device(device_id), amount(value)])
            .await
    }

    /// Move `value` of stake from `creator` to `solver`.
    pub async fn transfer_payment(
        &self,
        creator: &DeviceId,
        solver: &DeviceId,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        let ctx = self.connection.transact_options()?;
        self.binding
            .transact(
                &ctx,
                "transferPayment",
                &[device(creator), device(solver), amount(value)],
            )
            .await
    }

    /// Rebind `device_id` to `new_address`.
    pub async fn update_wallet_address(
        &self,
        device_id: &DeviceId,
        new_address: Address,
    ) -> SdkResult<PendingTransaction> {
        let ctx = self.connection.transact_options()?;
        self.binding
            .transact(
                &ctx,
                "updateWalletAddress",
                &[device(device_id), DynSolValue::Address(new_address)],
            )
            .await
    }

    // Events. Empty slices match anything.

    pub fn deposit_logs(
        &self,
        device_ids: &[DeviceId],
        wallets: &[Address],
        range: BlockRange,
    ) -> SdkResult<LogQuery<StakeEvent>> {
        self.stake_logs(StakeEventKind::Deposited, device_ids, wallets, range)
    }

    pub fn withdrawal_logs(
        &self,
        device_ids: &[DeviceId],
        wallets: &[Address],
        range: BlockRange,
    ) -> SdkResult<LogQuery<StakeEvent>> {
        self.stake_logs(StakeEventKind::Withdrawn, device_ids, wallets, range)
    }

    pub async fn subscribe_deposits(
        &self,
        device_ids: &[DeviceId],
        wallets: &[Address],
    ) -> SdkResult<LogSubscription<StakeEvent>> {
        let filter = CallFilter::new().strings(device_ids).addresses(wallets);
        self.binding
            .subscribe_map(
                StakeEventKind::Deposited.event_name(),
                &filter,
                StakeEvent::try_from,
            )
            .await
    }

    fn stake_logs(
        &self,
        kind: StakeEventKind,
        device_ids: &[DeviceId],
        wallets: &[Address],
        range: BlockRange,
    ) -> SdkResult<LogQuery<StakeEvent>> {
        let filter = CallFilter::new().strings(device_ids).addresses(wallets);
        Ok(self
            .binding
            .query_logs(kind.event_name(), &filter, range)?
            .map(StakeEvent::try_from))
    }
}

fn fail<F: FnMut(StakeState)>(enter: &mut F, err: SdkError) -> SdkError {
    tracing::warn!(error = %err, phase = ?err.phase(), "Stake aborted");
    enter(StakeState::Failed {
        reason: err.to_string(),
    });
    err
}
