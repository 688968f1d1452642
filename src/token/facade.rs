//! Token facade: typed operations over the ParityToken interface.
//!
//! Reads map 1:1 onto contract calls. Writes do no local precondition checks;
//! insufficient balance or allowance surfaces as a revert when the returned
//! transaction is awaited.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes};

use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::types::{Amount, BlockRange};
use crate::blockchain::wallet::TransactContext;
use crate::contract::binding::ContractBinding;
use crate::contract::events::CallFilter;
use crate::contract::logs::LogQuery;
use crate::contract::subscription::LogSubscription;
use crate::error::SdkResult;
use crate::token::events::{ApprovalEvent, OwnershipTransferredEvent, TransferEvent};

/// Display metadata of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

fn amount(value: Amount) -> DynSolValue {
    DynSolValue::Uint(value, 256)
}

#[derive(Debug, Clone)]
pub struct TokenFacade {
    binding: ContractBinding,
}

impl TokenFacade {
    pub fn new(binding: ContractBinding) -> Self {
        Self { binding }
    }

    pub fn binding(&self) -> &ContractBinding {
        &self.binding
    }

    pub fn address(&self) -> Address {
        self.binding.address()
    }

    // Reads

    pub async fn name(&self) -> SdkResult<String> {
        self.binding.call_one("name", &[]).await
    }

    pub async fn symbol(&self) -> SdkResult<String> {
        self.binding.call_one("symbol", &[]).await
    }

    pub async fn decimals(&self) -> SdkResult<u8> {
        self.binding.call_one("decimals", &[]).await
    }

    pub async fn total_supply(&self) -> SdkResult<Amount> {
        self.binding.call_one("totalSupply", &[]).await
    }

    pub async fn balance_of(&self, owner: Address) -> SdkResult<Amount> {
        self.binding
            .call_one("balanceOf", &[DynSolValue::Address(owner)])
            .await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> SdkResult<Amount> {
        self.binding
            .call_one(
                "allowance",
                &[DynSolValue::Address(owner), DynSolValue::Address(spender)],
            )
            .await
    }

    /// Current `Ownable` owner.
    pub async fn owner(&self) -> SdkResult<Address> {
        self.binding.call_one("owner", &[]).await
    }

    /// Name, symbol and decimals, fetched concurrently.
    pub async fn token_info(&self) -> SdkResult<TokenInfo> {
        let (name, symbol, decimals) =
            tokio::try_join!(self.name(), self.symbol(), self.decimals())?;
        Ok(TokenInfo {
            name,
            symbol,
            decimals,
        })
    }

    // Writes

    pub async fn transfer(
        &self,
        ctx: &TransactContext,
        to: Address,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(ctx, "transfer", &[DynSolValue::Address(to), amount(value)])
            .await
    }

    pub async fn approve(
        &self,
        ctx: &TransactContext,
        spender: Address,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(ctx, "approve", &[DynSolValue::Address(spender), amount(value)])
            .await
    }

    pub async fn transfer_from(
        &self,
        ctx: &TransactContext,
        from: Address,
        to: Address,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(
                ctx,
                "transferFrom",
                &[
                    DynSolValue::Address(from),
                    DynSolValue::Address(to),
                    amount(value),
                ],
            )
            .await
    }

    /// Owner-only.
    pub async fn mint(
        &self,
        ctx: &TransactContext,
        to: Address,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(ctx, "mint", &[DynSolValue::Address(to), amount(value)])
            .await
    }

    /// Burn from the sender's own balance.
    pub async fn burn(&self, ctx: &TransactContext, value: Amount) -> SdkResult<PendingTransaction> {
        self.binding.transact(ctx, "burn", &[amount(value)]).await
    }

    pub async fn transfer_with_data(
        &self,
        ctx: &TransactContext,
        to: Address,
        value: Amount,
        data: Bytes,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(
                ctx,
                "transferWithData",
                &[
                    DynSolValue::Address(to),
                    amount(value),
                    DynSolValue::Bytes(data.to_vec()),
                ],
            )
            .await
    }

    /// Transfer and invoke the recipient's token callback with `data`.
    pub async fn transfer_with_data_and_callback(
        &self,
        ctx: &TransactContext,
        to: Address,
        value: Amount,
        data: Bytes,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(
                ctx,
                "transferWithDataAndCallback",
                &[
                    DynSolValue::Address(to),
                    amount(value),
                    DynSolValue::Bytes(data.to_vec()),
                ],
            )
            .await
    }

    /// Owner-only.
    pub async fn transfer_ownership(
        &self,
        ctx: &TransactContext,
        new_owner: Address,
    ) -> SdkResult<PendingTransaction> {
        self.binding
            .transact(ctx, "transferOwnership", &[DynSolValue::Address(new_owner)])
            .await
    }

    /// Owner-only. Leaves the token without an owner.
    pub async fn renounce_ownership(&self, ctx: &TransactContext) -> SdkResult<PendingTransaction> {
        self.binding.transact(ctx, "renounceOwnership", &[]).await
    }

    // Events. Empty address slices match any address.

    pub fn transfer_logs(
        &self,
        from: &[Address],
        to: &[Address],
        range: BlockRange,
    ) -> SdkResult<LogQuery<TransferEvent>> {
        let filter = CallFilter::new().addresses(from).addresses(to);
        Ok(self
            .binding
            .query_logs("Transfer", &filter, range)?
            .map(TransferEvent::try_from))
    }

    pub fn approval_logs(
        &self,
        owner: &[Address],
        spender: &[Address],
        range: BlockRange,
    ) -> SdkResult<LogQuery<ApprovalEvent>> {
        let filter = CallFilter::new().addresses(owner).addresses(spender);
        Ok(self
            .binding
            .query_logs("Approval", &filter, range)?
            .map(ApprovalEvent::try_from))
    }

    pub fn ownership_transferred_logs(
        &self,
        previous_owner: &[Address],
        new_owner: &[Address],
        range: BlockRange,
    ) -> SdkResult<LogQuery<OwnershipTransferredEvent>> {
        let filter = CallFilter::new()
            .addresses(previous_owner)
            .addresses(new_owner);
        Ok(self
            .binding
            .query_logs("OwnershipTransferred", &filter, range)?
            .map(OwnershipTransferredEvent::try_from))
    }

    pub async fn subscribe_transfers(
        &self,
        from: &[Address],
        to: &[Address],
    ) -> SdkResult<LogSubscription<TransferEvent>> {
        let filter = CallFilter::new().addresses(from).addresses(to);
        self.binding
            .subscribe_map("Transfer", &filter, TransferEvent::try_from)
            .await
    }

    pub async fn subscribe_approvals(
        &self,
        owner: &[Address],
        spender: &[Address],
    ) -> SdkResult<LogSubscription<ApprovalEvent>> {
        let filter = CallFilter::new().addresses(owner).addresses(spender);
        self.binding
            .subscribe_map("Approval", &filter, ApprovalEvent::try_from)
            .await
    }

    pub async fn subscribe_ownership_transferred(
        &self,
        previous_owner: &[Address],
        new_owner: &[Address],
    ) -> SdkResult<LogSubscription<OwnershipTransferredEvent>> {
        let filter = CallFilter::new()
            .addresses(previous_owner)
            .addresses(new_owner);
        self.binding
            .subscribe_map(
                "OwnershipTransferred",
                &filter,
                OwnershipTransferredEvent::try_from,
            )
            .await
    }
}
