//! Facade client: one entry point over the connection, token and stake wallet.
//!
//! # Responsibilities
//! - Build the connection and bindings from an [`SdkConfig`]
//! - Own the credential lifecycle (set, replace, clear)
//! - Expose token and stake operations signed with the current credential

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash};

use crate::blockchain::client::ChainConnection;
use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::transport::Transport;
use crate::blockchain::types::{Amount, ConfirmationPolicy, DeviceId};
use crate::blockchain::wallet::TransactContext;
use crate::config::schema::SdkConfig;
use crate::contract::binding::ContractBinding;
use crate::contract::schema::ContractSchema;
use crate::error::{SdkError, SdkResult};
use crate::stake::{StakeOrchestrator, StakeRecord};
use crate::token::{TokenFacade, TokenInfo};

#[derive(Debug, Clone)]
pub struct SdkClient {
    connection: ChainConnection,
    token: TokenFacade,
    stake: Option<StakeOrchestrator>,
}

impl SdkClient {
    /// Dial the configured endpoint and build the bindings.
    pub async fn connect(config: &SdkConfig) -> SdkResult<Self> {
        let connection = ChainConnection::connect(
            &config.endpoint,
            config.chain_id,
            Duration::from_secs(config.rpc_timeout_secs),
            ConfirmationPolicy::from(&config.confirmation),
        )
        .await?;
        Self::from_connection(config, connection)
    }

    /// Build the client over a caller-supplied transport.
    pub fn with_transport(config: &SdkConfig, transport: Arc<dyn Transport>) -> SdkResult<Self> {
        let connection = ChainConnection::with_transport(
            transport,
            config.chain_id,
            ConfirmationPolicy::from(&config.confirmation),
        );
        Self::from_connection(config, connection)
    }

    fn from_connection(config: &SdkConfig, connection: ChainConnection) -> SdkResult<Self> {
        let token_schema = match &config.abi.token_path {
            Some(path) => ContractSchema::from_path("ParityToken", path)?,
            None => ContractSchema::token_default()?,
        };
        let token = TokenFacade::new(
            ContractBinding::new(
                config.token_address,
                Arc::new(token_schema),
                connection.clone(),
            )
            .with_log_config(&config.logs),
        );

        let stake = match config.stake_address {
            Some(stake_address) => {
                let stake_schema = match &config.abi.stake_path {
                    Some(path) => ContractSchema::from_path("StakeWallet", path)?,
                    None => ContractSchema::stake_default()?,
                };
                let binding =
                    ContractBinding::new(stake_address, Arc::new(stake_schema), connection.clone())
                        .with_log_config(&config.logs);
                Some(StakeOrchestrator::new(
                    connection.clone(),
                    token.clone(),
                    binding,
                ))
            }
            None => {
                tracing::info!("No stake wallet address configured; stake operations disabled");
                None
            }
        };

        if let Some(key) = &config.private_key {
            connection.set_credential(key.expose(), None)?;
        }

        tracing::info!(
            chain_id = config.chain_id,
            token = %config.token_address,
            stake = ?config.stake_address,
            authenticated = connection.credential().is_some(),
            "SDK client ready"
        );

        Ok(Self {
            connection,
            token,
            stake,
        })
    }

    // Credential

    /// Install or replace the signing key. Returns the derived address.
    pub fn set_private_key(&self, private_key_hex: &str) -> SdkResult<Address> {
        Ok(self.connection.set_credential(private_key_hex, None)?.address())
    }

    pub fn clear_credential(&self) {
        self.connection.clear_credential();
    }

    /// Address of the current credential, zero when unauthenticated.
    pub fn address(&self) -> Address {
        self.connection.address()
    }

    pub fn transact_options(&self) -> SdkResult<TransactContext> {
        self.connection.transact_options()
    }

    pub fn connection(&self) -> &ChainConnection {
        &self.connection
    }

    pub fn token(&self) -> &TokenFacade {
        &self.token
    }

    /// Stake orchestrator, or [`SdkError::NotConfigured`] without a stake address.
    pub fn staking(&self) -> SdkResult<&StakeOrchestrator> {
        self.stake
            .as_ref()
            .ok_or(SdkError::NotConfigured("stake wallet"))
    }

    // Token

    pub async fn get_balance(&self, owner: Address) -> SdkResult<Amount> {
        self.token.balance_of(owner).await
    }

    pub async fn get_token_info(&self) -> SdkResult<TokenInfo> {
        self.token.token_info().await
    }

    pub async fn get_allowance(&self, owner: Address, spender: Address) -> SdkResult<Amount> {
        self.token.allowance(owner, spender).await
    }

    pub async fn get_total_supply(&self) -> SdkResult<Amount> {
        self.token.total_supply().await
    }

    pub async fn transfer(&self, to: Address, value: Amount) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token.transfer(&ctx, to, value).await
    }

    pub async fn approve(&self, spender: Address, value: Amount) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token.approve(&ctx, spender, value).await
    }

    pub async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token.transfer_from(&ctx, from, to, value).await
    }

    pub async fn mint(&self, to: Address, value: Amount) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token.mint(&ctx, to, value).await
    }

    pub async fn burn(&self, value: Amount) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token.burn(&ctx, value).await
    }

    pub async fn transfer_with_data(
        &self,
        to: Address,
        value: Amount,
        data: Bytes,
    ) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token.transfer_with_data(&ctx, to, value, data).await
    }

    pub async fn transfer_with_data_and_callback(
        &self,
        to: Address,
        value: Amount,
        data: Bytes,
    ) -> SdkResult<PendingTransaction> {
        let ctx = self.transact_options()?;
        self.token
            .transfer_with_data_and_callback(&ctx, to, value, data)
            .await
    }

    // Stake

    pub async fn get_stake_info(&self, device_id: &DeviceId) -> SdkResult<StakeRecord> {
        self.staking()?.get_stake_info(device_id).await
    }

    /// Approve and stake `value` for `device_id`.
    pub async fn add_funds(&self, value: Amount, device_id: &DeviceId) -> SdkResult<PendingTransaction> {
        self.staking()?.stake(value, device_id).await
    }

    pub async fn transfer_payment(
        &self,
        creator: &DeviceId,
        solver: &DeviceId,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        self.staking()?.transfer_payment(creator, solver, value).await
    }

    pub async fn get_stake_balance(&self, device_id: &DeviceId) -> SdkResult<Amount> {
        self.staking()?.get_balance(device_id).await
    }

    pub async fn withdraw_funds(
        &self,
        device_id: &DeviceId,
        value: Amount,
    ) -> SdkResult<PendingTransaction> {
        self.staking()?.withdraw_stake(device_id, value).await
    }

    pub async fn update_wallet_address(
        &self,
        device_id: &DeviceId,
        new_address: Address,
    ) -> SdkResult<PendingTransaction> {
        self.staking()?
            .update_wallet_address(device_id, new_address)
            .await
    }

    // Session

    pub async fn transaction_sender(&self, tx_hash: TxHash) -> SdkResult<Option<Address>> {
        self.connection.transaction_sender(tx_hash).await
    }

    /// Release the transport session shared with every clone of this client.
    pub fn close(self) {
        self.connection.close();
    }
}
