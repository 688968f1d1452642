//! Shared utilities for integration tests: an in-memory chain that executes
//! the token and stake wallet interfaces.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{address, keccak256, Address, Bytes, LogData, TxHash, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;

use parity_sdk::blockchain::transport::{LogFilter, LogStream, Transport};
use parity_sdk::blockchain::types::{MinedReceipt, TransportError};
use parity_sdk::blockchain::wallet::TransactContext;
use parity_sdk::config::schema::SdkConfig;
use parity_sdk::config::PrivateKey;
use parity_sdk::contract::ContractSchema;
use parity_sdk::SdkClient;

pub const CHAIN_ID: u64 = 1337;
pub const TOKEN: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const STAKE: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

/// Anvil account #0.
pub const KEY_A: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Anvil account #1.
pub const KEY_B: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

pub const CAROL: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

/// A transaction the chain accepted, in submission order.
#[derive(Debug, Clone)]
pub struct Submission {
    pub tx_hash: TxHash,
    pub to: Address,
    pub method: String,
    pub from: Address,
    pub args: Vec<DynSolValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contract {
    Token,
    Stake,
}

#[derive(Debug, Clone)]
struct StakeEntry {
    amount: U256,
    wallet: Address,
}

struct EmittedLog {
    address: Address,
    topics: Vec<B256>,
    data: Vec<u8>,
}

#[derive(Default)]
struct ChainState {
    block: u64,
    nonce: u64,
    owner: Address,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    stakes: HashMap<String, StakeEntry>,
    receipts: HashMap<TxHash, MinedReceipt>,
    senders: HashMap<TxHash, Address>,
    submissions: Vec<Submission>,
    logs: Vec<Log>,
    subscribers: Vec<(LogFilter, mpsc::UnboundedSender<Log>)>,
    hold_receipts: bool,
    revert_method: Option<String>,
    reject_method: Option<String>,
}

/// In-memory [`Transport`] executing the ParityToken and StakeWallet interfaces.
///
/// Every accepted transaction is mined immediately in its own block. Fault
/// knobs hold receipts back, revert or reject a method, or drop live streams.
pub struct MockChain {
    token_abi: JsonAbi,
    stake_abi: JsonAbi,
    closed: AtomicBool,
    state: Mutex<ChainState>,
}

impl MockChain {
    /// Chain at block 1 with ALICE as token owner and no balances.
    pub fn new() -> Arc<Self> {
        let token_abi = ContractSchema::token_default().unwrap().abi().clone();
        let stake_abi = ContractSchema::stake_default().unwrap().abi().clone();
        Arc::new(Self {
            token_abi,
            stake_abi,
            closed: AtomicBool::new(false),
            state: Mutex::new(ChainState {
                block: 1,
                owner: ALICE,
                ..Default::default()
            }),
        })
    }

    // Setup

    /// Credit tokens without a transaction.
    pub fn fund(&self, account: Address, amount: u64) {
        let mut state = self.state.lock().unwrap();
        *state.balances.entry(account).or_default() += U256::from(amount);
        state.total_supply += U256::from(amount);
    }

    pub fn mine_empty_blocks(&self, count: u64) {
        self.state.lock().unwrap().block += count;
    }

    /// Append a raw log to history and live streams as-is.
    pub fn inject_log(&self, address: Address, topics: Vec<B256>, data: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.block += 1;
        let block = state.block;
        let tx_hash = keccak256(format!("injected:{block}"));
        publish(
            &mut state,
            block,
            tx_hash,
            vec![EmittedLog {
                address,
                topics,
                data,
            }],
        );
    }

    // Fault knobs

    /// While set, mined transactions report no receipt.
    pub fn hold_receipts(&self, hold: bool) {
        self.state.lock().unwrap().hold_receipts = hold;
    }

    /// Mine calls to `method` with a failure status.
    pub fn revert_method(&self, method: Option<&str>) {
        self.state.lock().unwrap().revert_method = method.map(str::to_string);
    }

    /// Refuse submissions of `method` at the RPC layer.
    pub fn reject_method(&self, method: Option<&str>) {
        self.state.lock().unwrap().reject_method = method.map(str::to_string);
    }

    /// Drop every live log stream as a lost websocket would.
    pub fn disconnect_subscribers(&self) {
        self.state.lock().unwrap().subscribers.clear();
    }

    // Inspection

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submissions_of(&self, method: &str) -> Vec<Submission> {
        self.submissions()
            .into_iter()
            .filter(|s| s.method == method)
            .collect()
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn head(&self) -> u64 {
        self.state.lock().unwrap().block
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        state.subscribers.retain(|(_, tx)| !tx.is_closed());
        state.subscribers.len()
    }

    fn check_open(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }

    fn abi_for(&self, to: Address) -> Result<(Contract, &JsonAbi), TransportError> {
        if to == TOKEN {
            Ok((Contract::Token, &self.token_abi))
        } else if to == STAKE {
            Ok((Contract::Stake, &self.stake_abi))
        } else {
            Err(TransportError::Rejected(format!("no contract at {to}")))
        }
    }

    fn resolve<'a>(
        &self,
        abi: &'a JsonAbi,
        data: &[u8],
    ) -> Result<(&'a Function, Vec<DynSolValue>), TransportError> {
        let selector = data
            .get(..4)
            .ok_or_else(|| TransportError::Rejected("execution reverted: no selector".into()))?;
        let function = abi
            .functions()
            .find(|f| f.selector().as_slice() == selector)
            .ok_or_else(|| TransportError::Rejected("execution reverted: unknown selector".into()))?;
        let args = function
            .abi_decode_input(&data[4..])
            .map_err(|e| TransportError::Rejected(format!("execution reverted: {e}")))?;
        Ok((function, args))
    }
}

fn word(address: Address) -> B256 {
    address.into_word()
}

fn uint_data(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}

fn arg_address(args: &[DynSolValue], i: usize) -> Address {
    args[i].as_address().unwrap()
}

fn arg_uint(args: &[DynSolValue], i: usize) -> U256 {
    args[i].as_uint().unwrap().0
}

fn arg_str(args: &[DynSolValue], i: usize) -> String {
    args[i].as_str().unwrap().to_string()
}

fn transfer_log(from: Address, to: Address, value: U256) -> EmittedLog {
    EmittedLog {
        address: TOKEN,
        topics: vec![
            keccak256("Transfer(address,address,uint256)"),
            word(from),
            word(to),
        ],
        data: uint_data(value),
    }
}

fn stake_log(signature: &str, device: &str, wallet: Address, amount: U256) -> EmittedLog {
    EmittedLog {
        address: STAKE,
        topics: vec![keccak256(signature), keccak256(device), word(wallet)],
        data: uint_data(amount),
    }
}

fn debit(state: &mut ChainState, account: Address, value: U256) -> Result<(), String> {
    let balance = state.balances.entry(account).or_default();
    if *balance < value {
        return Err(format!("ERC20InsufficientBalance({account})"));
    }
    *balance -= value;
    Ok(())
}

fn credit(state: &mut ChainState, account: Address, value: U256) {
    *state.balances.entry(account).or_default() += value;
}

fn spend_allowance(
    state: &mut ChainState,
    owner: Address,
    spender: Address,
    value: U256,
) -> Result<(), String> {
    let allowance = state.allowances.entry((owner, spender)).or_default();
    if *allowance < value {
        return Err(format!("ERC20InsufficientAllowance({spender})"));
    }
    *allowance -= value;
    Ok(())
}

fn only_owner(state: &ChainState, sender: Address) -> Result<(), String> {
    if state.owner != sender {
        return Err(format!("OwnableUnauthorizedAccount({sender})"));
    }
    Ok(())
}

/// Apply a state change. Runs on a scratch copy so a revert leaves no trace.
fn execute(
    state: &mut ChainState,
    to: Contract,
    method: &str,
    sender: Address,
    args: &[DynSolValue],
) -> Result<Vec<EmittedLog>, String> {
    match (to, method) {
        (Contract::Token, "transfer")
        | (Contract::Token, "transferWithData")
        | (Contract::Token, "transferWithDataAndCallback") => {
            let (recipient, value) = (arg_address(args, 0), arg_uint(args, 1));
            debit(state, sender, value)?;
            credit(state, recipient, value);
            Ok(vec![transfer_log(sender, recipient, value)])
        }
        (Contract::Token, "approve") => {
            let (spender, value) = (arg_address(args, 0), arg_uint(args, 1));
            state.allowances.insert((sender, spender), value);
            Ok(vec![EmittedLog {
                address: TOKEN,
                topics: vec![
                    keccak256("Approval(address,address,uint256)"),
                    word(sender),
                    word(spender),
                ],
                data: uint_data(value),
            }])
        }
        (Contract::Token, "transferFrom") => {
            let (from, recipient, value) =
                (arg_address(args, 0), arg_address(args, 1), arg_uint(args, 2));
            spend_allowance(state, from, sender, value)?;
            debit(state, from, value)?;
            credit(state, recipient, value);
            Ok(vec![transfer_log(from, recipient, value)])
        }
        (Contract::Token, "mint") => {
            only_owner(state, sender)?;
            let (recipient, value) = (arg_address(args, 0), arg_uint(args, 1));
            credit(state, recipient, value);
            state.total_supply += value;
            Ok(vec![transfer_log(Address::ZERO, recipient, value)])
        }
        (Contract::Token, "burn") => {
            let value = arg_uint(args, 0);
            debit(state, sender, value)?;
            state.total_supply -= value;
            Ok(vec![transfer_log(sender, Address::ZERO, value)])
        }
        (Contract::Token, "transferOwnership") | (Contract::Token, "renounceOwnership") => {
            only_owner(state, sender)?;
            let new_owner = if method == "renounceOwnership" {
                Address::ZERO
            } else {
                arg_address(args, 0)
            };
            if method == "transferOwnership" && new_owner == Address::ZERO {
                return Err("OwnableInvalidOwner(0x0)".into());
            }
            let previous = std::mem::replace(&mut state.owner, new_owner);
            Ok(vec![EmittedLog {
                address: TOKEN,
                topics: vec![
                    keccak256("OwnershipTransferred(address,address)"),
                    word(previous),
                    word(new_owner),
                ],
                data: Vec::new(),
            }])
        }
        (Contract::Stake, "stake") => {
            let (value, device, wallet) =
                (arg_uint(args, 0), arg_str(args, 1), arg_address(args, 2));
            spend_allowance(state, sender, STAKE, value)?;
            debit(state, sender, value)?;
            credit(state, STAKE, value);
            let entry = state.stakes.entry(device.clone()).or_insert(StakeEntry {
                amount: U256::ZERO,
                wallet,
            });
            entry.amount += value;
            entry.wallet = wallet;
            Ok(vec![
                transfer_log(sender, STAKE, value),
                stake_log("StakeDeposited(string,address,uint256)", &device, wallet, value),
            ])
        }
        (Contract::Stake, "withdrawFunds") => {
            let (device, value) = (arg_str(args, 0), arg_uint(args, 1));
            let entry = state
                .stakes
                .get_mut(&device)
                .ok_or_else(|| "Device ID does not exist".to_string())?;
            if entry.wallet != sender {
                return Err("Only the wallet owner can withdraw".into());
            }
            if entry.amount < value {
                return Err("Insufficient stake".into());
            }
            entry.amount -= value;
            let wallet = entry.wallet;
            debit(state, STAKE, value)?;
            credit(state, wallet, value);
            Ok(vec![
                transfer_log(STAKE, wallet, value),
                stake_log("StakeWithdrawn(string,address,uint256)", &device, wallet, value),
            ])
        }
        (Contract::Stake, "transferPayment") => {
            let (creator, solver, value) = (arg_str(args, 0), arg_str(args, 1), arg_uint(args, 2));
            let creator_entry = state
                .stakes
                .get_mut(&creator)
                .ok_or_else(|| "Creator device does not exist".to_string())?;
            if creator_entry.amount < value {
                return Err("Insufficient stake".into());
            }
            creator_entry.amount -= value;
            let solver_entry = state
                .stakes
                .get_mut(&solver)
                .ok_or_else(|| "Solver device does not exist".to_string())?;
            solver_entry.amount += value;
            Ok(Vec::new())
        }
        (Contract::Stake, "updateWalletAddress") => {
            let (device, new_wallet) = (arg_str(args, 0), arg_address(args, 1));
            let entry = state
                .stakes
                .get_mut(&device)
                .ok_or_else(|| "Device ID does not exist".to_string())?;
            if entry.wallet != sender {
                return Err("Only the wallet owner can update".into());
            }
            entry.wallet = new_wallet;
            Ok(Vec::new())
        }
        _ => Err(format!("{method} not supported")),
    }
}

/// Mine `emitted` into `block` and push matching logs to live subscribers.
fn publish(state: &mut ChainState, block: u64, tx_hash: TxHash, emitted: Vec<EmittedLog>) {
    let block_hash = keccak256(block.to_be_bytes());
    for (i, log) in emitted.into_iter().enumerate() {
        let log = Log {
            inner: alloy::primitives::Log {
                address: log.address,
                data: LogData::new_unchecked(log.topics, Bytes::from(log.data)),
            },
            block_hash: Some(block_hash),
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: Some(tx_hash),
            transaction_index: Some(0),
            log_index: Some(i as u64),
            removed: false,
        };
        state
            .subscribers
            .retain(|(filter, tx)| !filter.matches(&log) || tx.send(log.clone()).is_ok());
        state.logs.push(log);
    }
}

fn snapshot(state: &ChainState) -> ChainState {
    ChainState {
        block: state.block,
        nonce: state.nonce,
        owner: state.owner,
        total_supply: state.total_supply,
        balances: state.balances.clone(),
        allowances: state.allowances.clone(),
        stakes: state.stakes.clone(),
        ..Default::default()
    }
}

fn restore(state: &mut ChainState, scratch: ChainState) {
    state.owner = scratch.owner;
    state.total_supply = scratch.total_supply;
    state.balances = scratch.balances;
    state.allowances = scratch.allowances;
    state.stakes = scratch.stakes;
}

#[async_trait]
impl Transport for MockChain {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        self.check_open()?;
        Ok(CHAIN_ID)
    }

    async fn block_number(&self) -> Result<u64, TransportError> {
        self.check_open()?;
        Ok(self.head())
    }

    async fn call(
        &self,
        to: Address,
        data: Bytes,
        _block: Option<u64>,
    ) -> Result<Bytes, TransportError> {
        self.check_open()?;
        let (contract, abi) = self.abi_for(to)?;
        let (function, args) = self.resolve(abi, &data)?;
        let state = self.state.lock().unwrap();

        let uint = |v: U256| DynSolValue::Uint(v, 256);
        let output = match (contract, function.name.as_str()) {
            (Contract::Token, "name") => DynSolValue::String("Parity Token".into()),
            (Contract::Token, "symbol") => DynSolValue::String("PRTY".into()),
            (Contract::Token, "decimals") => DynSolValue::Uint(U256::from(18), 8),
            (Contract::Token, "totalSupply") => uint(state.total_supply),
            (Contract::Token, "owner") => DynSolValue::Address(state.owner),
            (Contract::Token, "balanceOf") => uint(
                state
                    .balances
                    .get(&arg_address(&args, 0))
                    .copied()
                    .unwrap_or_default(),
            ),
            (Contract::Token, "allowance") => uint(
                state
                    .allowances
                    .get(&(arg_address(&args, 0), arg_address(&args, 1)))
                    .copied()
                    .unwrap_or_default(),
            ),
            (Contract::Stake, "getStakeInfo") => {
                let device = arg_str(&args, 0);
                match state.stakes.get(&device) {
                    Some(entry) => DynSolValue::Tuple(vec![
                        uint(entry.amount),
                        DynSolValue::String(device),
                        DynSolValue::Address(entry.wallet),
                        DynSolValue::Bool(true),
                    ]),
                    None => DynSolValue::Tuple(vec![
                        uint(U256::ZERO),
                        DynSolValue::String(String::new()),
                        DynSolValue::Address(Address::ZERO),
                        DynSolValue::Bool(false),
                    ]),
                }
            }
            (Contract::Stake, "getBalanceByDeviceID") => uint(
                state
                    .stakes
                    .get(&arg_str(&args, 0))
                    .map(|e| e.amount)
                    .unwrap_or_default(),
            ),
            (_, name) => {
                return Err(TransportError::Rejected(format!(
                    "execution reverted: {name} is not a view"
                )))
            }
        };

        let encoded = function
            .abi_encode_output(&[output])
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        Ok(Bytes::from(encoded))
    }

    async fn submit(
        &self,
        ctx: &TransactContext,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, TransportError> {
        self.check_open()?;
        if ctx.chain_id() != CHAIN_ID {
            return Err(TransportError::Rejected(format!(
                "invalid chain id {}",
                ctx.chain_id()
            )));
        }
        let (contract, abi) = self.abi_for(to)?;
        let (function, args) = self.resolve(abi, &data)?;
        let method = function.name.clone();
        let sender = ctx.from();

        let mut state = self.state.lock().unwrap();
        if state.reject_method.as_deref() == Some(method.as_str()) {
            return Err(TransportError::Rejected(format!(
                "{method} rejected: insufficient funds for gas"
            )));
        }

        state.nonce += 1;
        let tx_hash = keccak256(format!("{sender}:{}", state.nonce));
        state.senders.insert(tx_hash, sender);
        state.submissions.push(Submission {
            tx_hash,
            to,
            method: method.clone(),
            from: sender,
            args: args.clone(),
        });

        state.block += 1;
        let block = state.block;

        let forced_revert = state.revert_method.as_deref() == Some(method.as_str());
        let mut scratch = snapshot(&state);
        let outcome = if forced_revert {
            Err(format!("{method} reverted"))
        } else {
            execute(&mut scratch, contract, &method, sender, &args)
        };

        let success = match outcome {
            Ok(emitted) => {
                restore(&mut state, scratch);
                publish(&mut state, block, tx_hash, emitted);
                true
            }
            Err(_) => false,
        };

        state.receipts.insert(
            tx_hash,
            MinedReceipt {
                tx_hash,
                block_number: block,
                success,
            },
        );
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<MinedReceipt>, TransportError> {
        self.check_open()?;
        let state = self.state.lock().unwrap();
        if state.hold_receipts {
            return Ok(None);
        }
        Ok(state.receipts.get(&tx_hash).copied())
    }

    async fn transaction_sender(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<Address>, TransportError> {
        self.check_open()?;
        Ok(self.state.lock().unwrap().senders.get(&tx_hash).copied())
    }

    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, TransportError> {
        self.check_open()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }

    async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogStream, TransportError> {
        self.check_open()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .unwrap()
            .subscribers
            .push((filter.clone(), tx));
        let logs = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|log| (log, rx))
        });
        Ok(logs.boxed())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.state.lock().unwrap().subscribers.clear();
    }
}

/// Configuration pointing at [`TOKEN`] and [`STAKE`] with fast mining waits.
pub fn test_config() -> SdkConfig {
    let mut config = SdkConfig {
        chain_id: CHAIN_ID,
        token_address: TOKEN,
        stake_address: Some(STAKE),
        ..SdkConfig::default()
    };
    config.confirmation.timeout_secs = 2;
    config.confirmation.poll_interval_ms = 10;
    config
}

/// Client over `chain` signing with `key`, if any.
pub fn client_with_key(chain: &Arc<MockChain>, key: Option<&str>) -> SdkClient {
    let mut config = test_config();
    config.private_key = key.map(PrivateKey::new);
    SdkClient::with_transport(&config, chain.clone()).unwrap()
}

/// Client over `chain` built from a caller-tuned configuration.
pub fn client_from(chain: &Arc<MockChain>, config: &SdkConfig) -> SdkClient {
    SdkClient::with_transport(config, chain.clone()).unwrap()
}
