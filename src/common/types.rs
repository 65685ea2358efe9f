use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::address::Address;
use super::error::SwapError;
use crate::constants::{
    DEFAULT_WAIT_ROUNDS, DONATION_ADDRESS, MAINNET_ALGOD_URL, PROGRESS_RESET_DELAY_MS,
    TESTNET_ALGOD_URL,
};

/// Algorand network the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    MainNet,
    TestNet,
}

impl Network {
    pub fn algod_url(&self) -> &'static str {
        match self {
            Network::MainNet => MAINNET_ALGOD_URL,
            Network::TestNet => TESTNET_ALGOD_URL,
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::MainNet
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::MainNet => write!(f, "MainNet"),
            Network::TestNet => write!(f, "TestNet"),
        }
    }
}

impl FromStr for Network {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::MainNet),
            "testnet" | "test" => Ok(Network::TestNet),
            other => Err(SwapError::Config(format!("unknown network '{other}'"))),
        }
    }
}

/// Node endpoints for one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub algod_url: String,
    pub algod_token: String,
}

impl NetworkConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            algod_url: network.algod_url().to_string(),
            algod_token: String::new(),
        }
    }

    /// Point at a custom algod node, e.g. a local sandbox
    pub fn with_algod(mut self, url: impl Into<String>, token: impl Into<String>) -> Self {
        self.algod_url = url.into();
        self.algod_token = token.into();
        self
    }
}

/// How the transaction lifecycle callback runs relative to submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackExecutionMode {
    /// Spawned on the runtime; a failing callback is logged and never blocks submission
    Async,
    /// Awaited before submission; a failing callback aborts the operation
    Sync,
}

impl Default for CallbackExecutionMode {
    fn default() -> Self {
        Self::Async
    }
}

#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub network: NetworkConfig,
    /// Application id of the deployed swap contract, 0 when not deployed
    pub app_id: u64,
    pub donation_address: Address,
    /// Confirmation budget, in rounds
    pub wait_rounds: u64,
    /// How long a successful progress bar stays visible
    pub progress_reset_delay: Duration,
    pub callback_execution_mode: CallbackExecutionMode,
}

impl SwapConfig {
    pub fn new(network: Network, app_id: u64) -> Self {
        Self {
            network: NetworkConfig::new(network),
            app_id,
            donation_address: DONATION_ADDRESS,
            wait_rounds: DEFAULT_WAIT_ROUNDS,
            progress_reset_delay: Duration::from_millis(PROGRESS_RESET_DELAY_MS),
            callback_execution_mode: CallbackExecutionMode::Async,
        }
    }

    pub fn with_network_config(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    pub fn with_donation_address(mut self, address: Address) -> Self {
        self.donation_address = address;
        self
    }

    pub fn with_wait_rounds(mut self, wait_rounds: u64) -> Self {
        self.wait_rounds = wait_rounds;
        self
    }

    pub fn with_progress_reset_delay(mut self, delay: Duration) -> Self {
        self.progress_reset_delay = delay;
        self
    }

    pub fn with_callback_execution_mode(mut self, mode: CallbackExecutionMode) -> Self {
        self.callback_execution_mode = mode;
        self
    }

    /// Build a configuration from environment variables
    ///
    /// - `ALGO_NETWORK`: `mainnet` (default) or `testnet`
    /// - `SWAP_APP_ID`: application id of the swap contract (required)
    /// - `ALGOD_URL` / `ALGOD_TOKEN`: custom node, defaults to the hosted endpoint
    /// - `DONATION_ADDRESS`: overrides the default donation recipient
    pub fn from_env() -> AnyResult<Self> {
        let network = match std::env::var("ALGO_NETWORK") {
            Ok(value) => value.parse::<Network>()?,
            Err(_) => Network::default(),
        };
        let app_id: u64 = std::env::var("SWAP_APP_ID")
            .map_err(|_| anyhow::anyhow!("SWAP_APP_ID is not set"))?
            .parse()
            .map_err(|e| anyhow::anyhow!("SWAP_APP_ID is not a valid application id: {e}"))?;

        let mut config = Self::new(network, app_id);
        if let Ok(url) = std::env::var("ALGOD_URL") {
            let token = std::env::var("ALGOD_TOKEN").unwrap_or_default();
            config.network = config.network.with_algod(url, token);
        }
        if let Ok(address) = std::env::var("DONATION_ADDRESS") {
            config.donation_address = address.parse()?;
        }
        Ok(config)
    }
}

pub type AnyResult<T> = anyhow::Result<T>;
