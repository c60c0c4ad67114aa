use bitcoin::Network as BitcoinNetwork;

use crate::config::Config;
use crate::error::RecoveryError;

const MAINNET_EXPLORER_URL: &str = "https://api.smartbit.com.au/v1";
const TESTNET_EXPLORER_URL: &str = "https://testnet-api.smartbit.com.au/v1";

/// デプロイ環境ごとのエクスプローラーURLとネットワーク
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub explorer_base_url: String,
    pub network: BitcoinNetwork,
}

impl Environment {
    pub fn from_name(name: &str) -> Result<Self, RecoveryError> {
        let (explorer_base_url, network) = match name.to_lowercase().as_str() {
            "prod" => (MAINNET_EXPLORER_URL, BitcoinNetwork::Bitcoin),
            "test" | "dev" | "latest" | "staging" | "local" => {
                (TESTNET_EXPLORER_URL, BitcoinNetwork::Testnet)
            }
            s => return Err(RecoveryError::Config(format!("不明な環境名です: {}", s))),
        };

        Ok(Environment {
            name: name.to_lowercase(),
            explorer_base_url: explorer_base_url.to_string(),
            network,
        })
    }

    /// `custom_root_uri` と `custom_network` があれば環境の既定値より優先する
    pub fn from_config(config: &Config) -> Result<Self, RecoveryError> {
        let mut environment = Self::from_name(&config.env)?;

        if let Some(root_uri) = config.custom_root_uri.as_deref().filter(|s| !s.is_empty()) {
            log::info!("カスタムルートURIを使用します: {}", root_uri);
            environment.explorer_base_url = root_uri.trim_end_matches('/').to_string();
        }
        if let Some(network) = config.custom_network.as_deref().filter(|s| !s.is_empty()) {
            environment.network = parse_network(network)?;
        }
        Ok(environment)
    }
}

pub fn parse_network(network_str: &str) -> Result<BitcoinNetwork, RecoveryError> {
    match network_str.to_lowercase().as_str() {
        "bitcoin" | "mainnet" => Ok(BitcoinNetwork::Bitcoin),
        "testnet" => Ok(BitcoinNetwork::Testnet),
        "signet" => Ok(BitcoinNetwork::Signet),
        "regtest" => Ok(BitcoinNetwork::Regtest),
        s => Err(RecoveryError::Config(format!("無効なネットワークが指定されました: {}", s))),
    }
}
