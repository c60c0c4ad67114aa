//! UTXOリカバリー用のブロックチェーンクライアント
//!
//! - [`explorer::ExplorerClient`]: ブロックエクスプローラーからアドレス情報・UTXOを取得
//! - [`fee::FeeEstimator`]: 推奨手数料の取得 (失敗時はフォールバック値)
//! - [`verifier::RecoveryVerifier`]: リカバリートランザクションのID照合
//! - [`config`]: 引数・環境変数・既定値からの設定マージ

pub mod config;
pub mod environment;
pub mod error;
pub mod explorer;
pub mod fee;
pub mod transport;
pub mod types;
pub mod verifier;

pub use config::{Config, PartialConfig};
pub use environment::Environment;
pub use error::RecoveryError;
pub use explorer::{ExplorerClient, TransactionDecoder};
pub use fee::FeeEstimator;
pub use transport::{HttpTransport, ReqwestTransport, TransportConfig};
pub use types::{AddressInfo, DecodedTransaction, FeeEstimate, FeeSource, TransactionInfo, UnspentOutput};
pub use verifier::{BitcoinTxFormat, RecoveryVerifier, TxFormat};
