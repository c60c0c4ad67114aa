use std::path::PathBuf;
use std::str::FromStr;

use bitcoin::{Address, Network as BitcoinNetwork};
use clap::{Args, Parser, Subcommand};

use btc_recovery_client::config::PartialConfig;
use btc_recovery_client::error::RecoveryError;

#[derive(Parser, Debug)]
#[clap(author, version, about = "UTXOリカバリー用のエクスプローラー・手数料・検証ツール", long_about = None)]
pub struct CliArgs {
    #[clap(flatten)]
    pub config: ConfigArgs,

    #[clap(subcommand)]
    pub command: Command,
}

/// 設定の最優先ソース。指定されなかった項目は環境変数・既定値で補われる
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[clap(long, global = true)]
    pub port: Option<u16>,

    #[clap(long, global = true)]
    pub bind: Option<String>,

    /// 環境名 ("prod", "test", "dev", "latest", "staging", "local")
    #[clap(long, global = true)]
    pub env: Option<String>,

    /// デバッグログを有効にするモジュール (カンマ区切り)
    #[clap(long, global = true, value_delimiter = ',')]
    pub debugnamespace: Option<Vec<String>>,

    #[clap(long, global = true)]
    pub keypath: Option<String>,

    #[clap(long, global = true)]
    pub crtpath: Option<String>,

    /// ログの出力先ファイル
    #[clap(long, global = true)]
    pub logfile: Option<String>,

    #[clap(long, global = true)]
    pub disablessl: bool,

    #[clap(long, global = true)]
    pub disableproxy: bool,

    #[clap(long, global = true)]
    pub disableenvcheck: bool,

    /// リクエストのタイムアウト (ミリ秒)
    #[clap(long, global = true)]
    pub timeout: Option<u64>,

    /// エクスプローラーAPIのベースURLを上書きする
    #[clap(long, global = true)]
    pub customrooturi: Option<String>,

    /// 使用するネットワーク ("bitcoin", "testnet", "signet", "regtest")
    #[clap(long, global = true)]
    pub custombitcoinnetwork: Option<String>,
}

impl ConfigArgs {
    pub fn to_partial(&self) -> PartialConfig {
        // フラグが指定されなかった場合は「未設定」であり false ではない
        let flag = |set: bool| set.then_some(true);

        PartialConfig {
            port: self.port,
            bind: self.bind.clone(),
            env: self.env.clone(),
            debug_namespace: self.debugnamespace.clone(),
            key_path: self.keypath.clone(),
            crt_path: self.crtpath.clone(),
            log_file: self.logfile.clone(),
            disable_ssl: flag(self.disablessl),
            disable_proxy: flag(self.disableproxy),
            disable_env_check: flag(self.disableenvcheck),
            timeout_ms: self.timeout,
            custom_root_uri: self.customrooturi.clone(),
            custom_network: self.custombitcoinnetwork.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 推奨手数料 (sat/byte) を取得する
    Fee {
        /// 手数料推奨APIのURL
        #[clap(long)]
        url: Option<String>,
    },
    /// アドレスの取引数と残高を取得する
    Address { address: String },
    /// アドレスのUTXO一覧を取得する
    Unspents { address: String },
    /// リカバリートランザクションのIDをエクスプローラーと照合する
    Verify {
        /// raw transaction hex
        #[clap(long, conflicts_with = "hex_file", required_unless_present = "hex_file")]
        hex: Option<String>,

        /// raw transaction hex を保存したファイルへのパス
        #[clap(long)]
        hex_file: Option<PathBuf>,
    },
    /// マージ後の設定を表示する
    Config,
}

pub fn parse_address(address: &str, network: BitcoinNetwork) -> Result<Address, RecoveryError> {
    Address::from_str(address)
        .and_then(|addr| addr.require_network(network))
        .map_err(|e| {
            RecoveryError::InputValidation(format!(
                "アドレス形式エラーまたはネットワーク不整合 ({}): {}",
                address, e
            ))
        })
}
