use std::fs::{self, File, OpenOptions};

use clap::Parser;
use log::LevelFilter;
use serde::Serialize;

mod cli;

use btc_recovery_client::config::{self, Config, PartialConfig};
use btc_recovery_client::{
    BitcoinTxFormat, Environment, ExplorerClient, FeeEstimator, RecoveryError, RecoveryVerifier,
    ReqwestTransport, TransactionInfo, TransportConfig,
};
use cli::{CliArgs, Command, parse_address};

/// 前回実行時のログ (検証失敗時の TxId など) を消さないよう追記モードで開く
fn open_log_file(path: &str) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_logging(config: &Config) -> Result<(), RecoveryError> {
    let mut builder = env_logger::Builder::from_default_env();
    for namespace in &config.debug_namespace {
        builder.filter_module(namespace, LevelFilter::Debug);
    }

    if let Some(path) = config.log_file.as_deref().filter(|p| !p.is_empty()) {
        let file = open_log_file(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RecoveryError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_transaction_info(
    hex: Option<String>,
    hex_file: Option<std::path::PathBuf>,
) -> Result<TransactionInfo, RecoveryError> {
    match (hex, hex_file) {
        (Some(hex), _) => Ok(TransactionInfo::new(hex)),
        (None, Some(path)) => {
            let content = fs::read_to_string(&path).map_err(|e| {
                log::error!("トランザクションファイルの読み込みに失敗しました: {:?}", path);
                RecoveryError::FileRead {
                    file_path: path.clone(),
                    source: e,
                }
            })?;
            Ok(TransactionInfo::new(content))
        }
        (None, None) => Err(RecoveryError::InputValidation(
            "--hex または --hex-file を指定してください。".to_string(),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), RecoveryError> {
    let args = CliArgs::parse();

    let config = config::resolve(&[args.config.to_partial(), PartialConfig::from_env()]);
    init_logging(&config)?;
    log::debug!("マージ後の設定: {:?}", config);

    let environment = Environment::from_config(&config)?;
    log::info!(
        "環境: {}, エクスプローラー: {}, ネットワーク: {:?}",
        environment.name,
        environment.explorer_base_url,
        environment.network
    );

    let transport = ReqwestTransport::new(TransportConfig::from(&config))?;

    match args.command {
        Command::Fee { url } => {
            let estimator = FeeEstimator::new(transport);
            let estimate = match url {
                Some(url) => estimator.get_recommended_fee(&url).await?,
                None => estimator.get_recommended_fee_default().await?,
            };
            print_json(&estimate)?;
        }
        Command::Address { address } => {
            let address = parse_address(&address, environment.network)?;
            let explorer = ExplorerClient::for_environment(transport, &environment);
            let info = explorer.get_address_info(&address.to_string()).await?;
            print_json(&info)?;
        }
        Command::Unspents { address } => {
            let address = parse_address(&address, environment.network)?;
            let explorer = ExplorerClient::for_environment(transport, &environment);
            let unspents = explorer.get_unspent_outputs(&address.to_string()).await?;
            print_json(&unspents)?;
        }
        Command::Verify { hex, hex_file } => {
            let tx_info = read_transaction_info(hex, hex_file)?;
            let explorer = ExplorerClient::for_environment(transport, &environment);
            let verifier = RecoveryVerifier::new(explorer, BitcoinTxFormat);
            let decoded = verifier.verify(&tx_info).await?;
            print_json(&decoded)?;
        }
        Command::Config => print_json(&config)?,
    }

    log::info!("処理が正常に完了しました。");
    Ok(())
}
