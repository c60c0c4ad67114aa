use bitcoin::Transaction;
use bitcoin::consensus::encode;

use crate::error::RecoveryError;
use crate::explorer::TransactionDecoder;
use crate::types::{DecodedTransaction, TransactionInfo};

/// コインごとのトランザクション形式とID計算規則
pub trait TxFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// 生トランザクションからIDを計算し、16進数表現で返す
    fn compute_id(&self, raw_tx: &[u8]) -> Result<String, RecoveryError>;
}

/// Bitcoinのコンセンサス形式。IDは witness を除いたシリアライズの double SHA256 (バイト順反転で表示)
#[derive(Debug, Default, Copy, Clone)]
pub struct BitcoinTxFormat;

impl TxFormat for BitcoinTxFormat {
    fn name(&self) -> &'static str {
        "bitcoin"
    }

    fn compute_id(&self, raw_tx: &[u8]) -> Result<String, RecoveryError> {
        let tx: Transaction = encode::deserialize(raw_tx)
            .map_err(|e| RecoveryError::InvalidTransaction(e.to_string()))?;
        log::debug!(
            "ローカルデコード成功: 入力数={}, 出力数={}",
            tx.input.len(),
            tx.output.len()
        );
        Ok(tx.compute_txid().to_string())
    }
}

/// リカバリートランザクションを返す前の最終チェック
///
/// エクスプローラーが報告したIDとローカルで計算したIDをバイト単位で比較し、
/// 一致した場合のみデコード結果を返す。不一致は致命的エラーで、リトライしてはならない。
pub struct RecoveryVerifier<D, F> {
    decoder: D,
    format: F,
}

impl<D: TransactionDecoder, F: TxFormat> RecoveryVerifier<D, F> {
    pub fn new(decoder: D, format: F) -> Self {
        RecoveryVerifier { decoder, format }
    }

    pub async fn verify(&self, tx_info: &TransactionInfo) -> Result<DecodedTransaction, RecoveryError> {
        log::info!("リカバリートランザクションの検証を開始します ({})。", self.format.name());

        let decoded = self.decoder.decode_transaction(&tx_info.transaction_hex).await?;

        let raw_tx = hex::decode(&tx_info.transaction_hex)
            .map_err(|e| RecoveryError::InvalidTransaction(format!("16進数のデコードに失敗: {}", e)))?;
        let computed = self.format.compute_id(&raw_tx)?;

        if !ids_match(&decoded.txid, &computed) {
            log::error!("エクスプローラーが報告したTxId: {}", decoded.txid);
            log::error!("ローカルで計算したTxId: {}", computed);
            return Err(RecoveryError::IntegrityMismatch {
                reported: decoded.txid,
                computed,
            });
        }

        log::info!("リカバリートランザクションの検証に成功しました: {}", computed);
        Ok(decoded)
    }
}

// 16進数として読めないIDは常に不一致
fn ids_match(reported: &str, computed: &str) -> bool {
    match (hex::decode(reported), hex::decode(computed)) {
        (Ok(reported), Ok(computed)) => !computed.is_empty() && reported == computed,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;

    struct FixedDecoder(Result<DecodedTransaction, ()>);

    impl TransactionDecoder for FixedDecoder {
        async fn decode_transaction(&self, _hex: &str) -> Result<DecodedTransaction, RecoveryError> {
            self.0.clone().map_err(|_| {
                let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
                RecoveryError::transport("https://explorer.test/decodetx", timeout)
            })
        }
    }

    struct FixedFormat(&'static str);

    impl TxFormat for FixedFormat {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn compute_id(&self, _raw_tx: &[u8]) -> Result<String, RecoveryError> {
            Ok(self.0.to_string())
        }
    }

    fn decoded(txid: &str) -> DecodedTransaction {
        let mut detail = Map::new();
        detail.insert("Outputs".into(), json!([{ "Value": "0.1" }]));
        DecodedTransaction {
            txid: txid.to_string(),
            detail,
        }
    }

    #[tokio::test]
    async fn matching_ids_return_decoded_detail() {
        let verifier = RecoveryVerifier::new(FixedDecoder(Ok(decoded("abc123"))), FixedFormat("abc123"));
        let result = verifier.verify(&TransactionInfo::new("00")).await.unwrap();
        assert_eq!(result, decoded("abc123"));
    }

    #[tokio::test]
    async fn mismatched_ids_fail_without_detail() {
        let verifier = RecoveryVerifier::new(FixedDecoder(Ok(decoded("zzz999"))), FixedFormat("abc123"));
        match verifier.verify(&TransactionInfo::new("00")).await {
            Err(RecoveryError::IntegrityMismatch { reported, computed }) => {
                assert_eq!(reported, "zzz999");
                assert_eq!(computed, "abc123");
            }
            other => panic!("integrity error expected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn case_of_hex_does_not_matter() {
        let verifier = RecoveryVerifier::new(FixedDecoder(Ok(decoded("ABC123"))), FixedFormat("abc123"));
        assert!(verifier.verify(&TransactionInfo::new("00")).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_hex_is_never_verified() {
        let verifier = RecoveryVerifier::new(FixedDecoder(Ok(decoded("abc123"))), FixedFormat("abc123"));
        let err = verifier.verify(&TransactionInfo::new("0g")).await.unwrap_err();
        assert!(matches!(err, RecoveryError::InvalidTransaction(_)));
    }

    #[tokio::test]
    async fn decoder_failure_is_surfaced() {
        let verifier = RecoveryVerifier::new(FixedDecoder(Err(())), FixedFormat("abc123"));
        let err = verifier.verify(&TransactionInfo::new("00")).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn bitcoin_format_rejects_garbage() {
        assert!(matches!(
            BitcoinTxFormat.compute_id(&[0x01, 0x00]),
            Err(RecoveryError::InvalidTransaction(_))
        ));
    }
}
