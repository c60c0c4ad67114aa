use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 呼び出し側が用意したリカバリートランザクション
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub transaction_hex: String,
}

impl TransactionInfo {
    pub fn new(transaction_hex: impl Into<String>) -> Self {
        TransactionInfo {
            transaction_hex: transaction_hex.into().trim().to_string(),
        }
    }
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeeSource {
    Live,
    Fallback,
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub satoshis_per_byte: u64, // 常に 0 より大きい
    pub source: FeeSource,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub address: String,
    pub transaction_count: u64,
    pub total_balance_satoshis: i64,
}

/// エクスプローラーが返したUTXO。`txid`・`n`・`value_int` を含む元のフィールドは `extra` にそのまま残す
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    pub transaction_id: String,
    pub output_index: u32,
    pub amount_satoshis: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// エクスプローラーによるトランザクションのデコード結果。金額の根拠としては使わない
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DecodedTransaction {
    #[serde(rename = "TxId")]
    pub txid: String,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}
