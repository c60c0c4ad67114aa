use std::future::Future;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::environment::Environment;
use crate::error::RecoveryError;
use crate::transport::HttpTransport;
use crate::types::{AddressInfo, DecodedTransaction, UnspentOutput};

// --- エクスプローラーのレスポンススキーマ ---

#[derive(Deserialize, Debug)]
struct AddressResponse {
    address: AddressSummary,
}

#[derive(Deserialize, Debug)]
struct AddressSummary {
    #[serde(default)]
    address: Option<String>,
    total: AddressTotals,
}

#[derive(Deserialize, Debug)]
struct AddressTotals {
    transaction_count: u64,
    balance_int: i64,
}

#[derive(Deserialize, Debug)]
struct UnspentResponse {
    unspent: Vec<RawUnspent>,
}

#[derive(Deserialize, Debug)]
struct RawUnspent {
    txid: String,
    n: u32,
    value_int: u64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize, Debug)]
struct DecodeResponse {
    transaction: DecodedTransaction,
}

fn parse_payload<P: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<P, RecoveryError> {
    serde_json::from_value(payload).map_err(|e| RecoveryError::malformed(endpoint, e))
}

/// リカバリートランザクションをエクスプローラー側でデコードする機能
pub trait TransactionDecoder: Send + Sync {
    fn decode_transaction(
        &self,
        transaction_hex: &str,
    ) -> impl Future<Output = Result<DecodedTransaction, RecoveryError>> + Send;
}

/// ブロックエクスプローラーAPIのクライアント。呼び出しごとに取得し直し、キャッシュは持たない
#[derive(Debug, Clone)]
pub struct ExplorerClient<T> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> ExplorerClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        ExplorerClient {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn for_environment(transport: T, environment: &Environment) -> Self {
        Self::new(transport, environment.explorer_base_url.clone())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/blockchain{}", self.base_url, path)
    }

    pub async fn get_address_info(&self, address: &str) -> Result<AddressInfo, RecoveryError> {
        let url = self.url(&format!("/address/{}", address));
        let payload = self.transport.get_json(&url).await?;
        let response: AddressResponse = parse_payload(&url, payload)?;

        let info = AddressInfo {
            address: response
                .address
                .address
                .unwrap_or_else(|| address.to_string()),
            transaction_count: response.address.total.transaction_count,
            total_balance_satoshis: response.address.total.balance_int,
        };
        log::debug!(
            "アドレス情報取得: address={}, tx_count={}, balance={}",
            info.address,
            info.transaction_count,
            info.total_balance_satoshis
        );
        Ok(info)
    }

    /// エクスプローラーが返した順序と件数をそのまま保つ (ソート・重複排除はしない)
    pub async fn get_unspent_outputs(
        &self,
        address: &str,
    ) -> Result<Vec<UnspentOutput>, RecoveryError> {
        let url = self.url(&format!("/address/{}/unspent", address));
        let payload = self.transport.get_json(&url).await?;
        let response: UnspentResponse = parse_payload(&url, payload)?;

        let unspents: Vec<UnspentOutput> = response
            .unspent
            .into_iter()
            .map(|raw| {
                let mut extra = raw.extra;
                extra.insert("txid".to_string(), Value::from(raw.txid.clone()));
                extra.insert("n".to_string(), Value::from(raw.n));
                extra.insert("value_int".to_string(), Value::from(raw.value_int));
                UnspentOutput {
                    transaction_id: raw.txid,
                    output_index: raw.n,
                    amount_satoshis: raw.value_int,
                    extra,
                }
            })
            .collect();
        log::debug!("UTXO取得: address={}, 件数={}", address, unspents.len());
        Ok(unspents)
    }
}

impl<T: HttpTransport> TransactionDecoder for ExplorerClient<T> {
    async fn decode_transaction(
        &self,
        transaction_hex: &str,
    ) -> Result<DecodedTransaction, RecoveryError> {
        let url = self.url("/decodetx");
        let payload = self
            .transport
            .post_json(&url, &json!({ "hex": transaction_hex }))
            .await?;
        let response: DecodeResponse = parse_payload(&url, payload)?;
        Ok(response.transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::StubTransport;

    const BASE: &str = "https://explorer.test/v1";

    fn client(transport: StubTransport) -> ExplorerClient<StubTransport> {
        ExplorerClient::new(transport, format!("{}/", BASE))
    }

    #[test]
    fn urls_are_built_under_blockchain_prefix() {
        let explorer = client(StubTransport::default());
        assert_eq!(
            explorer.url("/address/abc/unspent"),
            "https://explorer.test/v1/blockchain/address/abc/unspent"
        );
    }

    #[tokio::test]
    async fn address_info_is_flattened() {
        let url = format!("{}/blockchain/address/2N1abc", BASE);
        let stub = StubTransport::default().with_route(
            &url,
            json!({
                "success": true,
                "address": {
                    "address": "2N1abc",
                    "total": { "transaction_count": 7, "balance": "0.5", "balance_int": 50_000_000 }
                }
            }),
        );

        let info = client(stub).get_address_info("2N1abc").await.unwrap();
        assert_eq!(
            info,
            AddressInfo {
                address: "2N1abc".into(),
                transaction_count: 7,
                total_balance_satoshis: 50_000_000,
            }
        );
    }

    #[tokio::test]
    async fn address_info_rejects_missing_or_mistyped_fields() {
        let url = format!("{}/blockchain/address/2N1abc", BASE);
        for payload in [
            json!({ "address": { "total": { "transaction_count": 7 } } }),
            json!({ "address": { "total": { "transaction_count": 7, "balance_int": "12" } } }),
            json!({ "address": { "total": { "transaction_count": 1.5, "balance_int": 12 } } }),
            json!({ "address": {} }),
        ] {
            let stub = StubTransport::default().with_route(&url, payload);
            let err = client(stub).get_address_info("2N1abc").await.unwrap_err();
            assert!(matches!(err, RecoveryError::MalformedResponse { .. }), "{:?}", err);
        }
    }

    #[tokio::test]
    async fn unspents_keep_order_and_native_fields() {
        let url = format!("{}/blockchain/address/2N1abc/unspent", BASE);
        let stub = StubTransport::default().with_route(
            &url,
            json!({
                "unspent": [
                    { "txid": "bb", "n": 1, "value": "0.0003", "value_int": 30_000, "confirmations": 2 },
                    { "txid": "aa", "n": 0, "value": "0.0001", "value_int": 10_000, "confirmations": 9 },
                    { "txid": "bb", "n": 1, "value": "0.0003", "value_int": 30_000, "confirmations": 2 }
                ]
            }),
        );

        let unspents = client(stub).get_unspent_outputs("2N1abc").await.unwrap();
        let amounts: Vec<u64> = unspents.iter().map(|u| u.amount_satoshis).collect();
        assert_eq!(amounts, vec![30_000, 10_000, 30_000]);
        assert_eq!(unspents[1].transaction_id, "aa");
        assert_eq!(unspents[1].output_index, 0);
        assert_eq!(unspents[1].extra.get("confirmations"), Some(&json!(9)));
        assert_eq!(unspents[0].extra.get("value"), Some(&json!("0.0003")));

        let output = serde_json::to_value(&unspents[1]).unwrap();
        assert_eq!(output["amountSatoshis"], json!(10_000));
        assert_eq!(output["transactionId"], json!("aa"));
        assert_eq!(output["outputIndex"], json!(0));
        assert_eq!(output["value_int"], json!(10_000));
        assert_eq!(output["txid"], json!("aa"));
        assert_eq!(output["n"], json!(0));
    }

    #[tokio::test]
    async fn unspents_without_integer_value_are_malformed() {
        let url = format!("{}/blockchain/address/2N1abc/unspent", BASE);
        let stub = StubTransport::default().with_route(
            &url,
            json!({ "unspent": [ { "txid": "aa", "n": 0, "value": "0.0001" } ] }),
        );
        let err = client(stub).get_unspent_outputs("2N1abc").await.unwrap_err();
        assert!(matches!(err, RecoveryError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn decode_posts_hex_and_reads_reported_id() {
        let url = format!("{}/blockchain/decodetx", BASE);
        let stub = StubTransport::default().with_route(
            &url,
            json!({ "success": true, "transaction": { "TxId": "abc123", "Version": "1" } }),
        );
        let explorer = client(stub);

        let decoded = explorer.decode_transaction("0100").await.unwrap();
        assert_eq!(decoded.txid, "abc123");
        assert_eq!(decoded.detail.get("Version"), Some(&json!("1")));

        let requests = explorer.transport.requests.lock().unwrap();
        assert_eq!(requests[0], (url.clone(), Some(json!({ "hex": "0100" }))));
    }

    #[tokio::test]
    async fn transport_failures_are_not_rewritten() {
        let err = client(StubTransport::default())
            .get_address_info("2N1abc")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
