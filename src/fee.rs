use serde_json::Value;

use crate::error::RecoveryError;
use crate::transport::HttpTransport;
use crate::types::{FeeEstimate, FeeSource};

pub const DEFAULT_FEE_RECOMMENDATION_URL: &str =
    "https://bitcoinfees.earn.com/api/v1/fees/recommended";

/// 推奨手数料が取得できない場合の値 (sat/byte)。未承認のまま残るより払い過ぎの方が回復可能なため高め
pub const FALLBACK_FEE_SATS_PER_BYTE: u64 = 100;

/// 外部の手数料推奨APIから sat/byte を取得する
#[derive(Debug, Clone)]
pub struct FeeEstimator<T> {
    transport: T,
}

impl<T: HttpTransport> FeeEstimator<T> {
    pub fn new(transport: T) -> Self {
        FeeEstimator { transport }
    }

    pub async fn get_recommended_fee_default(&self) -> Result<FeeEstimate, RecoveryError> {
        self.get_recommended_fee(DEFAULT_FEE_RECOMMENDATION_URL).await
    }

    /// 通信エラーはそのまま返す。レスポンスの形式不正はフォールバック値に置き換える
    pub async fn get_recommended_fee(&self, source_url: &str) -> Result<FeeEstimate, RecoveryError> {
        let payload = match self.transport.get_json(source_url).await {
            Ok(payload) => payload,
            Err(RecoveryError::MalformedResponse { detail, .. }) => {
                log::warn!("手数料APIのレスポンスがJSONではありません: {}", detail);
                Value::Null
            }
            Err(e) => return Err(e),
        };
        Ok(fee_from_payload(&payload))
    }
}

/// `hourFee` が正の整数ならその値、それ以外はフォールバック値
pub fn fee_from_payload(payload: &Value) -> FeeEstimate {
    match hour_fee(payload) {
        Some(fee) => FeeEstimate {
            satoshis_per_byte: fee,
            source: FeeSource::Live,
        },
        None => {
            log::warn!(
                "hourFee を取得できないためフォールバック手数料 {} sat/byte を使用します。",
                FALLBACK_FEE_SATS_PER_BYTE
            );
            FeeEstimate {
                satoshis_per_byte: FALLBACK_FEE_SATS_PER_BYTE,
                source: FeeSource::Fallback,
            }
        }
    }
}

fn hour_fee(payload: &Value) -> Option<u64> {
    let field = payload.get("hourFee")?;
    let fee = match field.as_u64() {
        Some(fee) => fee,
        None => {
            // 37.0 のように小数部が0の数値も整数とみなす
            let f = field.as_f64()?;
            if f.fract() != 0.0 || f < 0.0 || f >= u64::MAX as f64 {
                return None;
            }
            f as u64
        }
    };
    (fee > 0).then_some(fee)
}
