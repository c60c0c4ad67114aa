use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    /// 接続失敗・タイムアウト・5xx。リトライ判断は呼び出し側に任せる
    #[error("通信エラー (URL: {url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// 4xx 応答。リクエスト自体が拒否されたため再試行しても解消しない
    #[error("リクエストが拒否されました (URL: {url}): HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("想定外のレスポンス形式 (エンドポイント: {endpoint}): {detail}")]
    MalformedResponse { endpoint: String, detail: String },

    #[error("リカバリートランザクションのデコードに失敗しました: {0}")]
    InvalidTransaction(String),

    // 最も重大なエラー。トランザクション詳細は絶対に返さない
    #[error("リカバリートランザクションIDが一致しません: エクスプローラー {reported}, ローカル計算 {computed}")]
    IntegrityMismatch { reported: String, computed: String },

    #[error("入力検証エラー: {0}")]
    InputValidation(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("ファイル読み込みエラー: {file_path:?}, 詳細: {source}")]
    FileRead {
        file_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSONシリアライズエラー: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecoveryError {
    pub fn transport<E>(url: &str, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        RecoveryError::Transport {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub fn malformed(endpoint: &str, detail: impl ToString) -> Self {
        RecoveryError::MalformedResponse {
            endpoint: endpoint.to_string(),
            detail: detail.to_string(),
        }
    }

    /// 再試行で解消し得るエラーかどうか。通信エラー (接続・タイムアウト・5xx) のみが該当する
    pub fn is_transient(&self) -> bool {
        matches!(self, RecoveryError::Transport { .. })
    }
}
