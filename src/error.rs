use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("リクエストエラー: {0}")]
    InvalidRequest(String),
    #[error("IOエラー: {0}")]
    Io(String),
    #[error("設定エラー: {0}")]
    Settings(String),
    #[error("ワーカーエラー: {0}")]
    Worker(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Reasons a binary property list payload could not yield a timestamp.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlistError {
    #[error("ペイロードが短すぎます ({len} バイト)")]
    TooShort { len: usize },
    #[error("bplist ヘッダーがありません")]
    BadMagic,
    #[error("トレーラーが不正です: {0}")]
    InvalidTrailer(&'static str),
    #[error("オブジェクトのオフセットが範囲外です: {offset}")]
    OffsetOutOfRange { offset: u64 },
    #[error("ルートオブジェクトが日時/実数ではありません (marker 0x{marker:02x})")]
    UnsupportedRoot { marker: u8 },
}
