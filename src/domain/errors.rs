use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// A file the run depends on (weights, dataset descriptor) is absent.
    #[error("找不到檔案: {0}")]
    ArtifactMissing(String),
    #[error("圖片解碼失敗: {0}")]
    DecodeFailed(String),
    #[error("推論失敗: {0}")]
    InferenceFailed(String),
    #[error("訓練失敗: {0}")]
    TrainingFailed(String),
    #[error("輸入無效: {0}")]
    InvalidInput(String),
    #[error("系統忙碌中: {0}")]
    Busy(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
