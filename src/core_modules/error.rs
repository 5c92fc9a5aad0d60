use thiserror::Error;

pub type ShadowResult<T> = Result<T, ShadowError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShadowError {
    #[error("{channel} step must be strictly positive, got {value}")]
    InvalidStep { channel: &'static str, value: i32 },
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
    #[error("{plane} plane is {actual:?} (width, height) but expected {expected:?}")]
    DimensionMismatch {
        plane: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("color bins hold {binned} pixels but the foreground mask marks {foreground}")]
    BinPartitionMismatch { binned: usize, foreground: usize },
    #[error("connectivity labeling produced label {label} with no pixels")]
    EmptyComponent { label: u32 },
    #[error("connectivity labeling assigned label {label} to bin pixel ({row}, {col})")]
    LabelingInconsistent { row: u32, col: u32, label: u32 },
    #[error("bin worker panicked: {message}")]
    WorkerPanicked { message: String },
}

impl ShadowError {
    pub fn worker_panicked(message: impl Into<String>) -> Self {
        Self::WorkerPanicked {
            message: message.into(),
        }
    }
}
