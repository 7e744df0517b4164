#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("IO: {0}")]
    IO(#[from] std::io::Error),

    /// A `]` arrived while no loop was open and nothing was being skipped.
    ///
    /// The `]` is logged and the session stays usable, but a multi-byte feed
    /// stops here: the bytes after it are neither logged nor run.
    #[error("Unmatched right bracket at instruction {index}")]
    UnmatchedLoopEnd { index: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum VMError {
    #[error("IO: {0}")]
    IO(#[from] std::io::Error),

    #[error("Runtime: {0}")]
    Runtime(#[from] RuntimeError),
}

impl VMError {
    pub fn is_unmatched_loop_end(&self) -> bool {
        matches!(
            self,
            VMError::Runtime(RuntimeError::UnmatchedLoopEnd { .. })
        )
    }
}
