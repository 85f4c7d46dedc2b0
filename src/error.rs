use thiserror::Error;

#[derive(Error, Debug)]
pub enum TandemError {
    /// Pattern analysis failure.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// The input contains bytes reserved as replacement tokens.
    #[error("input contains characters matching the reserved token class {class}")]
    ReservedToken { class: String },

    /// No usable byte is absent from the input, so no token can be assigned.
    #[error("no tokens available")]
    NoFreeTokens,

    /// Token allocation failure.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// The simulated decode did not reproduce the input.
    #[error("verification failed: {0}")]
    Verification(String),

    /// Background worker failure.
    #[error("worker error: {0}")]
    Worker(String),

    /// Invalid option combination.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch all for unexpected internal problems.
    #[error("internal error: {0}")]
    Internal(String),
}
