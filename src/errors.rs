pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An indicator window reaches further back than the available history.
    #[error("Insufficient data: window of {length} bars needs more than {available} available")]
    InsufficientData {
        /// Requested window length.
        length: usize,
        /// Bars available up to and including the end index.
        available: usize,
    },

    /// The bar series cannot be simulated (fewer than two bars, unordered dates).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The average daily range is zero, so a position cannot be sized.
    #[error("Average daily range is zero: cannot size a position")]
    ZeroAdr,

    /// A bar violates the OHLC ordering.
    #[error("Invalid bar: {0}")]
    InvalidBar(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error occurred.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML configuration could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The plotting backend failed.
    #[cfg(feature = "draws")]
    #[error("Plotters error: {0}")]
    Plotters(String),

    /// Free-form error.
    #[error("{0}")]
    Msg(String),
}
