/// Everything that can go wrong during one fetch-and-normalize cycle.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    Endpoint { endpoint: String, reason: String },
    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("requesting {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("response is not a JSON array of samples: {0}")]
    Json(#[from] serde_json::Error),
    #[error("series contains no samples")]
    EmptySeries,
    #[error("latest sample has no speed value (row has {columns} columns)")]
    MissingSpeed { columns: usize },
    #[error("latest sample speed '{raw}' is not a finite number")]
    InvalidSpeed { raw: String },
}
