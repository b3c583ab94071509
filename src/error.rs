use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Request for {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Couldn't resolve url {url} against {base}")]
    BadUrl { base: String, url: String },
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Table is not wired for sorting.")]
    SortingNotEnabled,
    #[error("Column {column} is out of range, table has {len} headers.")]
    ColumnOutOfRange { column: usize, len: usize },
}
