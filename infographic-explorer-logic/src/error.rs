use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unknown explorer: {0}")]
    UnknownExplorer(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("middleware error: {0}")]
    Middleware(anyhow::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request to {url} failed with status {status}: {body}")]
    UnexpectedStatus {
        url: Url,
        status: StatusCode,
        body: String,
    },
}

impl From<reqwest_middleware::Error> for TransportError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => TransportError::Request(err),
            reqwest_middleware::Error::Middleware(err) => TransportError::Middleware(err),
        }
    }
}

impl From<reqwest_middleware::Error> for ExplorerError {
    fn from(err: reqwest_middleware::Error) -> Self {
        ExplorerError::Transport(err.into())
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        ExplorerError::Transport(err.into())
    }
}
