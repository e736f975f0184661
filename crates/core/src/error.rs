use thiserror::Error;

/// Why a registry lookup could not run an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("no owner is currently registered for the \"{0}\" area")]
    AreaUnavailable(String),
    #[error("the \"{area}\" area has no operation named \"{operation}\"")]
    OperationMissing { area: String, operation: String },
}

/// Raised while assembling the tool catalog at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown tool \"{0}\"")]
    UnknownTool(String),
    #[error("tool \"{0}\" is listed more than once")]
    DuplicateTool(String),
    #[error("the tool catalog is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no realtime session is active")]
    NotActive,
    #[error("realtime transport error: {0}")]
    Transport(String),
}

/// Failures of the network services behind the generation and scraping tools.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{0}")]
    Remote(String),
}
