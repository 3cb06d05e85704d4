use thiserror::Error;

/// Failures reported by a page driver.
#[derive(Clone, Debug, Error)]
pub enum DriverError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("cdp i/o failure: {0}")]
    Io(String),
}

/// Terminal failure of one login flow run.
#[derive(Clone, Debug, Error)]
pub enum FlowError {
    #[error("too many people trying to logon. please try again later")]
    RateLimited,
    #[error("unable to handle the page content")]
    UnrecognizedPage,
    #[error("failed to parse JSON: {0}")]
    MalformedResponse(String),
    #[error("token not found in the response")]
    TokenMissing,
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("page driver error: {0}")]
    Driver(DriverError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FlowError::Timeout(_))
    }

    /// Short stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::RateLimited => "rate_limited",
            FlowError::UnrecognizedPage => "unrecognized_page",
            FlowError::MalformedResponse(_) => "malformed_response",
            FlowError::TokenMissing => "token_missing",
            FlowError::Timeout(_) => "timeout",
            FlowError::Driver(_) => "driver",
            FlowError::Internal(_) => "internal",
        }
    }
}

impl From<DriverError> for FlowError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Timeout(what) => FlowError::Timeout(what),
            other => FlowError::Driver(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_timeout_becomes_flow_timeout() {
        let err: FlowError = DriverError::Timeout("page load".into()).into();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out waiting for page load");
    }

    #[test]
    fn other_driver_errors_are_wrapped() {
        let err: FlowError = DriverError::NotFound("secret field".into()).into();
        assert_eq!(err.kind(), "driver");
        assert_eq!(err.to_string(), "page driver error: secret field not found");
    }
}
