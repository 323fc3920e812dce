//! Error tracing extensions
//!
//! Provides utilities for enriching error handling with tracing context.

use crate::types::BridgeError;
use std::error::Error as StdError;

/// Extension trait for adding tracing context to errors
pub trait ErrorTraceExt {
    /// Log error with full context including client-error flag and error chain
    fn trace_error(&self) -> &Self;
}

impl ErrorTraceExt for BridgeError {
    fn trace_error(&self) -> &Self {
        let mut error_chain = Vec::new();
        let mut current_source = self.source();
        while let Some(source) = current_source {
            error_chain.push(source.to_string());
            current_source = source.source();
        }

        tracing::error!(
            error = %self,
            is_client_error = self.is_client_error(),
            error_chain_len = error_chain.len(),
            error_chain = ?error_chain,
            "Bridge error"
        );

        self
    }
}

/// Extension trait for Result types
pub trait ResultTraceExt<T, E>: Sized {
    /// Convert error to BridgeError and log with context
    fn trace_context(self) -> Result<T, BridgeError>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultTraceExt<T, E> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
    BridgeError: From<E>,
{
    fn trace_context(self) -> Result<T, BridgeError> {
        self.map_err(|e| {
            let bridge_error = BridgeError::from(e);
            bridge_error.trace_error();
            bridge_error
        })
    }
}
