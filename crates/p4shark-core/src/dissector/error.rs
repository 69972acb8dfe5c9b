use thiserror::Error;

/// Errors returned when a dissector cannot be generated.
///
/// # Examples
/// ```
/// use p4shark_core::GenerateError;
///
/// let err = GenerateError::ProtocolNotFound {
///     protocol: "sctp".to_string(),
/// };
/// assert!(err.to_string().contains("protocol not found"));
/// ```
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("protocol not found: {protocol}")]
    ProtocolNotFound { protocol: String },
}
