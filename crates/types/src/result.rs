//! The result envelope returned by every provider operation.

use crate::error::{ErrorKind, OasisError};
use crate::provider::ProviderType;
use std::error::Error as StdError;

/// Outcome of a provider operation.
///
/// An envelope is built once, either as a success carrying the value or as an
/// error carrying an [`OasisError`]. Warnings record non-fatal problems such as
/// a failed replication mirror, and `provider` names the backend that produced
/// the outcome when one did.
#[must_use]
#[derive(Debug, Clone)]
pub struct OasisResult<T> {
    outcome: Result<T, OasisError>,
    message: String,
    warnings: Vec<String>,
    provider: Option<ProviderType>,
}

impl<T> OasisResult<T> {
    pub fn ok(value: T) -> Self {
        Self::ok_with_message(value, String::new())
    }

    pub fn ok_with_message(value: T, message: impl Into<String>) -> Self {
        Self {
            outcome: Ok(value),
            message: message.into(),
            warnings: Vec::new(),
            provider: None,
        }
    }

    /// Error envelope; the message is the error's display text.
    pub fn err(error: OasisError) -> Self {
        Self {
            message: error.to_string(),
            outcome: Err(error),
            warnings: Vec::new(),
            provider: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn into_value(self) -> Option<T> {
        self.outcome.ok()
    }

    pub fn error(&self) -> Option<&OasisError> {
        self.outcome.as_ref().err()
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error().map(OasisError::kind)
    }

    /// Human readable message. Never empty for an error envelope.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying cause of the error, if one was attached.
    pub fn cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.error().and_then(|error| error.source())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Backend that produced this outcome.
    pub fn provider(&self) -> Option<ProviderType> {
        self.provider
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.extend(warnings.into_iter().map(Into::into));
        self
    }

    /// Replace the message, keeping the outcome.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if self.is_ok() || !message.trim().is_empty() {
            self.message = message;
        }
        self
    }

    pub fn with_provider(mut self, provider: ProviderType) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn into_result(self) -> Result<T, OasisError> {
        self.outcome
    }

    /// Transform the success value, keeping message, warnings and provider.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OasisResult<U> {
        OasisResult {
            outcome: self.outcome.map(f),
            message: self.message,
            warnings: self.warnings,
            provider: self.provider,
        }
    }
}

impl<T> From<OasisError> for OasisResult<T> {
    fn from(error: OasisError) -> Self {
        Self::err(error)
    }
}

impl<T> From<Result<T, OasisError>> for OasisResult<T> {
    fn from(result: Result<T, OasisError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_has_message_and_no_value() {
        let result: OasisResult<u32> = OasisResult::err(OasisError::not_found("holon 42"));
        assert!(result.is_error());
        assert!(result.value().is_none());
        assert_eq!(result.message(), "holon 42 not found");
        assert_eq!(result.kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn map_preserves_warnings_and_provider() {
        let result = OasisResult::ok(2)
            .with_warning("mirror IPFSOASIS failed")
            .with_provider(ProviderType::MongoDb)
            .map(|value| value * 10);
        assert_eq!(result.value(), Some(&20));
        assert_eq!(result.warnings(), ["mirror IPFSOASIS failed".to_string()]);
        assert_eq!(result.provider(), Some(ProviderType::MongoDb));
    }

    #[test]
    fn cause_is_read_from_error_source() {
        let error = OasisError::fault(ProviderType::Solana, "load_holon", "unreachable");
        let result: OasisResult<()> = error.into();
        assert_eq!(result.cause().unwrap().to_string(), "panicked: unreachable");
    }
}
