use thiserror::Error;

use crate::provider::ProviderId;

/// Everything that can go wrong while fetching current conditions.
///
/// A fetch either yields a complete reading or one of these; there are no
/// partial results.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No API key configured for provider '{0}'")]
    MissingApiKey(ProviderId),

    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("Malformed {provider} payload: {reason}")]
    Payload { provider: ProviderId, reason: String },
}

impl FetchError {
    pub(crate) fn payload(provider: ProviderId, reason: impl Into<String>) -> Self {
        FetchError::Payload { provider, reason: reason.into() }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "ñ".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }

    #[test]
    fn status_error_mentions_provider_and_code() {
        let err = FetchError::Status {
            provider: ProviderId::OpenWeather,
            status: 401,
            body: "Invalid API key".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("openweather"));
        assert!(msg.contains("401"));
    }
}
