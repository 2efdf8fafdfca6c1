//! `GET /api/generate`: parse, look up the agent, compose the prompt,
//! start generation and hand the stream to the relay.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use genweb_config::{AgentDirectory, AgentDirectoryError};
use genweb_core::{GenerationRequest, ProviderError, compose};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::SharedState;
use crate::relay;

/// Raw query parameters. Both are optional so that missing values map to
/// our own 400 body; malformed query strings are mapped in the handler.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    pub agent: Option<String>,
    pub query: Option<String>,
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub agent: String,
    pub query: String,
}

/// Failures of the generate endpoint, each mapped to one HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Agent and query are required")]
    InvalidRequest,

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error(transparent)]
    AgentDirectory(#[from] AgentDirectoryError),

    /// Raised before any byte is streamed. Answered with a bare 500 and an
    /// empty body; the provider error is only logged.
    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] ProviderError),
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        match &self {
            GenerateError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Agent and query are required" })),
            )
                .into_response(),
            GenerateError::AgentNotFound(agent) => {
                warn!(agent = %agent, "Unknown agent requested");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Agent not found" })),
                )
                    .into_response()
            }
            GenerateError::AgentDirectory(e) => {
                error!(error = %e, "Agent directory unavailable");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            GenerateError::GenerationFailed(e) => {
                error!(error = %e, "Generation failed before streaming");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub async fn generate_handler(
    State(state): State<SharedState>,
    params: Result<Query<GenerateParams>, QueryRejection>,
) -> Result<Response, GenerateError> {
    let Query(params) = params.map_err(|e| {
        debug!(error = %e, "Rejected malformed query string");
        GenerateError::InvalidRequest
    })?;
    let request = parse_request(&params)?;

    // Read fresh so edits to the file apply without a restart
    let directory = AgentDirectory::load(&state.config.gateway.agents_file).await?;
    let agent = directory
        .lookup(&request.agent)
        .ok_or_else(|| GenerateError::AgentNotFound(request.agent.clone()))?;

    info!(agent = %request.agent, query = %request.query, "Generating page");

    let prompt = compose(agent, &request.query);
    let generation = GenerationRequest::new(&state.model, prompt)
        .with_temperature(state.config.default_temperature)
        .with_max_tokens(state.config.default_max_tokens);

    let stream = state.provider.stream(generation).await?;
    Ok(relay::html_response(stream))
}

/// Accepts either explicit `agent` + `query`, or a lone `query` holding a
/// `web+gen://<agent>/<words>/...` URL.
pub fn parse_request(params: &GenerateParams) -> Result<ParsedRequest, GenerateError> {
    let agent = params.agent.as_deref().unwrap_or_default();
    let query = params.query.as_deref().unwrap_or_default();

    if query.is_empty() {
        return Err(GenerateError::InvalidRequest);
    }

    if !agent.is_empty() {
        return Ok(ParsedRequest {
            agent: agent.to_string(),
            query: query.to_string(),
        });
    }

    parse_scheme_url(query).ok_or(GenerateError::InvalidRequest)
}

/// Split a custom-scheme URL into agent (the host) and query (non-empty
/// path segments joined by single spaces).
fn parse_scheme_url(url: &str) -> Option<ParsedRequest> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }

    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (host, tail) = rest.split_at(host_end);
    let path = tail.split(['?', '#']).next().unwrap_or_default();

    let query = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if host.is_empty() || query.is_empty() {
        return None;
    }

    Some(ParsedRequest {
        agent: host.to_string(),
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(agent: Option<&str>, query: Option<&str>) -> GenerateParams {
        GenerateParams {
            agent: agent.map(String::from),
            query: query.map(String::from),
        }
    }

    #[test]
    fn explicit_agent_and_query() {
        let parsed = parse_request(&params(Some("nike.com"), Some("plan a hike"))).unwrap();
        assert_eq!(parsed.agent, "nike.com");
        assert_eq!(parsed.query, "plan a hike");
    }

    #[test]
    fn missing_query_is_invalid() {
        assert!(matches!(
            parse_request(&params(Some("nike.com"), None)),
            Err(GenerateError::InvalidRequest)
        ));
        assert!(matches!(
            parse_request(&params(Some("nike.com"), Some(""))),
            Err(GenerateError::InvalidRequest)
        ));
    }

    #[test]
    fn scheme_url_in_query() {
        let parsed =
            parse_request(&params(None, Some("web+gen://nike.com/plan/a/hike"))).unwrap();
        assert_eq!(
            parsed,
            ParsedRequest {
                agent: "nike.com".into(),
                query: "plan a hike".into(),
            }
        );
    }

    #[test]
    fn empty_agent_falls_back_to_scheme_url() {
        let parsed = parse_request(&params(Some(""), Some("web+gen://acme.dev/anvils"))).unwrap();
        assert_eq!(parsed.agent, "acme.dev");
        assert_eq!(parsed.query, "anvils");
    }

    #[test]
    fn scheme_url_collapses_empty_segments() {
        let parsed = parse_scheme_url("web+gen://nike.com//plan///hike/").unwrap();
        assert_eq!(parsed.query, "plan hike");
    }

    #[test]
    fn scheme_url_ignores_query_and_fragment() {
        let parsed = parse_scheme_url("web+gen://nike.com/plan/hike?x=1#top").unwrap();
        assert_eq!(parsed.agent, "nike.com");
        assert_eq!(parsed.query, "plan hike");
    }

    #[test]
    fn unparseable_urls_are_rejected() {
        assert!(parse_scheme_url("plan a hike").is_none());
        assert!(parse_scheme_url("://nike.com/plan").is_none());
        assert!(parse_scheme_url("web+gen:///plan").is_none());
        assert!(parse_scheme_url("web+gen://nike.com").is_none());
        assert!(parse_scheme_url("web+gen://nike.com/").is_none());
    }

    #[test]
    fn plain_query_without_agent_is_invalid() {
        assert!(matches!(
            parse_request(&params(None, Some("plan a hike"))),
            Err(GenerateError::InvalidRequest)
        ));
    }
}
