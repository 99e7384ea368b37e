//! Minimal GraphQL transport: a query string plus a variables object,
//! posted as JSON, with the `data`/`errors` envelope unwrapped.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::client::CapiHttpClient;
use crate::error::{AgentTaskError, AgentTaskResult};

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct GraphqlEnvelope<T> {
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

impl CapiHttpClient {
    pub(crate) async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> AgentTaskResult<T> {
        let res = self
            .request(Method::POST, self.graphql_url.clone())
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(AgentTaskError::Graphql(res.status().to_string()));
        }

        let envelope: GraphqlEnvelope<T> = res
            .json()
            .await
            .map_err(|e| AgentTaskError::Graphql(e.to_string()))?;

        if !envelope.errors.is_empty() {
            let messages: Vec<&str> = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect();
            return Err(AgentTaskError::Graphql(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| AgentTaskError::Graphql("empty response".to_string()))
    }
}
