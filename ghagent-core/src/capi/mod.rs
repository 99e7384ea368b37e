//! Typed client for the Copilot agent-task API.

mod client;
mod graphql;
mod hydrate;

pub use client::{
    CapiClient, CapiHttpClient, AGENTS_HOME_URL, DEFAULT_CAPI_BASE_URL, DEFAULT_GRAPHQL_URL,
};
