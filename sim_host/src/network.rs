//! Simulated network for the host's fetch op.
//!
//! Responses come from a route table keyed by exact url. There is no real
//! socket; an unrouted url fails the way an unreachable host would.

use host_api::{FetchResponse, HostError};
use std::collections::HashMap;

/// A canned response
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    status: u16,
    body: String,
}

/// Url → response table
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the response for `url`
    pub fn insert(&mut self, url: impl Into<String>, status: u16, body: impl Into<String>) {
        self.routes.insert(
            url.into(),
            Route {
                status,
                body: body.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolves `url` against the table
    pub fn fetch(&self, url: &str) -> Result<FetchResponse, HostError> {
        let route = self.routes.get(url).ok_or_else(|| HostError::Network {
            url: url.to_string(),
            message: "no route to host".to_string(),
        })?;
        Ok(FetchResponse {
            url: url.to_string(),
            status: route.status,
            body: route.body.clone(),
        })
    }
}
