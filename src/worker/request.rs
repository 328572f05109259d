//! Intercepted requests as the worker sees them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// == Request Mode ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document fetch
    Navigate,
    #[default]
    SameOrigin,
    Cors,
    NoCors,
}

// == Destination ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    #[default]
    Empty,
}

// == Intercepted Request ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    /// Uppercase method name
    pub method: String,
    /// Absolute URL or origin-relative path, query included
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
    /// Lowercase header names
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl InterceptedRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            mode: RequestMode::default(),
            destination: Destination::default(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }

    /// A top-level page load.
    pub fn navigate(url: &str) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
            .with_header("accept", "text/html,application/xhtml+xml")
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Path and query with any scheme and host removed.
    pub fn path_and_query(&self) -> &str {
        let url = self.url.as_str();
        match url.find("://") {
            Some(scheme_end) => {
                let after = &url[scheme_end + 3..];
                match after.find('/') {
                    Some(slash) => &after[slash..],
                    None => "/",
                }
            }
            None => url,
        }
    }

    /// Path only, without query or fragment.
    pub fn path(&self) -> &str {
        let path_and_query = self.path_and_query();
        path_and_query
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or(path_and_query)
    }

    /// Key under which responses to this request are stored.
    pub fn cache_key(&self) -> String {
        self.path_and_query()
            .split('#')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}
