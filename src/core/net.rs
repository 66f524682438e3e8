// src/core/net.rs
// Blocking HTTP helpers shared by the sheet fetcher and the push dispatcher.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::consts::USER_AGENT;
use crate::error::FetchError;

/// Client with our UA and a hard request timeout. Runs are not cancellable,
/// so the timeout is the only bound on a hung endpoint.
pub fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// GET `url` and return the body as text. Any non-2xx status is an error.
pub fn http_get(client: &Client, url: &str) -> Result<String, FetchError> {
    let transport = |source| FetchError::Transport { url: s!(url), source };

    let resp = client.get(url).send().map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status { url: s!(url), status: status.as_u16() });
    }
    resp.text().map_err(transport)
}

/// Keep log lines short when a provider sends back a whole HTML error page.
pub fn snippet(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => s!(body),
    }
}
