use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const REQUEST_TIMEOUT_SECS: u64 = 15;
/// The FPL API rejects requests without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; fpl-assistant)";

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. Every caller goes through this so the timeout
/// and user agent stay in one place.
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}
