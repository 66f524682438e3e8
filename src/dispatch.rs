// src/dispatch.rs
//! Delivery of composed alerts to the push provider.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;

use crate::compose::NotificationMessage;
use crate::config::PushOptions;
use crate::core::net;
use crate::error::{DispatchError, FetchError};

/// What happened to one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Deliberately not sent (e.g. dry run); carries the reason.
    Held(String),
}

/// Push sink. `Sync` so several workers can share one instance.
pub trait Dispatcher: Sync {
    fn dispatch(&self, msg: &NotificationMessage) -> Result<Delivery, DispatchError>;
}

/// OneSignal "create notification" request body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PushPayload<'a> {
    pub app_id: &'a str,
    pub included_segments: [&'a str; 1],
    pub contents: BTreeMap<&'a str, &'a str>,
    pub headings: BTreeMap<&'a str, &'a str>,
}

impl<'a> PushPayload<'a> {
    /// Same text under every configured locale, broadcast to `segment`.
    pub fn new(opts: &'a PushOptions, msg: &'a NotificationMessage) -> Self {
        let per_locale = move |text: &'a str| -> BTreeMap<&'a str, &'a str> {
            opts.locales.iter().map(|l| (l.as_str(), text)).collect()
        };
        Self {
            app_id: opts.app_id.as_str(),
            included_segments: [opts.segment.as_str()],
            contents: per_locale(&msg.body),
            headings: per_locale(&msg.title),
        }
    }
}

pub struct OneSignalDispatcher {
    client: Client,
    opts: PushOptions,
}

impl OneSignalDispatcher {
    pub fn new(opts: PushOptions) -> Result<Self, FetchError> {
        let client = net::client(opts.timeout()).map_err(FetchError::Client)?;
        Ok(Self::with_client(client, opts))
    }

    pub fn with_client(client: Client, opts: PushOptions) -> Self {
        Self { client, opts }
    }
}

impl Dispatcher for OneSignalDispatcher {
    fn dispatch(&self, msg: &NotificationMessage) -> Result<Delivery, DispatchError> {
        let payload = PushPayload::new(&self.opts, msg);
        let resp = self
            .client
            .post(&self.opts.api_url)
            .header(AUTHORIZATION, format!("Basic {}", self.opts.rest_key))
            .json(&payload)
            .send()
            .map_err(DispatchError::Transport)?;

        let status = resp.status();
        // Body is informational only (notification id or error list).
        let body = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(DispatchError::Rejected { status: status.as_u16(), body: net::snippet(&body, 300) });
        }
        logd!("Push: {} accepted: {}", msg.entity, net::snippet(&body, 120));
        Ok(Delivery::Sent)
    }
}

/// Logs instead of sending.
pub struct DryRunDispatcher;

impl Dispatcher for DryRunDispatcher {
    fn dispatch(&self, msg: &NotificationMessage) -> Result<Delivery, DispatchError> {
        logf!("Push (dry run): [{}] {}", msg.title, msg.body);
        Ok(Delivery::Held(s!("dry run")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_targets_all_subscribers_in_every_locale() {
        let mut opts = PushOptions::default();
        opts.app_id = s!("app-123");
        let msg = NotificationMessage { entity: s!("X"), title: s!("T"), body: s!("B") };

        let json = serde_json::to_value(PushPayload::new(&opts, &msg)).unwrap();
        assert_eq!(json, serde_json::json!({
            "app_id": "app-123",
            "included_segments": ["Total Subscriptions"],
            "contents": { "en": "B", "pt": "B" },
            "headings": { "en": "T", "pt": "T" },
        }));
    }

    #[test]
    fn dry_run_holds() {
        let msg = NotificationMessage { entity: s!("X"), title: s!("T"), body: s!("B") };
        assert_eq!(DryRunDispatcher.dispatch(&msg).unwrap(), Delivery::Held(s!("dry run")));
    }
}
