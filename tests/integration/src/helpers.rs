//! Test helpers
//!
//! Polling, a collecting incident sink, and a client builder pointed at a
//! [`FakeDiscord`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use bot_client::{Client, ClientBuilder, Incident, IncidentKind, IncidentSink};
use bot_common::{BotToken, RestConfig};
use parking_lot::Mutex;

use crate::fake_discord::FakeDiscord;

/// Default wait for something to happen over a real socket
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `condition` every 10ms until it holds or `TIMEOUT` passes
pub async fn wait_until<F>(what: &str, mut condition: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            bail!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Incident sink that keeps everything it is given
#[derive(Default)]
pub struct CollectingSink(Mutex<Vec<Incident>>);

impl CollectingSink {
    pub fn incidents(&self) -> Vec<Incident> {
        self.0.lock().clone()
    }

    pub fn of_kind(&self, kind: IncidentKind) -> Vec<Incident> {
        self.0.lock().iter().filter(|i| i.kind == kind).cloned().collect()
    }
}

impl IncidentSink for CollectingSink {
    fn report(&self, incident: Incident) {
        self.0.lock().push(incident);
    }
}

/// Client builder wired to the fake's gateway and REST routes
pub fn client_for(fake: &FakeDiscord, incidents: &Arc<CollectingSink>) -> ClientBuilder {
    client_with_token(fake, fake.token(), incidents)
}

pub fn client_with_token(
    fake: &FakeDiscord,
    token: &str,
    incidents: &Arc<CollectingSink>,
) -> ClientBuilder {
    Client::builder(BotToken::bot(token))
        .gateway_url(fake.gateway_url())
        .rest_config(RestConfig {
            base_url: fake.rest_base(),
            timeout_secs: 5,
            ..RestConfig::default()
        })
        .incident_sink(incidents.clone())
}
