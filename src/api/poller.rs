use crate::api::{client::Client, parser};
use crate::events::AppEvent;
use tokio::sync::mpsc;
use tokio::time;

/// Background task keeping the build list fresh.
pub struct Poller {
    client: Client,
    limit: usize,
    interval: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Poller {
    pub fn new(
        client: Client,
        limit: usize,
        interval: u64,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            client,
            limit,
            interval,
            tx,
        }
    }

    pub async fn run(self) {
        // Initial fetch
        self.poll_once().await;

        loop {
            time::sleep(time::Duration::from_secs(self.interval)).await;
            self.poll_once().await;
        }
    }

    async fn poll_once(&self) {
        match self.client.fetch_builds().await {
            Ok(json) => match parser::parse_builds(&json) {
                Ok(mut builds) => {
                    builds.truncate(self.limit);
                    let _ = self.tx.send(AppEvent::BuildsResult(builds));
                }
                Err(e) => {
                    let _ = self.tx.send(AppEvent::Error(format!("Parse error: {e}")));
                }
            },
            Err(e) => {
                let _ = self.tx.send(AppEvent::Error(format!("{e}")));
            }
        }
    }
}

/// One-shot fetch of a single build with its inputs, for the detail view.
pub async fn fetch_build_detail(client: &Client, id: i32, tx: &mpsc::UnboundedSender<AppEvent>) {
    match client.fetch_build(id).await {
        Ok(json) => match parser::parse_build(&json) {
            Ok((build, inputs)) => {
                let _ = tx.send(AppEvent::BuildResult { build, inputs });
            }
            Err(e) => {
                let _ = tx.send(AppEvent::Error(format!("Build parse error: {e}")));
            }
        },
        Err(e) => {
            let _ = tx.send(AppEvent::Error(format!("{e}")));
        }
    }
}
