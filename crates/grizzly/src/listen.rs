//! Remote-to-local sync: rewrite a local file whenever the remote is saved.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info_span, Instrument};

use crate::config::Config;
use crate::error::{GrizzlyError, Result};
use crate::handler::{Handler, PushPayload, Subscription, SubscriptionEvent};
use crate::shutdown::ShutdownSignal;

/// A [`Subscription`] fed through an in-process channel.
///
/// Lets a host bridge any push client into the listen loop.
#[derive(Debug)]
pub struct ChannelSubscription {
    receiver: mpsc::Receiver<SubscriptionEvent>,
}

impl ChannelSubscription {
    /// Returns the sending half together with the subscription.
    pub fn new(buffer: usize) -> (mpsc::Sender<SubscriptionEvent>, Self) {
        let (sender, receiver) = mpsc::channel(buffer);
        (sender, Self { receiver })
    }
}

#[async_trait]
impl Subscription for ChannelSubscription {
    async fn next_event(&mut self) -> Option<SubscriptionEvent> {
        self.receiver.recv().await
    }
}

/// Subscribes to remote changes of `uid` and mirrors them into `filename`.
///
/// Runs until `shutdown` is triggered or the transport closes. Bad payloads
/// and failed fetches are logged and skipped. Handlers without the listen
/// capability are reported as not supported.
pub async fn listen(
    config: &Config,
    uid: &str,
    filename: &Path,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let (handler, id) = config.registry.resolve_uid(uid)?;
    let Some(listener) = handler.as_listen() else {
        config
            .notifier
            .not_supported(handler.kind(), &id, "listen");
        return Ok(());
    };

    let channel = listener.channel(&id);
    let subscription = listener
        .subscribe(&id)
        .await
        .map_err(|e| GrizzlyError::Subscription(format!("{}: {}", channel, e)))?;
    log::info!("Subscribed on channel {}", channel);

    run(config, handler.as_ref(), &id, filename, subscription, shutdown)
        .instrument(info_span!("listen", uid = %uid))
        .await;
    Ok(())
}

async fn run(
    config: &Config,
    handler: &dyn Handler,
    id: &str,
    filename: &Path,
    mut subscription: Box<dyn Subscription>,
    shutdown: &ShutdownSignal,
) {
    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                log::info!("Stopped listening for {}", id);
                break;
            }
            event = subscription.next_event() => match event {
                Some(SubscriptionEvent::Publication(data)) => {
                    handle_publication(config, handler, id, filename, &data).await;
                }
                Some(SubscriptionEvent::Reconnected) => {
                    log::info!("Reconnected, resyncing {} into {}", id, filename.display());
                    if let Err(e) = sync_to_file(config, handler, id, filename).await {
                        log::error!("Resync after reconnect failed: {}", e);
                    }
                }
                Some(SubscriptionEvent::Disconnected(reason)) => {
                    log::warn!("Disconnected: {}", reason);
                }
                None => {
                    log::info!("Subscription for {} closed", id);
                    break;
                }
            }
        }
    }
}

async fn handle_publication(
    config: &Config,
    handler: &dyn Handler,
    id: &str,
    filename: &Path,
    data: &[u8],
) {
    let payload: PushPayload = match serde_json::from_slice(data) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!(
                "Ignoring undecodable payload {}: {}",
                String::from_utf8_lossy(data),
                e
            );
            return;
        }
    };
    if !payload.is_saved() {
        log::info!("Unknown action received: {}", String::from_utf8_lossy(data));
        return;
    }
    log::debug!("{} saved by user {}", payload.uid, payload.user_id);

    if let Err(e) = sync_to_file(config, handler, id, filename).await {
        log::error!("Failed to sync {}: {}", id, e);
    }
}

/// Fetches the remote resource and overwrites `filename` with it.
pub async fn sync_to_file(
    config: &Config,
    handler: &dyn Handler,
    id: &str,
    filename: &Path,
) -> Result<()> {
    let remote = handler
        .get_remote(id)
        .await
        .map_err(|e| GrizzlyError::remote(handler.kind(), id, &e))?;
    let content = handler.get_representation(&handler.unprepare(&remote))?;

    let _guard = config.local_lock.acquire().await;
    tokio::fs::write(filename, content.as_bytes())
        .await
        .map_err(|source| GrizzlyError::WriteFile {
            path: filename.to_path_buf(),
            source,
        })?;
    log::info!("{} updated from {}.{}", filename.display(), handler.name(), id);
    Ok(())
}
