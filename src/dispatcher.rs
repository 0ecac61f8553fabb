//! # Command Dispatcher
//!
//! One dedicated read loop per actor drains its realtime channel and
//! processes messages strictly in arrival order: no reordering, no
//! concurrent handling of two messages for the same actor. A handler that
//! sleeps (the driver replaying a route, say) simply holds up the queue,
//! exactly how a real device processes its feed.
//!
//! Failure policy, per message:
//! - malformed envelope → logged, dropped, loop continues;
//! - unknown command kind → silently ignored;
//! - channel read failure or closure → the loop ends and is not retried.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::channel::ChannelStream;
use crate::protocol::Envelope;

/// Reacts to one inbound command envelope. Implemented by both actor
/// types; routing on the command kind happens inside the handler so each
/// actor consumes only the kinds it understands.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn on_command(self: Arc<Self>, envelope: Envelope);
}

/// Runs the read loop until the channel closes or fails.
pub async fn run(
    mut stream: Box<dyn ChannelStream>,
    handler: Arc<dyn CommandHandler>,
    actor_id: String,
) {
    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(text) => text,
            Err(e) => {
                warn!(actor_id, error = %e, "channel read failed, stopping dispatcher");
                break;
            }
        };
        debug!(actor_id, %text, "received");

        match Envelope::parse(&text) {
            Ok(Some(envelope)) => handler.clone().on_command(envelope).await,
            Ok(None) => {}
            Err(e) => warn!(actor_id, error = %e, "dropping malformed message"),
        }
    }
    debug!(actor_id, "dispatcher stopped");
}
