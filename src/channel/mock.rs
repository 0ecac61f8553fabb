//! In-memory realtime channel for tests.
//!
//! A [`pair`] gives the test a [`MockChannel`] probe: outbound envelopes
//! the actor sends arrive on `outbound`, and the test feeds synthetic
//! backend messages through `inbound`. Dropping the `inbound` sender
//! closes the stream, which the dispatcher observes as a disconnect.
//!
//! [`MockConnector`] queues prepared channel halves and hands one out per
//! `connect` call, so `InitConnection` can run unmodified against fakes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChannelConnector, ChannelSink, ChannelStream};
use crate::error::SimError;
use crate::protocol::Envelope;

/// The test's two ends of a mocked channel.
pub struct MockChannel {
    /// Envelopes the actor wrote to the channel, in send order.
    pub outbound: mpsc::UnboundedReceiver<Envelope>,
    /// Feed raw message text to the actor's dispatcher.
    pub inbound: mpsc::UnboundedSender<String>,
}

impl MockChannel {
    /// Feeds one inbound envelope, panicking if the actor is gone.
    pub fn feed(&self, envelope: &Envelope) {
        self.inbound
            .send(envelope.to_text().expect("encode envelope"))
            .expect("actor stream closed");
    }
}

/// Creates a mocked channel: the probe for the test plus the sink/stream
/// halves for the actor.
pub fn pair() -> (MockChannel, Arc<dyn ChannelSink>, Box<dyn ChannelStream>) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    (
        MockChannel {
            outbound: out_rx,
            inbound: in_tx,
        },
        Arc::new(MockSink { tx: out_tx }),
        Box::new(MockStream { rx: in_rx }),
    )
}

/// Connector that hands out pre-built channel halves in push order.
#[derive(Default)]
pub struct MockConnector {
    pending: Mutex<VecDeque<(Arc<dyn ChannelSink>, Box<dyn ChannelStream>)>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a channel for the next `connect` call and returns the probe.
    pub fn push_channel(&self) -> MockChannel {
        let (probe, sink, stream) = pair();
        self.pending
            .lock()
            .expect("connector lock poisoned")
            .push_back((sink, stream));
        probe
    }
}

#[async_trait]
impl ChannelConnector for MockConnector {
    async fn connect(
        &self,
        _path: &str,
        _token: &str,
    ) -> Result<(Arc<dyn ChannelSink>, Box<dyn ChannelStream>), SimError> {
        self.pending
            .lock()
            .expect("connector lock poisoned")
            .pop_front()
            .ok_or_else(|| SimError::Channel("no mock channel queued".to_string()))
    }
}

struct MockSink {
    tx: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl ChannelSink for MockSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), SimError> {
        self.tx
            .send(envelope.clone())
            .map_err(|_| SimError::Channel("mock channel closed".to_string()))
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl ChannelStream for MockStream {
    async fn next(&mut self) -> Option<Result<String, SimError>> {
        self.rx.recv().await.map(Ok)
    }
}
