//! Event sources feeding the bot loop.

use async_trait::async_trait;
use tokio::sync::mpsc;

use chisel_core::BoxedEvent;
use chisel_framework::BoxError;

/// Produces batches of incoming events.
///
/// `Ok(None)` means the source is exhausted and the bot loop should end.
/// An `Err` stops the bot loop: in-flight events finish, `shutdown` is
/// signalled and `Bot::run` returns the error.
#[async_trait]
pub trait EventSource: Send {
    async fn next_batch(&mut self) -> Result<Option<Vec<BoxedEvent>>, BoxError>;
}

/// An [`EventSource`] backed by an mpsc channel.
///
/// Each batch waits for one event, then drains whatever else is already
/// queued, up to `max_batch` events.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<BoxedEvent>,
    max_batch: usize,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<BoxedEvent>) -> Self {
        Self {
            receiver,
            max_batch: 64,
        }
    }

    pub fn max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<BoxedEvent>>, BoxError> {
        let Some(first) = self.receiver.recv().await else {
            return Ok(None);
        };

        let mut batch = vec![first];
        while batch.len() < self.max_batch {
            match self.receiver.try_recv() {
                Ok(event) => batch.push(event),
                Err(_) => break,
            }
        }
        Ok(Some(batch))
    }
}

/// Creates a sender paired with a [`ChannelSource`].
pub fn channel(buffer: usize) -> (mpsc::Sender<BoxedEvent>, ChannelSource) {
    let (tx, rx) = mpsc::channel(buffer);
    (tx, ChannelSource::new(rx))
}
