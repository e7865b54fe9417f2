use tokio::sync::broadcast;
use crate::message::QosEvent;

/// A small wrapper around a Tokio broadcast channel,
/// used to fan out decoded sample events to any number of subscribers.
#[derive(Clone)]
pub struct Context {
    pub tx: broadcast::Sender<QosEvent>,
}

impl Context {
    /// Create a new Context with a channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }
}
