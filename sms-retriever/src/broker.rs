//! Boundary to the operating system's SMS retriever service.

use async_trait::async_trait;

use crate::error::BrokerStartError;

/// Acknowledgement that the broker is now watching for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ack;

/// The platform SMS retriever.
///
/// `start_retrieval` resolves once the broker has accepted the request, not
/// when a message arrives. The outcome of the retrieval is delivered later as
/// a [`RetrieverIntent`](crate::RetrieverIntent) broadcast, through the
/// [`BroadcastRouter`](crate::BroadcastRouter).
#[async_trait]
pub trait SmsBroker: Send + Sync + 'static {
    /// Ask the broker to watch incoming SMS for this application
    async fn start_retrieval(&self) -> Result<Ack, BrokerStartError>;
}

/// Broker for platforms without an SMS retriever.
///
/// Every start fails with [`BrokerStartError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBroker;

#[async_trait]
impl SmsBroker for UnsupportedBroker {
    async fn start_retrieval(&self) -> Result<Ack, BrokerStartError> {
        Err(BrokerStartError::Unsupported)
    }
}
