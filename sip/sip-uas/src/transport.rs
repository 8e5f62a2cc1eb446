use sip_types::msg::{Request, Response};
use std::io;
use tokio::sync::mpsc;

/// A request as received by the transport
pub type IncomingRequest = Request;

/// Abstraction over the transport the mock sends its responses through
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send_response(&self, response: Response) -> io::Result<()>;
}

/// Transport handing every response to a channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<Response>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Response>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (Self { sender }, receiver)
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn send_response(&self, response: Response) -> io::Result<()> {
        self.sender
            .send(response)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response receiver dropped"))
    }
}
