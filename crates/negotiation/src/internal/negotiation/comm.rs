use crate::internal::messages::negotiator::ToNegotiatorMessage;

/// Outgoing side of the connection to the negotiator.
///
/// The session only queues messages; whoever drives the session is responsible for
/// writing all of them before the next message is read.
pub trait NegotiatorComm {
    fn send_message(&mut self, message: ToNegotiatorMessage);
}

/// Collects messages produced while dispatching one incoming message.
#[derive(Default, Debug)]
pub struct QueueComm {
    queue: Vec<ToNegotiatorMessage>,
}

impl QueueComm {
    pub fn take_messages(&mut self) -> Vec<ToNegotiatorMessage> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl NegotiatorComm for QueueComm {
    #[inline]
    fn send_message(&mut self, message: ToNegotiatorMessage) {
        self.queue.push(message);
    }
}
