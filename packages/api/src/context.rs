//! Per-packet context and the transport collaborator seam.

use async_trait::async_trait;
use interbus_packet::{LeaderState, Outcome, Packet};

use crate::Error;

/// Transport collaborator: accepts outbound packets for delivery.
///
/// The kernel never inspects transport details; it only hands packets over.
/// `send` resolving means the packet has been accepted for delivery, which
/// is what the router's completion future waits on.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Participant>`.
#[async_trait]
pub trait Participant: Send + Sync {
    /// Accept one outbound packet for delivery.
    async fn send(&mut self, packet: Packet) -> Result<(), Error>;
}

#[async_trait]
impl<T: Participant + ?Sized> Participant for Box<T> {
    async fn send(&mut self, packet: Packet) -> Result<(), Error> {
        self.as_mut().send(packet).await
    }
}

/// A participant that buffers everything it is asked to send.
///
/// Useful for tests and for in-process delivery loops that drain the
/// buffer themselves.
#[derive(Debug, Default)]
pub struct BufferParticipant {
    sent: Vec<Packet>,
}

impl BufferParticipant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packets accepted so far, in send order.
    pub fn sent(&self) -> &[Packet] {
        &self.sent
    }

    /// Take all buffered packets.
    pub fn drain(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.sent)
    }
}

#[async_trait]
impl Participant for BufferParticipant {
    async fn send(&mut self, packet: Packet) -> Result<(), Error> {
        self.sent.push(packet);
        Ok(())
    }
}

/// Wraps one inbound packet with the host instance's role and the ordered
/// list of direct replies produced while routing it.
///
/// Direct replies accumulate here; `changed` notifications go through the
/// `Participant` instead. The owner transmits `responses` after routing
/// completes.
#[derive(Debug)]
pub struct PacketContext {
    packet: Packet,
    leader_state: LeaderState,
    responses: Vec<Packet>,
}

impl PacketContext {
    pub fn new(packet: Packet, leader_state: LeaderState) -> Self {
        Self {
            packet,
            leader_state,
            responses: Vec::new(),
        }
    }

    /// The inbound packet being routed.
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Role of the hosting instance for this packet.
    pub fn leader_state(&self) -> LeaderState {
        self.leader_state
    }

    /// Replies queued so far, in order.
    pub fn responses(&self) -> &[Packet] {
        &self.responses
    }

    /// Take the queued replies for transmission.
    pub fn take_responses(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.responses)
    }

    /// Build a reply addressed back to the requester, echoing the resource
    /// and correlating via `replyTo = msgId`.
    pub fn make_reply(&self, outcome: Outcome) -> Packet {
        Packet {
            response: Some(outcome),
            dst: self.packet.src.clone(),
            resource: self.packet.resource.clone(),
            reply_to: self.packet.msg_id.clone(),
            ..Default::default()
        }
    }

    /// Queue a reply for transmission.
    pub fn reply(&mut self, packet: Packet) {
        self.responses.push(packet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interbus_packet::Action;

    #[test]
    fn make_reply_correlates_with_request() {
        let ctx = PacketContext::new(
            Packet::request(Action::Get)
                .with_resource("/node")
                .with_msg_id("1234")
                .with_src("srcParticipant"),
            LeaderState::Leader,
        );
        let reply = ctx.make_reply(Outcome::Ok);
        assert_eq!(reply.response, Some(Outcome::Ok));
        assert_eq!(reply.dst.as_deref(), Some("srcParticipant"));
        assert_eq!(reply.resource.as_deref(), Some("/node"));
        assert_eq!(reply.reply_to.as_deref(), Some("1234"));
        assert!(reply.action.is_none());
    }

    #[test]
    fn replies_accumulate_in_order() {
        let mut ctx = PacketContext::new(Packet::request(Action::Get), LeaderState::Follower);
        ctx.reply(ctx.make_reply(Outcome::NoMatch));
        ctx.reply(ctx.make_reply(Outcome::Ok));
        assert_eq!(ctx.responses().len(), 2);
        assert_eq!(ctx.responses()[0].response, Some(Outcome::NoMatch));

        let taken = ctx.take_responses();
        assert_eq!(taken.len(), 2);
        assert!(ctx.responses().is_empty());
    }

    #[tokio::test]
    async fn buffer_participant_records_sends() {
        let mut participant = BufferParticipant::new();
        participant
            .send(Packet::request(Action::Get).with_resource("/a"))
            .await
            .unwrap();
        participant
            .send(Packet::request(Action::Get).with_resource("/b"))
            .await
            .unwrap();
        assert_eq!(participant.sent().len(), 2);
        assert_eq!(participant.drain().len(), 2);
        assert!(participant.sent().is_empty());
    }
}
