//! The core bridge: publishes cross-chain messages on the source ledger.

use std::collections::BTreeMap;

use credmirror_primitives::{
    buf::Address,
    events::SourceEvent,
    message::MessageBody,
    types::MessageId,
};
use serde::{Deserialize, Serialize};

use crate::ledger::TxContext;

/// Parameters of the core bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreBridgeConfig {
    /// Fee charged per published message.
    pub message_fee: u64,
}

/// Core bridge state.
#[derive(Debug, Clone)]
pub struct CoreBridge {
    config: CoreBridgeConfig,

    /// Next sequence per emitter program.
    sequences: BTreeMap<Address, u64>,

    /// Every published body, for guardians to observe and sign.
    published: BTreeMap<MessageId, MessageBody>,
}

impl CoreBridge {
    /// Creates an empty core bridge.
    pub const fn new(config: CoreBridgeConfig) -> Self {
        Self {
            config,
            sequences: BTreeMap::new(),
            published: BTreeMap::new(),
        }
    }

    /// Fee charged per published message.
    pub const fn message_fee(&self) -> u64 {
        self.config.message_fee
    }

    /// The sequence the next message from `emitter` will receive.
    pub fn next_sequence(&self, emitter: &Address) -> u64 {
        self.sequences.get(emitter).copied().unwrap_or(0)
    }

    /// Publishes a message from `emitter` and returns its sequence.
    ///
    /// The caller is responsible for having checked that the transaction's value covers
    /// [`Self::message_fee`].
    pub fn publish(
        &mut self,
        ctx: &mut TxContext<SourceEvent>,
        emitter: Address,
        nonce: u32,
        consistency_level: u8,
        payload: Vec<u8>,
    ) -> u64 {
        let sequence = self.next_sequence(&emitter);
        self.sequences.insert(emitter, sequence + 1);

        let body = MessageBody {
            timestamp: ctx.timestamp(),
            nonce,
            emitter_chain: ctx.chain_id(),
            emitter_address: emitter,
            sequence,
            consistency_level,
            payload,
        };

        self.published.insert(body.id(), body.clone());
        ctx.emit(SourceEvent::MessagePublished { body });

        sequence
    }

    /// Returns a published message body.
    pub fn published(&self, id: &MessageId) -> Option<&MessageBody> {
        self.published.get(id)
    }
}

#[cfg(test)]
mod tests {
    use credmirror_primitives::types::{ChainId, EmitterKey};

    use super::*;

    fn ctx() -> TxContext<SourceEvent> {
        TxContext::new(ChainId(1), Address::ZERO, 0, 1, 1_700_000_000)
    }

    #[test]
    fn sequences_are_per_emitter_from_zero() {
        let mut bridge = CoreBridge::new(CoreBridgeConfig { message_fee: 3 });
        let a = Address::new([1; 32]);
        let b = Address::new([2; 32]);
        let mut ctx = ctx();

        assert_eq!(bridge.publish(&mut ctx, a, 0, 1, vec![]), 0);
        assert_eq!(bridge.publish(&mut ctx, a, 0, 1, vec![]), 1);
        assert_eq!(bridge.publish(&mut ctx, b, 0, 1, vec![]), 0);

        assert_eq!(bridge.next_sequence(&a), 2);
        assert_eq!(ctx.into_events().len(), 3);
    }

    #[test]
    fn published_bodies_are_retrievable() {
        let mut bridge = CoreBridge::new(CoreBridgeConfig { message_fee: 0 });
        let emitter = Address::new([1; 32]);
        let mut ctx = ctx();

        bridge.publish(&mut ctx, emitter, 5, 1, vec![0xab]);
        bridge.publish(&mut ctx, Address::new([2; 32]), 0, 1, vec![]);

        let key = EmitterKey::new(ChainId(1), emitter);
        let body = bridge.published(&key.message(0)).unwrap();
        assert_eq!(body.nonce, 5);
        assert_eq!(body.payload, vec![0xab]);
        assert_eq!(body.emitter_chain, ChainId(1));
        assert!(bridge.published(&key.message(1)).is_none());
    }
}
