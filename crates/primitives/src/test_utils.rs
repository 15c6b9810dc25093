//! Proptest strategies for the primitives.
//!
//! These live here rather than in a shared test crate to keep the primitives crate independent.

use proptest::prelude::*;

use crate::{
    buf::Address,
    message::MessageBody,
    types::ChainId,
};

pub(crate) fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::new)
}

pub(crate) fn arb_message_body() -> impl Strategy<Value = MessageBody> {
    (
        any::<u32>(),
        any::<u32>(),
        any::<u16>(),
        arb_address(),
        any::<u64>(),
        any::<u8>(),
        proptest::collection::vec(any::<u8>(), 0..128),
    )
        .prop_map(
            |(timestamp, nonce, chain, emitter_address, sequence, consistency_level, payload)| {
                MessageBody {
                    timestamp,
                    nonce,
                    emitter_chain: ChainId(chain),
                    emitter_address,
                    sequence,
                    consistency_level,
                    payload,
                }
            },
        )
}
