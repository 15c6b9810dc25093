//! Transactional host for a ledger program.
//!
//! A [`Ledger`] owns a program's state, a block height and an append-only event log. Calls run
//! through [`Ledger::execute`] against a staged copy of the state: a call that returns an error
//! leaves both the state and the log untouched, a call that succeeds is committed in a block of
//! its own.

use credmirror_primitives::{buf::Address, events::LoggedEvent, types::ChainId};
use tracing::trace;

use crate::errors::ProgramResult;

/// Per-call context handed to program code.
#[derive(Debug)]
pub struct TxContext<E> {
    chain_id: ChainId,
    caller: Address,
    value: u64,
    block_height: u64,
    timestamp: u32,
    events: Vec<E>,
}

impl<E> TxContext<E> {
    /// Creates a context for a call landing in block `block_height`.
    pub const fn new(
        chain_id: ChainId,
        caller: Address,
        value: u64,
        block_height: u64,
        timestamp: u32,
    ) -> Self {
        Self {
            chain_id,
            caller,
            value,
            block_height,
            timestamp,
            events: Vec::new(),
        }
    }

    /// The chain the call executes on.
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The identity making the call.
    pub const fn caller(&self) -> Address {
        self.caller
    }

    /// Value attached to the call.
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Height of the block the call will be included in.
    pub const fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Timestamp of the block the call will be included in.
    pub const fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Logs an event. Events are only published if the call succeeds.
    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    /// Consumes the context, returning the events logged so far.
    pub fn into_events(self) -> Vec<E> {
        self.events
    }
}

/// A single-program ledger.
#[derive(Debug, Clone)]
pub struct Ledger<S, E> {
    chain_id: ChainId,
    height: u64,
    state: S,
    log: Vec<LoggedEvent<E>>,
}

impl<S, E> Ledger<S, E>
where
    S: Clone,
{
    /// Creates a ledger at height 0 with the given genesis state.
    pub const fn new(chain_id: ChainId, genesis: S) -> Self {
        Self {
            chain_id,
            height: 0,
            state: genesis,
            log: Vec::new(),
        }
    }

    /// The ledger's chain id.
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Height of the latest block.
    pub const fn height(&self) -> u64 {
        self.height
    }

    /// The committed state.
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Runs `call` as a transaction from `caller` carrying `value`.
    ///
    /// On success the staged state and the logged events are committed in a new block.
    pub fn execute<T, F>(&mut self, caller: Address, value: u64, call: F) -> ProgramResult<T>
    where
        F: FnOnce(&mut S, &mut TxContext<E>) -> ProgramResult<T>,
    {
        let block_height = self.height + 1;
        let mut ctx = TxContext::new(
            self.chain_id,
            caller,
            value,
            block_height,
            current_timestamp(),
        );

        let mut staged = self.state.clone();
        let output = call(&mut staged, &mut ctx)?;

        self.state = staged;
        self.height = block_height;

        let events = ctx.into_events();
        trace!(chain = %self.chain_id, %block_height, events = events.len(), "committed block");
        self.log.extend(events.into_iter().map(|event| LoggedEvent {
            block_height,
            event,
        }));

        Ok(output)
    }

    /// Returns events logged in blocks `from..=to`.
    pub fn events(&self, from: u64, to: u64) -> Vec<LoggedEvent<E>>
    where
        E: Clone,
    {
        if from > to {
            return Vec::new();
        }

        // the log is ordered by height
        let start = self.log.partition_point(|e| e.block_height < from);
        let end = self.log.partition_point(|e| e.block_height <= to);
        self.log[start..end].to_vec()
    }
}

fn current_timestamp() -> u32 {
    u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX)
}
