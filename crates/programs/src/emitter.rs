//! The source ledger program: records credential issuance and publishes a cross-chain message
//! for each issued credential.

use std::collections::BTreeMap;

use credmirror_primitives::{
    buf::{Address, ContentHash, ContentIdHash},
    constants::{CONSISTENCY_FINALIZED, DEFAULT_MAX_BATCH_SIZE},
    events::SourceEvent,
    message::IssuancePayload,
    types::{ChainId, EmitterKey},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    core_bridge::{CoreBridge, CoreBridgeConfig},
    errors::{ProgramError, ProgramResult},
    ledger::{Ledger, TxContext},
};

/// Immutable parameters of the emitter program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// The program's own address, used as the message emitter.
    pub address: Address,

    /// The only identity allowed to revoke and to set the mirror target.
    pub admin: Address,

    /// Upper bound on the number of credentials per batch.
    pub max_batch_size: usize,

    /// Consistency level requested for published messages.
    pub consistency_level: u8,
}

impl EmitterConfig {
    /// Creates a config with the default batch bound and consistency level.
    pub const fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            admin,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            consistency_level: CONSISTENCY_FINALIZED,
        }
    }
}

/// A credential issued on the source ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRecord {
    /// Hash of the content identifier.
    pub content_id_hash: ContentIdHash,

    /// Hash of the credential content.
    pub content_hash: ContentHash,

    /// The identity that issued the credential.
    pub issuer: Address,

    /// Sequence of the message published for this record.
    pub sequence: u64,

    /// Whether the record was revoked.
    pub revoked: bool,
}

/// Emitter program state.
#[derive(Debug, Clone)]
pub struct Emitter {
    config: EmitterConfig,
    records: BTreeMap<ContentIdHash, IssuanceRecord>,

    /// Reverse index enforcing that a content hash backs a single identifier.
    content_index: BTreeMap<ContentHash, ContentIdHash>,

    mirror_target: Option<Address>,
    nonce: u32,
}

impl Emitter {
    /// Creates an emitter with no records.
    pub const fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
            content_index: BTreeMap::new(),
            mirror_target: None,
            nonce: 0,
        }
    }

    /// The emitter's configuration.
    pub const fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Looks up a record by content identifier.
    pub fn record(&self, identifier: &str) -> Option<&IssuanceRecord> {
        self.records.get(&ContentIdHash::from_identifier(identifier))
    }

    /// The destination-side program address, if set.
    pub const fn mirror_target(&self) -> Option<Address> {
        self.mirror_target
    }

    fn issue_one(
        &mut self,
        bridge: &mut CoreBridge,
        ctx: &mut TxContext<SourceEvent>,
        identifier: &str,
        content_hash: ContentHash,
    ) -> ProgramResult<u64> {
        if identifier.is_empty() {
            return Err(ProgramError::EmptyIdentifier);
        }

        let content_id_hash = ContentIdHash::from_identifier(identifier);
        if self.records.contains_key(&content_id_hash) {
            return Err(ProgramError::DuplicateIdentifier(content_id_hash));
        }
        if let Some(bound) = self.content_index.get(&content_hash) {
            return Err(ProgramError::DuplicateContent(*bound));
        }

        let issuer = ctx.caller();
        let payload = IssuancePayload {
            issuer,
            content_id_hash,
        };

        let nonce = self.nonce;
        self.nonce = self.nonce.wrapping_add(1);
        let sequence = bridge.publish(
            ctx,
            self.config.address,
            nonce,
            self.config.consistency_level,
            payload.to_bytes().to_vec(),
        );

        self.records.insert(
            content_id_hash,
            IssuanceRecord {
                content_id_hash,
                content_hash,
                issuer,
                sequence,
                revoked: false,
            },
        );
        self.content_index.insert(content_hash, content_id_hash);

        ctx.emit(SourceEvent::CredentialIssued {
            content_id_hash,
            content_hash,
            issuer,
            emitter: self.config.address,
            sequence,
        });

        debug!(%identifier, %sequence, "credential issued");
        Ok(sequence)
    }

    fn require_fee(bridge: &CoreBridge, ctx: &TxContext<SourceEvent>, n: usize) -> ProgramResult<()> {
        let required = bridge.message_fee().saturating_mul(n as u64);
        if ctx.value() < required {
            return Err(ProgramError::InsufficientFee {
                required,
                provided: ctx.value(),
            });
        }

        Ok(())
    }

    fn require_admin(&self, ctx: &TxContext<SourceEvent>) -> ProgramResult<()> {
        if ctx.caller() != self.config.admin {
            return Err(ProgramError::Unauthorized(ctx.caller()));
        }

        Ok(())
    }

    /// Issues a credential and returns the sequence of the published message.
    pub fn issue(
        &mut self,
        bridge: &mut CoreBridge,
        ctx: &mut TxContext<SourceEvent>,
        identifier: &str,
        content_hash: ContentHash,
    ) -> ProgramResult<u64> {
        Self::require_fee(bridge, ctx, 1)?;
        self.issue_one(bridge, ctx, identifier, content_hash)
    }

    /// Issues a batch of credentials, returning one sequence per pair in input order.
    ///
    /// Any failing pair fails the whole batch; the surrounding transaction then discards every
    /// record and sequence of the batch.
    pub fn issue_batch(
        &mut self,
        bridge: &mut CoreBridge,
        ctx: &mut TxContext<SourceEvent>,
        identifiers: &[String],
        content_hashes: &[ContentHash],
    ) -> ProgramResult<Vec<u64>> {
        if identifiers.len() != content_hashes.len() {
            return Err(ProgramError::LengthMismatch {
                identifiers: identifiers.len(),
                hashes: content_hashes.len(),
            });
        }
        if identifiers.is_empty() {
            return Err(ProgramError::EmptyBatch);
        }
        if identifiers.len() > self.config.max_batch_size {
            return Err(ProgramError::BatchTooLarge {
                size: identifiers.len(),
                max: self.config.max_batch_size,
            });
        }
        Self::require_fee(bridge, ctx, identifiers.len())?;

        identifiers
            .iter()
            .zip(content_hashes)
            .map(|(identifier, hash)| self.issue_one(bridge, ctx, identifier, *hash))
            .collect()
    }

    /// Revokes a credential on the source ledger.
    pub fn revoke(&mut self, ctx: &mut TxContext<SourceEvent>, identifier: &str) -> ProgramResult<()> {
        self.require_admin(ctx)?;

        let content_id_hash = ContentIdHash::from_identifier(identifier);
        let record = self
            .records
            .get_mut(&content_id_hash)
            .ok_or(ProgramError::NotFound(content_id_hash))?;

        if record.revoked {
            return Err(ProgramError::AlreadyRevoked(content_id_hash));
        }
        record.revoked = true;

        ctx.emit(SourceEvent::CredentialRevoked { content_id_hash });
        Ok(())
    }

    /// Sets the destination-side program address.
    pub fn set_mirror_target(
        &mut self,
        ctx: &mut TxContext<SourceEvent>,
        target: Address,
    ) -> ProgramResult<()> {
        self.require_admin(ctx)?;
        if target.is_zero() {
            return Err(ProgramError::NullTarget);
        }

        self.mirror_target = Some(target);
        ctx.emit(SourceEvent::MirrorTargetUpdated { target });
        Ok(())
    }
}

/// Full source ledger state: the core bridge plus the emitter program.
#[derive(Debug, Clone)]
pub struct SourceState {
    /// The core bridge.
    pub bridge: CoreBridge,

    /// The emitter program.
    pub emitter: Emitter,
}

impl SourceState {
    /// Creates the genesis state of a source ledger.
    pub const fn new(bridge: CoreBridgeConfig, emitter: EmitterConfig) -> Self {
        Self {
            bridge: CoreBridge::new(bridge),
            emitter: Emitter::new(emitter),
        }
    }

    /// The emitter's `(chain, address)` on a ledger with the given chain id.
    pub const fn emitter_key(&self, chain_id: ChainId) -> EmitterKey {
        EmitterKey::new(chain_id, self.emitter.config.address)
    }
}

/// A ledger hosting the source state.
pub type SourceLedger = Ledger<SourceState, SourceEvent>;

/// Transaction entry points of the source ledger.
pub trait SourceCalls {
    /// See [`Emitter::issue`].
    fn issue(
        &mut self,
        caller: Address,
        value: u64,
        identifier: &str,
        content_hash: ContentHash,
    ) -> ProgramResult<u64>;

    /// See [`Emitter::issue_batch`].
    fn issue_batch(
        &mut self,
        caller: Address,
        value: u64,
        identifiers: &[String],
        content_hashes: &[ContentHash],
    ) -> ProgramResult<Vec<u64>>;

    /// See [`Emitter::revoke`].
    fn revoke(&mut self, caller: Address, identifier: &str) -> ProgramResult<()>;

    /// See [`Emitter::set_mirror_target`].
    fn set_mirror_target(&mut self, caller: Address, target: Address) -> ProgramResult<()>;
}

impl SourceCalls for SourceLedger {
    fn issue(
        &mut self,
        caller: Address,
        value: u64,
        identifier: &str,
        content_hash: ContentHash,
    ) -> ProgramResult<u64> {
        self.execute(caller, value, |state, ctx| {
            state
                .emitter
                .issue(&mut state.bridge, ctx, identifier, content_hash)
        })
    }

    fn issue_batch(
        &mut self,
        caller: Address,
        value: u64,
        identifiers: &[String],
        content_hashes: &[ContentHash],
    ) -> ProgramResult<Vec<u64>> {
        self.execute(caller, value, |state, ctx| {
            state
                .emitter
                .issue_batch(&mut state.bridge, ctx, identifiers, content_hashes)
        })
    }

    fn revoke(&mut self, caller: Address, identifier: &str) -> ProgramResult<()> {
        self.execute(caller, 0, |state, ctx| state.emitter.revoke(ctx, identifier))
    }

    fn set_mirror_target(&mut self, caller: Address, target: Address) -> ProgramResult<()> {
        self.execute(caller, 0, |state, ctx| {
            state.emitter.set_mirror_target(ctx, target)
        })
    }
}
