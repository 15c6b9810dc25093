//! The destination ledger program: turns verified, correctly sourced, unreplayed attestations
//! into mirrored records.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use credmirror_primitives::{
    buf::{Address, AttestationDigest, ContentIdHash},
    events::DestinationEvent,
    message::IssuancePayload,
    types::ChainId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    errors::{ProgramError, ProgramResult},
    guardian::AttestationVerifier,
    ledger::{Ledger, TxContext},
};

/// Immutable parameters of the verifier program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// The only source chain messages are accepted from.
    pub expected_source_chain: ChainId,

    /// The only emitter messages are accepted from.
    pub trusted_emitter: Address,

    /// The only identity allowed to revoke mirrored records.
    pub admin: Address,
}

/// A credential mirrored from the source ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredRecord {
    /// Hash of the content identifier.
    pub content_id_hash: ContentIdHash,

    /// The issuer recorded on the source ledger.
    pub issuer: Address,

    /// Whether the record was revoked on this ledger.
    pub revoked: bool,
}

/// Verifier program state.
#[derive(Debug, Clone)]
pub struct Verifier {
    config: VerifierConfig,
    attestation_verifier: Arc<dyn AttestationVerifier>,

    /// Digests of every consumed attestation. Never pruned.
    processed: BTreeSet<AttestationDigest>,

    records: BTreeMap<ContentIdHash, MirroredRecord>,
}

impl Verifier {
    /// Creates a verifier with no records, trusting `attestation_verifier`.
    pub const fn new(
        config: VerifierConfig,
        attestation_verifier: Arc<dyn AttestationVerifier>,
    ) -> Self {
        Self {
            config,
            attestation_verifier,
            processed: BTreeSet::new(),
            records: BTreeMap::new(),
        }
    }

    /// The verifier's configuration.
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Looks up a mirrored record.
    pub fn record(&self, content_id_hash: &ContentIdHash) -> Option<&MirroredRecord> {
        self.records.get(content_id_hash)
    }

    /// Whether an attestation with this digest was consumed.
    pub fn is_processed(&self, digest: &AttestationDigest) -> bool {
        self.processed.contains(digest)
    }

    /// Consumes an attestation and creates the mirrored record it describes.
    ///
    /// Checks run in a fixed order: signatures, source chain, emitter, replay, payload. The
    /// digest is marked processed before the record is created; both land in the same
    /// transaction.
    pub fn submit(
        &mut self,
        ctx: &mut TxContext<DestinationEvent>,
        attestation: &[u8],
    ) -> ProgramResult<MirroredRecord> {
        let attestation = self
            .attestation_verifier
            .verify(attestation)
            .map_err(|err| ProgramError::InvalidAttestation(err.to_string()))?;
        let body = &attestation.body;

        if body.emitter_chain != self.config.expected_source_chain {
            warn!(chain = %body.emitter_chain, "attestation from unexpected chain");
            return Err(ProgramError::WrongSourceChain {
                expected: self.config.expected_source_chain,
                actual: body.emitter_chain,
            });
        }

        if body.emitter_address != self.config.trusted_emitter {
            warn!(emitter = %body.emitter_address, "attestation from untrusted emitter");
            return Err(ProgramError::UntrustedEmitter(body.emitter_address));
        }

        let digest = attestation.digest();
        if !self.processed.insert(digest) {
            return Err(ProgramError::AlreadyProcessed(digest));
        }

        let payload = IssuancePayload::from_bytes(&body.payload)
            .map_err(|err| ProgramError::InvalidPayload(err.to_string()))?;

        if self.records.contains_key(&payload.content_id_hash) {
            return Err(ProgramError::AlreadyMirrored(payload.content_id_hash));
        }

        let record = MirroredRecord {
            content_id_hash: payload.content_id_hash,
            issuer: payload.issuer,
            revoked: false,
        };
        self.records.insert(record.content_id_hash, record);

        ctx.emit(DestinationEvent::CredentialMirrored {
            content_id_hash: record.content_id_hash,
            issuer: record.issuer,
            sequence: body.sequence,
        });

        debug!(sequence = %body.sequence, %digest, "credential mirrored");
        Ok(record)
    }

    /// Revokes a mirrored record. Independent of source-side revocation.
    pub fn revoke(
        &mut self,
        ctx: &mut TxContext<DestinationEvent>,
        identifier: &str,
    ) -> ProgramResult<()> {
        if ctx.caller() != self.config.admin {
            return Err(ProgramError::Unauthorized(ctx.caller()));
        }

        let content_id_hash = ContentIdHash::from_identifier(identifier);
        let record = self
            .records
            .get_mut(&content_id_hash)
            .ok_or(ProgramError::NotFound(content_id_hash))?;

        if record.revoked {
            return Err(ProgramError::AlreadyRevoked(content_id_hash));
        }
        record.revoked = true;

        ctx.emit(DestinationEvent::MirrorRevoked { content_id_hash });
        Ok(())
    }
}

/// A ledger hosting the verifier.
pub type DestinationLedger = Ledger<Verifier, DestinationEvent>;

/// Transaction entry points of the destination ledger.
pub trait DestinationCalls {
    /// See [`Verifier::submit`].
    fn submit(&mut self, caller: Address, attestation: &[u8]) -> ProgramResult<MirroredRecord>;

    /// See [`Verifier::revoke`].
    fn revoke(&mut self, caller: Address, identifier: &str) -> ProgramResult<()>;
}

impl DestinationCalls for DestinationLedger {
    fn submit(&mut self, caller: Address, attestation: &[u8]) -> ProgramResult<MirroredRecord> {
        self.execute(caller, 0, |verifier, ctx| verifier.submit(ctx, attestation))
    }

    fn revoke(&mut self, caller: Address, identifier: &str) -> ProgramResult<()> {
        self.execute(caller, 0, |verifier, ctx| verifier.revoke(ctx, identifier))
    }
}

#[cfg(test)]
mod tests {
    use credmirror_primitives::{buf::ContentHash, message::MessageBody};
    use proptest::prelude::*;

    use super::*;
    use crate::{
        emitter::SourceCalls,
        testing::{
            content_hash, destination_ledger, guardian_signer, source_ledger, ADMIN, FEE, ISSUER,
            RELAYER, SOURCE_CHAIN,
        },
    };

    /// Issues `identifier` on a fresh source ledger and returns the published body.
    fn issued_body(identifier: &str, hash: ContentHash) -> MessageBody {
        let mut source = source_ledger();
        let seq = source.issue(ISSUER, FEE, identifier, hash).unwrap();
        let id = source.state().emitter_key(SOURCE_CHAIN).message(seq);
        source.state().bridge.published(&id).unwrap().clone()
    }

    #[test]
    fn valid_attestation_creates_record_and_replay_fails() {
        let signer = guardian_signer(3);
        let mut dest = destination_ledger(&signer);
        let body = issued_body("QmAAA", content_hash(1));
        let bytes = signer.sign(&body).to_bytes();

        let record = dest.submit(RELAYER, &bytes).unwrap();
        let expected = MirroredRecord {
            content_id_hash: ContentIdHash::from_identifier("QmAAA"),
            issuer: ISSUER,
            revoked: false,
        };
        assert_eq!(record, expected);

        assert_eq!(
            dest.submit(RELAYER, &bytes),
            Err(ProgramError::AlreadyProcessed(body.digest()))
        );
        assert_eq!(
            dest.state().record(&expected.content_id_hash),
            Some(&expected)
        );
        assert_eq!(dest.height(), 1);
    }

    #[test]
    fn resigned_message_is_still_a_replay() {
        let signer = guardian_signer(4);
        let mut dest = destination_ledger(&signer);
        let body = issued_body("QmAAA", content_hash(1));

        dest.submit(RELAYER, &signer.sign_with(&body, &[0, 1, 2]).to_bytes())
            .unwrap();
        assert_eq!(
            dest.submit(RELAYER, &signer.sign_with(&body, &[1, 2, 3]).to_bytes()),
            Err(ProgramError::AlreadyProcessed(body.digest()))
        );
    }

    #[test]
    fn wrong_source_chain_rejected_despite_valid_signatures() {
        let signer = guardian_signer(1);
        let mut dest = destination_ledger(&signer);
        let mut body = issued_body("QmAAA", content_hash(1));
        body.emitter_chain = ChainId(SOURCE_CHAIN.0 + 1);

        assert_eq!(
            dest.submit(RELAYER, &signer.sign(&body).to_bytes()),
            Err(ProgramError::WrongSourceChain {
                expected: SOURCE_CHAIN,
                actual: body.emitter_chain,
            })
        );
        assert!(!dest.state().is_processed(&body.digest()));
    }

    #[test]
    fn untrusted_emitter_rejected() {
        let signer = guardian_signer(1);
        let mut dest = destination_ledger(&signer);
        let mut body = issued_body("QmAAA", content_hash(1));
        body.emitter_address = Address::new([0xde; 32]);

        assert_eq!(
            dest.submit(RELAYER, &signer.sign(&body).to_bytes()),
            Err(ProgramError::UntrustedEmitter(body.emitter_address))
        );
    }

    #[test]
    fn unsigned_or_garbage_attestations_rejected() {
        let signer = guardian_signer(3);
        let mut dest = destination_ledger(&signer);
        let body = issued_body("QmAAA", content_hash(1));

        assert!(matches!(
            dest.submit(RELAYER, &signer.sign_with(&body, &[0]).to_bytes()),
            Err(ProgramError::InvalidAttestation(_))
        ));
        assert!(matches!(
            dest.submit(RELAYER, b"not an attestation"),
            Err(ProgramError::InvalidAttestation(_))
        ));
        assert_eq!(dest.height(), 0);
    }

    #[test]
    fn malformed_payload_rejected_and_not_consumed() {
        let signer = guardian_signer(1);
        let mut dest = destination_ledger(&signer);
        let mut body = issued_body("QmAAA", content_hash(1));
        body.payload.truncate(40);

        assert!(matches!(
            dest.submit(RELAYER, &signer.sign(&body).to_bytes()),
            Err(ProgramError::InvalidPayload(_))
        ));
        assert!(!dest.state().is_processed(&body.digest()));
    }

    #[test]
    fn second_message_for_same_identifier_is_already_mirrored() {
        let signer = guardian_signer(1);
        let mut dest = destination_ledger(&signer);
        let first = issued_body("QmAAA", content_hash(1));
        let mut second = first.clone();
        second.sequence += 1;

        dest.submit(RELAYER, &signer.sign(&first).to_bytes()).unwrap();
        assert_eq!(
            dest.submit(RELAYER, &signer.sign(&second).to_bytes()),
            Err(ProgramError::AlreadyMirrored(ContentIdHash::from_identifier(
                "QmAAA"
            )))
        );
        // the failed transaction did not consume the second digest
        assert!(!dest.state().is_processed(&second.digest()));
    }

    #[test]
    fn destination_revocation_is_independent() {
        let signer = guardian_signer(1);
        let mut dest = destination_ledger(&signer);
        dest.submit(
            RELAYER,
            &signer.sign(&issued_body("QmAAA", content_hash(1))).to_bytes(),
        )
        .unwrap();

        assert_eq!(
            dest.revoke(ISSUER, "QmAAA"),
            Err(ProgramError::Unauthorized(ISSUER))
        );
        assert!(matches!(
            dest.revoke(ADMIN, "QmZZZ"),
            Err(ProgramError::NotFound(_))
        ));

        dest.revoke(ADMIN, "QmAAA").unwrap();
        assert!(matches!(
            dest.revoke(ADMIN, "QmAAA"),
            Err(ProgramError::AlreadyRevoked(_))
        ));

        let hash = ContentIdHash::from_identifier("QmAAA");
        assert!(dest.state().record(&hash).unwrap().revoked);
        assert_eq!(
            dest.events(0, u64::MAX).last().unwrap().event,
            DestinationEvent::MirrorRevoked {
                content_id_hash: hash
            }
        );
    }

    proptest! {
        #[test]
        fn any_foreign_chain_is_rejected(chain in any::<u16>().prop_filter("foreign", |c| *c != SOURCE_CHAIN.0)) {
            let signer = guardian_signer(1);
            let mut dest = destination_ledger(&signer);
            let mut body = issued_body("QmAAA", content_hash(1));
            body.emitter_chain = ChainId(chain);

            let result = dest.submit(RELAYER, &signer.sign(&body).to_bytes());
            prop_assert!(
                matches!(result, Err(ProgramError::WrongSourceChain { .. })),
                "unexpected result for chain {}: {:?}", chain, result
            );
            prop_assert!(dest.state().record(&ContentIdHash::from_identifier("QmAAA")).is_none());
        }
    }
}
