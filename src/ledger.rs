use crate::*;

use ark_ff::{BigInteger, PrimeField};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// The ledger call contract consumed by the core.
///
/// Any client honoring this shape works: a JSON-RPC transport, a chain SDK,
/// or the in-memory [`MemLedger`]. `cast_vote` blocks until a receipt is
/// available or the supplied timeout elapses; the client reports a timeout
/// as [`LedgerError::Timeout`], never as a rejection.
pub trait LedgerClient {
    fn cast_vote(
        &mut self,
        request: &CastVoteRequest,
        timeout: Duration,
    ) -> Result<SubmissionReceipt, LedgerError>;

    fn get_tally(&self, candidate_id: u64) -> Result<u64, LedgerError>;
}

/// The signature triple as the ledger entry point expects it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WireSignature {
    /// DLEQ challenge, 32-byte big-endian hex.
    pub r: String,
    /// DLEQ response, 32-byte big-endian hex.
    pub s: String,
    /// Deterministic duplicate-vote tag, 64 hex chars.
    pub nullifier: String,
}

/// Wire shape of `cast_vote_with_nullifier(candidate, signature, pk)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CastVoteRequest {
    pub candidate: u64,
    pub signature: WireSignature,
    /// Affine public key coordinates `[pk_x, pk_y]`, hex.
    pub public_key: [String; 2],
}

impl CastVoteRequest {
    pub fn from_signed_vote(vote: &SignedVote) -> Self {
        let signature = &vote.signature;
        let (pk_x, pk_y) = signature.public_key.coordinates();
        CastVoteRequest {
            candidate: vote.payload.candidate_id,
            signature: WireSignature {
                r: hex::encode(signature.c.into_bigint().to_bytes_be()),
                s: hex::encode(signature.s.into_bigint().to_bytes_be()),
                nullifier: signature.nullifier.to_hex(),
            },
            public_key: [pk_x, pk_y],
        }
    }
}

/// Receipt for a submitted transaction. Produced by the ledger boundary;
/// the core consumes it, it never fabricates one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Opaque transaction handle.
    pub transaction_id: String,
    pub success: bool,
}

/// Fault injection for the stub ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Refuse every cast.
    RejectAll,
    /// Never produce a receipt.
    TimeOut,
}

/// A simple in-memory ledger that enforces nullifier uniqueness and counts
/// tallies. Stands in for the on-chain contract in tests and local runs.
#[derive(Default, Clone)]
pub struct MemLedger {
    tallies: BTreeMap<u64, u64>,
    nullifiers: BTreeSet<String>,
    sequence: u64,
    fault: Option<Fault>,
}

impl MemLedger {
    pub fn new() -> Self {
        MemLedger::default()
    }

    /// A ledger that rejects every cast vote.
    pub fn rejecting() -> Self {
        MemLedger {
            fault: Some(Fault::RejectAll),
            ..MemLedger::default()
        }
    }

    /// A ledger that never answers within the timeout.
    pub fn timing_out() -> Self {
        MemLedger {
            fault: Some(Fault::TimeOut),
            ..MemLedger::default()
        }
    }

    fn transaction_id(&self, nullifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(nullifier.as_bytes());
        hasher.update(self.sequence.to_be_bytes());
        hex::encode(hasher.finalize())
    }
}

impl LedgerClient for MemLedger {
    fn cast_vote(
        &mut self,
        request: &CastVoteRequest,
        _timeout: Duration,
    ) -> Result<SubmissionReceipt, LedgerError> {
        match self.fault {
            Some(Fault::RejectAll) => {
                return Err(LedgerError::Rejected("vote refused by ledger".to_string()))
            }
            Some(Fault::TimeOut) => return Err(LedgerError::Timeout),
            None => {}
        }

        if !self.nullifiers.insert(request.signature.nullifier.clone()) {
            return Err(LedgerError::Rejected("duplicate nullifier".to_string()));
        }

        *self.tallies.entry(request.candidate).or_insert(0) += 1;
        self.sequence += 1;
        Ok(SubmissionReceipt {
            transaction_id: self.transaction_id(&request.signature.nullifier),
            success: true,
        })
    }

    fn get_tally(&self, candidate_id: u64) -> Result<u64, LedgerError> {
        if self.fault == Some(Fault::TimeOut) {
            return Err(LedgerError::Timeout);
        }
        Ok(self.tallies.get(&candidate_id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(candidate: u64, nullifier: &str) -> CastVoteRequest {
        CastVoteRequest {
            candidate,
            signature: WireSignature {
                r: "aa".repeat(32),
                s: "bb".repeat(32),
                nullifier: nullifier.to_string(),
            },
            public_key: ["cc".repeat(32), "dd".repeat(32)],
        }
    }

    #[test]
    fn duplicate_nullifier_is_rejected() {
        let mut ledger = MemLedger::new();
        let timeout = Duration::from_secs(1);

        let receipt = ledger.cast_vote(&request(3, "n1"), timeout).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.transaction_id.len(), 64);

        match ledger.cast_vote(&request(3, "n1"), timeout) {
            Err(LedgerError::Rejected(reason)) => assert!(reason.contains("duplicate")),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(ledger.get_tally(3).unwrap(), 1);
    }

    #[test]
    fn distinct_nullifiers_both_count() {
        let mut ledger = MemLedger::new();
        let timeout = Duration::from_secs(1);
        ledger.cast_vote(&request(3, "n1"), timeout).unwrap();
        ledger.cast_vote(&request(3, "n2"), timeout).unwrap();
        assert_eq!(ledger.get_tally(3).unwrap(), 2);
        assert_eq!(ledger.get_tally(4).unwrap(), 0);
    }

    #[test]
    fn rejecting_ledger_counts_nothing() {
        let mut ledger = MemLedger::rejecting();
        let result = ledger.cast_vote(&request(1, "n1"), Duration::from_secs(1));
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
        assert_eq!(ledger.get_tally(1).unwrap(), 0);
    }

    #[test]
    fn timing_out_ledger_reports_timeout_not_rejection() {
        let mut ledger = MemLedger::timing_out();
        let result = ledger.cast_vote(&request(1, "n1"), Duration::from_millis(10));
        assert!(matches!(result, Err(LedgerError::Timeout)));
    }

    #[test]
    fn wire_request_carries_the_signature_triple() {
        let keypair = KeyPair::generate().unwrap();
        let vote = VotePayload::new(7, 1_700_000_000, &keypair.public)
            .sign(&keypair)
            .unwrap();
        let request = CastVoteRequest::from_signed_vote(&vote);

        assert_eq!(request.candidate, 7);
        assert_eq!(request.signature.nullifier, vote.nullifier().to_hex());
        assert_eq!(request.signature.r.len(), 64);
        assert_eq!(request.signature.s.len(), 64);
        let (pk_x, pk_y) = keypair.public.coordinates();
        assert_eq!(request.public_key, [pk_x, pk_y]);
    }
}
