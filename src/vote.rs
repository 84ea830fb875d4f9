use crate::*;

use sha2::{Digest, Sha256};

/// A vote, bound to the voter's public key.
///
/// Field order is the canonical (alphabetical) encoding order; do not
/// reorder. Two processes constructing the same vote must produce
/// byte-identical encodings or nullifier determinism breaks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VotePayload {
    pub candidate_id: u64,
    /// Compressed voter public key, hex.
    pub public_key: String,
    /// Unix seconds.
    pub timestamp: u64,
}

/// A vote plus its PLUME proof. Only constructible through
/// [`VotePayload::sign`], so anything of this type is in the `Signed`
/// state and eligible for submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedVote {
    pub payload: VotePayload,
    pub signature: PlumeSignature,
}

impl VotePayload {
    pub fn new(candidate_id: u64, timestamp: u64, public_key: &PublicKey) -> Self {
        VotePayload {
            candidate_id,
            public_key: public_key.to_hex(),
            timestamp,
        }
    }

    /// Canonical byte encoding: compact JSON with fixed field order.
    pub fn canonical_encoding(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    /// SHA-256 of the canonical encoding, big-endian.
    pub fn message_hash(&self) -> Result<[u8; 32], Error> {
        let encoding = self.canonical_encoding()?;
        let mut hasher = Sha256::new();
        hasher.update(&encoding);
        Ok(hasher.finalize().into())
    }

    /// Produce a [`SignedVote`], or no vote at all.
    ///
    /// The payload must be bound to the signing key's public point; signing
    /// a payload built for a different voter is refused.
    pub fn sign(&self, keypair: &KeyPair) -> Result<SignedVote, Error> {
        if self.public_key != keypair.public.to_hex() {
            return Err(Error::Signing(
                "payload is bound to a different public key".to_string(),
            ));
        }
        let message_hash = self.message_hash()?;
        let signature = PlumeSignature::sign(message_hash, keypair)?;
        Ok(SignedVote {
            payload: self.clone(),
            signature,
        })
    }
}

impl SignedVote {
    pub fn nullifier(&self) -> &Nullifier {
        &self.signature.nullifier
    }

    /// Check the vote against public data only: payload/signature key
    /// binding, message hash recomputation, and the PLUME proof.
    pub fn verify(&self) -> Result<(), Error> {
        if self.payload.public_key != self.signature.public_key.to_hex() {
            return Err(Error::MismatchedPublicKeys);
        }
        if self.payload.message_hash()? != self.signature.message_hash {
            return Err(Error::InvalidSignature);
        }
        self.signature.verify()
    }
}
