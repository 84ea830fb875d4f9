//! PLUME-style signatures on secp256k1.
//!
//! A signature proves knowledge of the private scalar and yields a
//! deterministic per-message nullifier: `N = sk * H` where
//! `H = hash_to_curve(pk || message_hash)`. The published nullifier is the
//! SHA-256 digest of the compressed nullifier point, and a Chaum-Pedersen
//! (DLEQ) proof ties the nullifier point to the public key, so the ledger
//! can check `log_G(pk) = log_H(N)` without learning the scalar.
//!
//! Repeated signing of the same message with the same key reproduces the
//! nullifier bitwise; without the public key, nullifiers for different
//! messages are unlinkable.

use crate::*;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_secp256k1::{Affine, Fq, Fr};
use ark_serialize::CanonicalSerialize;
use sha2::{Digest, Sha256, Sha512};
use std::ops::Mul;

const H2C_DOMAIN: &[u8] = b"plumevote/hash-to-curve/v1";
const NONCE_DOMAIN: &[u8] = b"plumevote/dleq-nonce/v1";
const CHALLENGE_DOMAIN: &[u8] = b"plumevote/dleq-challenge/v1";
const NULLIFIER_DOMAIN: &[u8] = b"plumevote/nullifier/v1";

/// A deterministic (voter, message) tag: SHA-256 of the compressed
/// nullifier point. The ledger rejects duplicates by this value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullifier(pub(crate) [u8; 32]);

impl Nullifier {
    pub fn from_point(point: &Affine) -> Nullifier {
        let mut hasher = Sha256::new();
        hasher.update(NULLIFIER_DOMAIN);
        hasher.update(compress(point));
        Nullifier(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl serde::Serialize for Nullifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Nullifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("nullifier must be 32 bytes"));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Nullifier(out))
    }
}

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Nullifier({})", self.to_hex())
    }
}

/// A PLUME-style signature over a 32-byte message hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlumeSignature {
    #[serde(with = "Bytes32Hex")]
    pub message_hash: [u8; 32],

    pub nullifier: Nullifier,

    /// The nullifier point itself, needed to verify the DLEQ proof.
    #[serde(with = "PointHex")]
    pub nullifier_point: Affine,

    /// DLEQ challenge.
    #[serde(with = "ScalarHex")]
    pub c: Fr,

    /// DLEQ response.
    #[serde(with = "ScalarHex")]
    pub s: Fr,

    #[serde(with = "PublicKeyHex")]
    pub public_key: PublicKey,
}

impl PlumeSignature {
    /// Sign a message hash.
    ///
    /// The nullifier is a pure function of (message hash, secret scalar);
    /// the DLEQ nonce is derived deterministically from the same inputs, so
    /// the whole signature is reproducible. No partial signature is ever
    /// returned.
    pub fn sign(message_hash: [u8; 32], keypair: &KeyPair) -> Result<PlumeSignature, Error> {
        let sk = keypair.secret.0;
        let pk = keypair.public;

        let h = hash_to_curve(&pk, &message_hash);
        let nullifier_point = h.mul(sk).into_affine();
        let nullifier = Nullifier::from_point(&nullifier_point);

        // RFC6979-style deterministic nonce; a repeated sign must not leak
        // the scalar through nonce reuse across different messages.
        let sk_bytes = sk.into_bigint().to_bytes_be();
        let k = derive_scalar(NONCE_DOMAIN, &[&sk_bytes, &message_hash[..]]);
        if k.is_zero() {
            return Err(Error::Signing("degenerate nonce".to_string()));
        }

        let g = Affine::generator();
        let commitment_g = g.mul(k).into_affine();
        let commitment_h = h.mul(k).into_affine();

        let c = challenge(&pk, &h, &nullifier_point, &commitment_g, &commitment_h);
        let s = k + c * sk;

        Ok(PlumeSignature {
            message_hash,
            nullifier,
            nullifier_point,
            c,
            s,
            public_key: pk,
        })
    }

    /// Verify the proof against public data only.
    ///
    /// Recomputes the hash-to-curve point from the message hash and public
    /// key, checks the nullifier commitment, then checks the DLEQ equations
    /// `s*G = A + c*pk` and `s*H = B + c*N` by recomputing the challenge.
    pub fn verify(&self) -> Result<(), Error> {
        if Nullifier::from_point(&self.nullifier_point) != self.nullifier {
            return Err(Error::NullifierMismatch);
        }

        let h = hash_to_curve(&self.public_key, &self.message_hash);
        let g = Affine::generator();

        let commitment_g = (g.mul(self.s) - self.public_key.0.mul(self.c)).into_affine();
        let commitment_h = (h.mul(self.s) - self.nullifier_point.mul(self.c)).into_affine();

        let expected = challenge(
            &self.public_key,
            &h,
            &self.nullifier_point,
            &commitment_g,
            &commitment_h,
        );
        if expected != self.c {
            return Err(Error::InvalidSignature);
        }
        Ok(())
    }
}

/// Derive the nullifier for a message hash under a secret key.
///
/// Pure function of its inputs; safe to call concurrently.
pub fn derive_nullifier(message_hash: &[u8; 32], secret: &SecretKey) -> Nullifier {
    let public = secret.public();
    let h = hash_to_curve(&public, message_hash);
    let point = h.mul(secret.0).into_affine();
    Nullifier::from_point(&point)
}

/// Map (public key, message hash) to a curve point by try-and-increment.
///
/// Counter-hashed x candidates until one lands on the curve; expected two
/// attempts. secp256k1 has cofactor 1, so any curve point is already in the
/// prime-order group. Including the compressed public key in the input is
/// what makes nullifiers unlinkable across messages without it.
pub(crate) fn hash_to_curve(public_key: &PublicKey, message_hash: &[u8; 32]) -> Affine {
    let pk_bytes = public_key.to_bytes();
    for counter in 0u32.. {
        let mut hasher = Sha256::new();
        hasher.update(H2C_DOMAIN);
        hasher.update(&pk_bytes);
        hasher.update(message_hash);
        hasher.update(counter.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        let x = Fq::from_be_bytes_mod_order(&digest);
        let greatest = digest[0] & 1 == 1;
        if let Some(point) = Affine::get_point_from_x_unchecked(x, greatest) {
            return point;
        }
    }
    unreachable!()
}

fn compress(point: &Affine) -> Vec<u8> {
    let mut bytes = Vec::new();
    point
        .serialize_compressed(&mut bytes)
        .unwrap_or_else(|_| unreachable!());
    bytes
}

// Wide (64-byte) hash reduced mod n, Fiat-Shamir style.
fn derive_scalar(domain: &[u8], inputs: &[&[u8]]) -> Fr {
    let mut hasher = Sha512::new();
    hasher.update(domain);
    for input in inputs {
        hasher.update(input);
    }
    let wide: [u8; 64] = hasher.finalize().into();
    Fr::from_be_bytes_mod_order(&wide)
}

fn challenge(
    public_key: &PublicKey,
    h: &Affine,
    nullifier_point: &Affine,
    commitment_g: &Affine,
    commitment_h: &Affine,
) -> Fr {
    let g = Affine::generator();
    derive_scalar(
        CHALLENGE_DOMAIN,
        &[
            &compress(&g),
            &public_key.to_bytes(),
            &compress(h),
            &compress(nullifier_point),
            &compress(commitment_g),
            &compress(commitment_h),
        ],
    )
}
