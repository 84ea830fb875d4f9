use crate::*;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_secp256k1::{Affine, Fr};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::ops::Mul;

/// A secp256k1 private scalar in [1, n-1].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(pub(crate) Fr);

/// A secp256k1 public point; invariant: `public = secret * G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub(crate) Affine);

/// A long-term voter key pair. Created once, persisted by [`SecureKeyStore`],
/// read-only thereafter. Regeneration overwrites the stored pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl SecretKey {
    /// Draw a fresh scalar from a cryptographically secure source.
    ///
    /// Fails with [`Error::InsufficientEntropy`] if the source is
    /// unavailable; there is no non-cryptographic fallback.
    pub fn generate<R: RngCore + CryptoRng>(csprng: &mut R) -> Result<Self, Error> {
        loop {
            // 64 uniform bytes reduced mod n leave negligible bias.
            let mut wide = [0u8; 64];
            csprng.try_fill_bytes(&mut wide)?;
            let scalar = Fr::from_be_bytes_mod_order(&wide);
            if !scalar.is_zero() {
                return Ok(SecretKey(scalar));
            }
        }
    }

    /// Derive the public point by fixed-base scalar multiplication.
    pub fn public(&self) -> PublicKey {
        PublicKey(Affine::generator().mul(self.0).into_affine())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.into_bigint().to_bytes_be())
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|_| Error::CredentialBadHex("PRIVATE_KEY"))?;
        if bytes.len() != 32 {
            return Err(Error::CredentialBadLen("PRIVATE_KEY"));
        }
        let scalar = Fr::from_be_bytes_mod_order(&bytes);
        if scalar.is_zero() {
            return Err(Error::CredentialOutOfRange("PRIVATE_KEY"));
        }
        Ok(SecretKey(scalar))
    }
}

// Never print the scalar.
impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SecretKey(..)")
    }
}

impl PublicKey {
    /// Compressed point encoding (33 bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        // Serializing an affine point to a Vec cannot fail.
        self.0
            .serialize_compressed(&mut bytes)
            .unwrap_or_else(|_| unreachable!());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let point = Affine::deserialize_compressed(bytes)?;
        Ok(PublicKey(point))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|_| Error::CredentialBadHex("PUBLIC_KEY"))?;
        PublicKey::from_bytes(&bytes)
    }

    /// Affine coordinates as 32-byte big-endian hex strings.
    ///
    /// The point is never the identity: secrets are drawn from [1, n-1].
    pub fn coordinates(&self) -> (String, String) {
        let x = hex::encode(self.0.x.into_bigint().to_bytes_be());
        let y = hex::encode(self.0.y.into_bigint().to_bytes_be());
        (x, y)
    }
}

impl KeyPair {
    /// Generate a fresh key pair from the operating system's CSPRNG.
    pub fn generate() -> Result<Self, Error> {
        KeyPair::generate_from_rng(&mut OsRng)
    }

    /// Generate from a caller-supplied CSPRNG (used by tests with a seeded
    /// ChaCha RNG; production callers want [`KeyPair::generate`]).
    pub fn generate_from_rng<R: RngCore + CryptoRng>(csprng: &mut R) -> Result<Self, Error> {
        let secret = SecretKey::generate(csprng)?;
        let public = secret.public();
        Ok(KeyPair { secret, public })
    }

    /// Rebuild a key pair from stored credentials.
    ///
    /// The private scalar is required; the public point is re-derived from
    /// it and cross-checked against the stored encoding when present.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self, Error> {
        let private_hex = credentials
            .private_key
            .as_deref()
            .ok_or(Error::MissingCredential("PRIVATE_KEY"))?;
        let secret = SecretKey::from_hex(private_hex)?;
        let public = secret.public();

        if let Some(stored) = credentials.public_key.as_deref() {
            if PublicKey::from_hex(stored)? != public {
                return Err(Error::MismatchedPublicKeys);
            }
        }

        Ok(KeyPair { secret, public })
    }
}

impl From<&KeyPair> for Credentials {
    fn from(keypair: &KeyPair) -> Self {
        let (pk_x, pk_y) = keypair.public.coordinates();
        Credentials {
            private_key: Some(keypair.secret.to_hex()),
            public_key: Some(keypair.public.to_hex()),
            pk_x: Some(pk_x),
            pk_y: Some(pk_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn public_point_matches_scalar_mul() {
        let keypair = KeyPair::generate().unwrap();
        let expected = Affine::generator().mul(keypair.secret.0).into_affine();
        assert_eq!(keypair.public.0, expected);
    }

    #[test]
    fn successive_keys_are_independent() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        assert_ne!(a.secret.0, b.secret.0);
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn secret_key_hex_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let keypair = KeyPair::generate_from_rng(&mut rng).unwrap();
        let restored = SecretKey::from_hex(&keypair.secret.to_hex()).unwrap();
        assert_eq!(restored, keypair.secret);
        assert_eq!(restored.public(), keypair.public);
    }

    #[test]
    fn public_key_hex_round_trip() {
        let keypair = KeyPair::generate().unwrap();
        let restored = PublicKey::from_hex(&keypair.public.to_hex()).unwrap();
        assert_eq!(restored, keypair.public);
    }

    #[test]
    fn coordinates_are_fixed_width_hex() {
        let keypair = KeyPair::generate().unwrap();
        let (x, y) = keypair.public.coordinates();
        assert_eq!(x.len(), 64);
        assert_eq!(y.len(), 64);
    }

    #[test]
    fn credentials_round_trip_rebuilds_the_pair() {
        let keypair = KeyPair::generate().unwrap();
        let credentials = Credentials::from(&keypair);
        let restored = KeyPair::from_credentials(&credentials).unwrap();
        assert_eq!(restored, keypair);
    }

    #[test]
    fn mismatched_stored_public_key_is_rejected() {
        let keypair = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let mut credentials = Credentials::from(&keypair);
        credentials.public_key = Some(other.public.to_hex());
        match KeyPair::from_credentials(&credentials) {
            Err(Error::MismatchedPublicKeys) => {}
            other => panic!("expected MismatchedPublicKeys, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn secret_key_debug_is_redacted() {
        let keypair = KeyPair::generate().unwrap();
        assert_eq!(format!("{:?}", keypair.secret), "SecretKey(..)");
    }
}
