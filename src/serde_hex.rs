// We define in our crate:
use crate::PublicKey;
use ark_ff::{BigInteger, PrimeField};
use ark_secp256k1::{Affine, Fr};
use ark_serialize::CanonicalDeserialize;
use std::borrow::Cow;

pub use hex_buffer_serde::Hex;

// a single-purpose type for use in `#[serde(with)]`
pub enum PublicKeyHex {}

impl Hex<PublicKey> for PublicKeyHex {
    type Error = String;

    fn create_bytes(public_key: &PublicKey) -> Cow<[u8]> {
        public_key.to_bytes().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<PublicKey, String> {
        PublicKey::from_bytes(bytes).map_err(|e| format!("{}", e))
    }
}

// a single-purpose type for use in `#[serde(with)]`
pub enum PointHex {}

impl Hex<Affine> for PointHex {
    type Error = String;

    fn create_bytes(point: &Affine) -> Cow<[u8]> {
        let mut bytes = Vec::new();
        ark_serialize::CanonicalSerialize::serialize_compressed(point, &mut bytes)
            .unwrap_or_else(|_| unreachable!());
        bytes.into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Affine, String> {
        Affine::deserialize_compressed(bytes).map_err(|e| format!("{}", e))
    }
}

// a single-purpose type for use in `#[serde(with)]`
pub enum ScalarHex {}

impl Hex<Fr> for ScalarHex {
    type Error = String;

    fn create_bytes(scalar: &Fr) -> Cow<[u8]> {
        scalar.into_bigint().to_bytes_be().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Fr, String> {
        if bytes.len() != 32 {
            return Err("scalar must be 32 bytes".to_string());
        }
        Ok(Fr::from_be_bytes_mod_order(bytes))
    }
}

// a single-purpose type for use in `#[serde(with)]`
pub enum Bytes32Hex {}

impl Hex<[u8; 32]> for Bytes32Hex {
    type Error = String;

    fn create_bytes(bytes: &[u8; 32]) -> Cow<[u8]> {
        Cow::from(&bytes[..])
    }

    fn from_bytes(bytes: &[u8]) -> Result<[u8; 32], String> {
        if bytes.len() != 32 {
            return Err("expected 32 bytes".to_string());
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}
