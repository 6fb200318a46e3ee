//! Strong type definitions for blockledger.
//!
//! Sentinels that were historically overloaded onto the digest fields
//! (integer `0` for "no predecessor" and "no transactions") are explicit enum
//! variants here. They still encode as `0` on the wire and in hashed metadata.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::canonical::canonical_object;
use crate::crypto::Sha256Hash;
use crate::error::CoreError;

/// Link from a block to its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviousHash {
    /// The genesis block has no predecessor.
    Genesis,
    /// Hash of the preceding block.
    Block(Sha256Hash),
}

impl PreviousHash {
    /// The linked digest, if any.
    pub fn digest(&self) -> Option<&Sha256Hash> {
        match self {
            PreviousHash::Genesis => None,
            PreviousHash::Block(h) => Some(h),
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, PreviousHash::Genesis)
    }

    /// Value used in hashed metadata and the structured representation.
    pub fn to_value(&self) -> Value {
        digest_or_zero(self.digest())
    }
}

impl From<Sha256Hash> for PreviousHash {
    fn from(hash: Sha256Hash) -> Self {
        PreviousHash::Block(hash)
    }
}

impl fmt::Debug for PreviousHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousHash::Genesis => write!(f, "PreviousHash::Genesis"),
            PreviousHash::Block(h) => write!(f, "PreviousHash({:?})", h),
        }
    }
}

impl fmt::Display for PreviousHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousHash::Genesis => f.write_str("genesis"),
            PreviousHash::Block(h) => write!(f, "{}", h),
        }
    }
}

/// Merkle root over a block's transactions.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum MerkleRoot {
    /// The block carries no transactions; there is no root to compute.
    Empty,
    /// Root digest over one or more transactions.
    Root(Sha256Hash),
}

impl MerkleRoot {
    /// The root digest, if any.
    pub fn digest(&self) -> Option<&Sha256Hash> {
        match self {
            MerkleRoot::Empty => None,
            MerkleRoot::Root(h) => Some(h),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MerkleRoot::Empty)
    }

    /// Value used in hashed metadata and the structured representation.
    pub fn to_value(&self) -> Value {
        digest_or_zero(self.digest())
    }
}

impl fmt::Debug for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleRoot::Empty => write!(f, "MerkleRoot::Empty"),
            MerkleRoot::Root(h) => write!(f, "MerkleRoot({:?})", h),
        }
    }
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleRoot::Empty => f.write_str("empty"),
            MerkleRoot::Root(h) => write!(f, "{}", h),
        }
    }
}

fn digest_or_zero(digest: Option<&Sha256Hash>) -> Value {
    match digest {
        Some(h) => Value::String(h.to_hex()),
        None => Value::from(0),
    }
}

/// Wire form shared by both sentinel types: a hex digest or the integer 0.
#[derive(Deserialize)]
#[serde(untagged)]
enum DigestOrZero {
    Digest(Sha256Hash),
    Zero(u64),
}

fn deserialize_sentinel<'de, D>(deserializer: D) -> Result<Option<Sha256Hash>, D::Error>
where
    D: Deserializer<'de>,
{
    match DigestOrZero::deserialize(deserializer)? {
        DigestOrZero::Digest(h) => Ok(Some(h)),
        DigestOrZero::Zero(0) => Ok(None),
        DigestOrZero::Zero(n) => Err(serde::de::Error::custom(format!(
            "expected hex digest or 0, got {}",
            n
        ))),
    }
}

impl Serialize for PreviousHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PreviousHash::Genesis => serializer.serialize_u64(0),
            PreviousHash::Block(h) => h.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PreviousHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(deserialize_sentinel(deserializer)?.map_or(PreviousHash::Genesis, PreviousHash::Block))
    }
}

impl Serialize for MerkleRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MerkleRoot::Empty => serializer.serialize_u64(0),
            MerkleRoot::Root(h) => h.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MerkleRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(deserialize_sentinel(deserializer)?.map_or(MerkleRoot::Empty, MerkleRoot::Root))
    }
}

/// A transaction record: a JSON object with no imposed schema.
///
/// The ledger only ever canonicalizes and hashes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(Map<String, Value>);

impl Transaction {
    /// Wrap an existing JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convert any serializable record.
    ///
    /// Fails with [`CoreError::Serialization`] unless the record serializes
    /// to a JSON object.
    pub fn from_record<T: Serialize + ?Sized>(record: &T) -> Result<Self, CoreError> {
        Self::try_from(serde_json::to_value(record)?)
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The underlying fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Canonical encoding of this record.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_object(&self.0)
    }

    /// Size charged against the block budget.
    pub fn canonical_size(&self) -> usize {
        self.canonical_bytes().len()
    }

    /// Leaf digest of this record.
    pub fn digest(&self) -> Sha256Hash {
        Sha256Hash::hash(&self.canonical_bytes())
    }
}

impl TryFrom<Value> for Transaction {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(CoreError::Serialization(format!(
                "transaction must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<Map<String, Value>> for Transaction {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_previous_hash_wire_form() {
        assert_eq!(serde_json::to_value(PreviousHash::Genesis).unwrap(), json!(0));

        let h = Sha256Hash::from_bytes([0x11; 32]);
        let linked = PreviousHash::Block(h);
        assert_eq!(serde_json::to_value(linked).unwrap(), json!(h.to_hex()));

        let back: PreviousHash = serde_json::from_value(json!(h.to_hex())).unwrap();
        assert_eq!(back, linked);
        let back: PreviousHash = serde_json::from_value(json!(0)).unwrap();
        assert_eq!(back, PreviousHash::Genesis);
    }

    #[test]
    fn test_sentinel_rejects_other_integers() {
        assert!(serde_json::from_value::<MerkleRoot>(json!(7)).is_err());
        assert!(serde_json::from_value::<MerkleRoot>(json!("nothex")).is_err());
    }

    #[test]
    fn test_merkle_root_to_value() {
        assert_eq!(MerkleRoot::Empty.to_value(), json!(0));
        let h = Sha256Hash::from_bytes([0x22; 32]);
        assert_eq!(MerkleRoot::Root(h).to_value(), json!(h.to_hex()));
    }

    #[test]
    fn test_transaction_from_record() {
        #[derive(Serialize)]
        struct Transfer {
            from: String,
            amount: u64,
        }

        let tx = Transaction::from_record(&Transfer {
            from: "alice".into(),
            amount: 5,
        })
        .unwrap();
        assert_eq!(tx.get("amount"), Some(&json!(5)));
        assert_eq!(tx.canonical_bytes(), br#"{"amount": 5, "from": "alice"}"#.to_vec());
    }

    #[test]
    fn test_transaction_rejects_non_object() {
        let result = Transaction::try_from(json!([1, 2, 3]));
        assert!(matches!(result, Err(CoreError::Serialization(_))));

        let result = Transaction::from_record(&42u32);
        assert!(matches!(result, Err(CoreError::Serialization(_))));
    }

    #[test]
    fn test_canonical_size_counts_bytes() {
        let tx = Transaction::try_from(json!({"id": 1})).unwrap();
        // `{"id": 1}`
        assert_eq!(tx.canonical_size(), 9);
    }
}
