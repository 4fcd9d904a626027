use super::transaction::Transaction;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// `previous_hash` carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            transactions,
            proof,
            previous_hash,
        }
    }

    pub fn genesis() -> Self {
        Self::new(1, vec![], GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn hash(&self) -> String {
        compute_hash(self)
    }

    pub fn canonical_value(&self) -> Value {
        json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "transactions": self
                .transactions
                .iter()
                .map(Transaction::canonical_value)
                .collect::<Vec<_>>(),
            "proof": self.proof,
            "previous_hash": self.previous_hash,
        })
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros((self.timestamp * 1_000_000.0).round() as i64)
    }

    /// Human-readable view of the block, one field per line.
    pub fn render(&self) -> String {
        let created = self
            .created_at()
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            .unwrap_or_else(|| self.timestamp.to_string());

        let mut out = String::new();
        let _ = writeln!(out, "Block {}", self.index);
        let _ = writeln!(out, "  Timestamp:     {}", created);
        let _ = writeln!(out, "  Previous Hash: {}", self.previous_hash);
        let _ = writeln!(out, "  Proof:         {}", self.proof);
        let _ = writeln!(out, "  Transactions:  {}", self.transactions.len());
        for tx in &self.transactions {
            let _ = writeln!(out, "    {}", tx.canonical_value());
        }
        out
    }
}

/// SHA-256 over the canonical encoding of `block`, as lowercase hex.
pub fn compute_hash(block: &Block) -> String {
    let encoded = canonical_json(&block.canonical_value());
    hex::encode(Sha256::digest(encoded.as_bytes()))
}

/// Compact JSON with object keys emitted in lexicographic order at every depth,
/// independent of how the map was built.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn fixed_genesis() -> Block {
        Block {
            index: 1,
            timestamp: 1_700_000_000.5,
            transactions: vec![],
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    #[test]
    fn genesis_has_fixed_parameters() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 100);
        assert_eq!(genesis.previous_hash, "1");
        assert!(genesis.transactions.is_empty());
        assert!(genesis.timestamp > 0.0);
    }

    #[test]
    fn canonical_encoding_sorts_keys() {
        assert_eq!(
            canonical_json(&fixed_genesis().canonical_value()),
            r#"{"index":1,"previous_hash":"1","proof":100,"timestamp":1700000000.5,"transactions":[]}"#
        );
    }

    #[test]
    fn hash_matches_known_vectors() {
        let genesis = fixed_genesis();
        let genesis_hash = compute_hash(&genesis);
        assert_eq!(
            genesis_hash,
            "6ce5f6345a66866646fa9ae15785d9d686e972dbe2a1af3f4a83e5a12109e904"
        );

        let next = Block {
            index: 2,
            timestamp: 1_700_000_100.25,
            transactions: vec![Transaction::new("Alice", "B123", "A1", "2024-05-01")],
            proof: 35293,
            previous_hash: genesis_hash,
        };
        assert_eq!(
            next.hash(),
            "49b168ee30942e4befce53bc1bccb05ea8f9fc918199636ad82b774efc785d84"
        );
    }

    #[test]
    fn hash_is_lowercase_hex_of_sha256() {
        let hash = fixed_genesis().hash();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash.to_lowercase());
        assert_eq!(hex::decode(&hash).unwrap().len(), 32);
    }

    #[test]
    fn hash_is_deterministic() {
        let block = fixed_genesis();
        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), block.clone().hash());
    }

    #[test]
    fn insertion_order_does_not_change_encoding() {
        let mut forward = Map::new();
        forward.insert("holder".into(), json!("Alice"));
        forward.insert("date".into(), json!("2024-05-01"));
        forward.insert("nested".into(), json!({"b": 1, "a": [2, {"z": 0, "y": 1}]}));

        let mut reverse = Map::new();
        reverse.insert("nested".into(), json!({"a": [2, {"y": 1, "z": 0}], "b": 1}));
        reverse.insert("date".into(), json!("2024-05-01"));
        reverse.insert("holder".into(), json!("Alice"));

        assert_eq!(
            canonical_json(&Value::Object(forward)),
            canonical_json(&Value::Object(reverse))
        );
    }

    #[test]
    fn any_field_change_changes_hash() {
        let base = fixed_genesis();
        let mut other = base.clone();
        other.proof += 1;
        assert_ne!(base.hash(), other.hash());

        let mut other = base.clone();
        other.transactions.push(Transaction::new("Bob", "B9", "C3", "2024-06-01"));
        assert_ne!(base.hash(), other.hash());
    }

    #[test]
    fn render_lists_block_fields() {
        let mut block = fixed_genesis();
        block.transactions.push(Transaction::new("Alice", "B123", "A1", "2024-05-01"));
        let text = block.render();
        assert!(text.starts_with("Block 1"));
        assert!(text.contains("Previous Hash: 1"));
        assert!(text.contains("Proof:         100"));
        assert!(text.contains(r#""holder":"Alice""#));
    }
}
