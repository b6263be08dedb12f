//! (De)serializes an [`Address`] that may arrive left-padded to 32 bytes.
//!
//! The bundler reports the sender of a landed operation as a raw event topic, so the
//! field decodes from either a plain address or a padded word.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Deserializer, Serializer, de::Error};

/// Serializes the address in its canonical 20-byte form.
pub fn serialize<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(address)
}

/// Deserializes an address from 20-byte or topic-padded 32-byte hex.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(address) = raw.parse::<Address>() {
        return Ok(address);
    }
    let word = raw.parse::<B256>().map_err(D::Error::custom)?;
    Ok(Address::from_word(word))
}
