//! Watch list entries.
//!
//! The list is supplied as JSON. Entries are either `{ "name", "address" }`
//! objects or the `"name:address"` strings the watch-list store keeps.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// A named on-chain reserve to monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedAsset {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchListError {
    #[error("watch list entry '{0}' is not in name:address form")]
    Malformed(String),
}

impl WatchedAsset {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Storage form: `name:address`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.name, self.address)
    }

    /// Parse the storage form. Splits on the last `:` so names may contain
    /// colons.
    pub fn decode(entry: &str) -> Result<Self, WatchListError> {
        match entry.rsplit_once(':') {
            Some((name, address)) if !name.trim().is_empty() && !address.trim().is_empty() => {
                Ok(Self::new(name.trim(), address.trim()))
            }
            _ => Err(WatchListError::Malformed(entry.to_string())),
        }
    }

    /// Whether the address has the `0x` + 40 hex digits shape.
    pub fn has_valid_address(&self) -> bool {
        is_valid_address(&self.address)
    }
}

/// One element of the `WATCH_LIST` JSON array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WatchListEntry {
    Asset(WatchedAsset),
    Encoded(String),
}

impl TryFrom<WatchListEntry> for WatchedAsset {
    type Error = WatchListError;

    fn try_from(entry: WatchListEntry) -> Result<Self, Self::Error> {
        match entry {
            WatchListEntry::Asset(asset) => Ok(asset),
            WatchListEntry::Encoded(s) => Self::decode(&s),
        }
    }
}

/// `^0x[a-fA-F0-9]{40}$`, the rule enforced by the watch-list write API.
pub fn is_valid_address(address: &str) -> bool {
    static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
    ADDRESS_RE
        .get_or_init(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("static pattern"))
        .is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: &str = "0xb88339CB7199b77E23DB6E890353E22632Ba630f";

    #[test]
    fn test_encode_decode() {
        let asset = WatchedAsset::new("USDC", USDC);
        assert_eq!(asset.encode(), format!("USDC:{USDC}"));
        assert_eq!(WatchedAsset::decode(&asset.encode()), Ok(asset));
    }

    #[test]
    fn test_decode_splits_on_last_colon() {
        let asset = WatchedAsset::decode(&format!("PT:sUSDe:{USDC}")).unwrap();
        assert_eq!(asset.name, "PT:sUSDe");
        assert_eq!(asset.address, USDC);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(WatchedAsset::decode("no-colon").is_err());
        assert!(WatchedAsset::decode(":0xabc").is_err());
        assert!(WatchedAsset::decode("name:").is_err());
    }

    #[test]
    fn test_address_shape() {
        assert!(is_valid_address(USDC));
        assert!(!is_valid_address("0xabc"));
        assert!(!is_valid_address(&USDC[2..]));
        assert!(!is_valid_address(&format!("{USDC}0")));
        assert!(!is_valid_address("0xg8339CB7199b77E23DB6E890353E22632Ba630f"));
    }

    #[test]
    fn test_mixed_entry_forms() {
        let json = format!(r#"[{{"name":"X","address":"0xabc"}}, "USDC:{USDC}"]"#);
        let entries: Vec<WatchListEntry> = serde_json::from_str(&json).unwrap();
        let assets: Vec<WatchedAsset> = entries
            .into_iter()
            .map(WatchedAsset::try_from)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            assets,
            vec![WatchedAsset::new("X", "0xabc"), WatchedAsset::new("USDC", USDC)]
        );
        assert!(!assets[0].has_valid_address());
        assert!(assets[1].has_valid_address());
    }
}
