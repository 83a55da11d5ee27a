//! Site-builder block descriptors.
//!
//! A block sync request carries an ordered list of loosely-typed descriptors.
//! [`normalize_blocks`] turns them into [`BlockSpec`]s or rejects the whole
//! list; nothing is persisted unless every descriptor is valid.

use serde::Deserialize;
use serde_json::Value;

use crate::types::SectionKey;

/// Errors that can occur when validating block descriptors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// The key is missing or not a known section.
    #[error("Invalid key at index {0}.")]
    InvalidKey(usize),
    /// An explicit position was negative or too large.
    #[error("Invalid position at index {0}.")]
    InvalidPosition(usize),
}

/// How a sync treats the blocks already on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Delete existing blocks, then insert.
    Replace,
    /// Insert alongside existing blocks.
    Append,
}

impl SyncMode {
    /// Map the request's `replace` flag, which defaults to `true`.
    #[must_use]
    pub fn from_replace_flag(replace: Option<bool>) -> Self {
        if replace.unwrap_or(true) {
            Self::Replace
        } else {
            Self::Append
        }
    }
}

/// One block as submitted by the client.
///
/// `key` is kept as a raw string so that an unknown key is reported with its
/// index rather than as a generic body error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockDescriptor {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub props: Option<Value>,
}

/// A validated block ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub key: SectionKey,
    pub enabled: bool,
    pub position: i32,
    pub props: Option<Value>,
}

/// Validate descriptors in order.
///
/// `enabled` defaults to `true`; `position` defaults to the descriptor's
/// index in the list. A JSON `null` for `props` is stored as no props.
///
/// # Errors
///
/// Returns the first [`BlockError`] encountered.
pub fn normalize_blocks(descriptors: &[BlockDescriptor]) -> Result<Vec<BlockSpec>, BlockError> {
    descriptors
        .iter()
        .enumerate()
        .map(|(index, d)| {
            let key = d
                .key
                .as_deref()
                .and_then(|k| k.parse::<SectionKey>().ok())
                .ok_or(BlockError::InvalidKey(index))?;

            let position = match d.position {
                Some(p) => i32::try_from(p)
                    .ok()
                    .filter(|p| *p >= 0)
                    .ok_or(BlockError::InvalidPosition(index))?,
                None => i32::try_from(index).map_err(|_| BlockError::InvalidPosition(index))?,
            };

            Ok(BlockSpec {
                key,
                enabled: d.enabled.unwrap_or(true),
                position,
                props: d.props.clone().filter(|p| !p.is_null()),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn descriptor(key: &str) -> BlockDescriptor {
        BlockDescriptor {
            key: Some(key.to_owned()),
            ..BlockDescriptor::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let specs = normalize_blocks(&[descriptor("hero"), descriptor("cta")]).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].key, SectionKey::Hero);
        assert_eq!(specs[0].position, 0);
        assert!(specs[0].enabled);
        assert_eq!(specs[1].position, 1);
        assert_eq!(specs[1].props, None);
    }

    #[test]
    fn test_explicit_values_kept() {
        let d = BlockDescriptor {
            key: Some("faq".to_owned()),
            enabled: Some(false),
            position: Some(40),
            props: Some(json!({"items": []})),
        };
        let spec = normalize_blocks(&[d]).unwrap().remove(0);
        assert_eq!(spec.position, 40);
        assert!(!spec.enabled);
        assert_eq!(spec.props, Some(json!({"items": []})));
    }

    #[test]
    fn test_invalid_key_reports_index() {
        let err = normalize_blocks(&[descriptor("hero"), descriptor("carousel")]).unwrap_err();
        assert_eq!(err, BlockError::InvalidKey(1));
        assert_eq!(err.to_string(), "Invalid key at index 1.");

        let err = normalize_blocks(&[BlockDescriptor::default()]).unwrap_err();
        assert_eq!(err, BlockError::InvalidKey(0));
    }

    #[test]
    fn test_negative_position_rejected() {
        let d = BlockDescriptor {
            position: Some(-1),
            ..descriptor("hero")
        };
        assert_eq!(
            normalize_blocks(&[d]).unwrap_err(),
            BlockError::InvalidPosition(0)
        );
    }

    #[test]
    fn test_null_props_dropped() {
        let d: BlockDescriptor = serde_json::from_value(json!({"key": "gallery", "props": null})).unwrap();
        assert_eq!(normalize_blocks(&[d]).unwrap()[0].props, None);
    }

    #[test]
    fn test_sync_mode_defaults_to_replace() {
        assert_eq!(SyncMode::from_replace_flag(None), SyncMode::Replace);
        assert_eq!(SyncMode::from_replace_flag(Some(true)), SyncMode::Replace);
        assert_eq!(SyncMode::from_replace_flag(Some(false)), SyncMode::Append);
    }
}
