//! Identity token assignment for one child list.

use crate::model::{IdentityToken, Key, Node};
use std::collections::BTreeMap;

/// A later sibling that reused an earlier sibling's key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: Key,
    pub first_index: usize,
    pub duplicate_index: usize,
}

/// Tokens for one list plus any duplicate keys that were demoted
#[derive(Debug, Clone, Default)]
pub struct ListTokens {
    pub tokens: Vec<IdentityToken>,
    pub duplicates: Vec<DuplicateKey>,
}

/// Assign identity tokens to a child list
///
/// The token is the explicit key when present, otherwise the index. When two
/// siblings share a key, the first occurrence keeps it and later ones fall
/// back to their index.
pub fn assign_tokens(list: &[Node]) -> ListTokens {
    let mut first_seen: BTreeMap<&Key, usize> = BTreeMap::new();
    let mut out = ListTokens {
        tokens: Vec::with_capacity(list.len()),
        duplicates: Vec::new(),
    };

    for (index, node) in list.iter().enumerate() {
        let token = match &node.key {
            Some(key) => match first_seen.get(key) {
                Some(&first_index) => {
                    out.duplicates.push(DuplicateKey {
                        key: key.clone(),
                        first_index,
                        duplicate_index: index,
                    });
                    IdentityToken::Index(index)
                }
                None => {
                    first_seen.insert(key, index);
                    IdentityToken::Key(key.clone())
                }
            },
            None => IdentityToken::Index(index),
        };
        out.tokens.push(token);
    }

    out
}
