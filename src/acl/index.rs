//! Builds the scoped option index from ordered `acl_options` rows.

use crate::types::{AclOptionIndex, AclOptionRow};

/// Assigns dense bit positions to option names, one counter per scope.
///
/// The rows must already be ordered by ascending `auth_option_id`: phpBB
/// enumerates options in exactly that order when it packs a user's
/// permission blob, so the ordinals here have to mirror it. A row flagged
/// for both scopes gets an ordinal in each; a row flagged for neither is
/// skipped without consuming a position.
#[must_use]
pub fn build_option_index(rows: &[AclOptionRow]) -> AclOptionIndex {
    let mut index = AclOptionIndex::default();
    let mut local_ordinal = 0usize;
    let mut global_ordinal = 0usize;

    for row in rows {
        if row.is_local {
            index
                .local
                .insert(row.auth_option.clone(), local_ordinal);
            local_ordinal += 1;
        }
        if row.is_global {
            index
                .global
                .insert(row.auth_option.clone(), global_ordinal);
            global_ordinal += 1;
        }
    }

    tracing::debug!(
        local = index.local_len(),
        global = index.global_len(),
        rows = rows.len(),
        "built acl option index"
    );
    index
}
