//! Privilege evaluation over a decoded [`UserAcl`] and a shared
//! [`AclOptionIndex`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::acl::decode::decode_user_permissions;
use crate::acl::index::build_option_index;
use crate::constants::{GLOBAL_FORUM, GROUP_BITS};
use crate::error::Result;
use crate::types::{AclOptionIndex, AclOptionRow, UserAcl};

/// Answers "does option X hold for forum F" for one user.
///
/// The option index is shared and read-only; the user ACL and the answer
/// cache belong to exactly one session context. Each (forum, option) pair
/// is computed once and the first answer wins for the evaluator's
/// lifetime. Single-threaded per-session ownership is an invariant of the
/// session model, so the cache sits behind a `RefCell` rather than a lock.
#[derive(Debug)]
pub struct AclEvaluator {
    index: Arc<AclOptionIndex>,
    acl: UserAcl,
    cache: RefCell<HashMap<String, HashMap<String, bool>>>,
}

impl AclEvaluator {
    /// Wraps an already-built index and decoded ACL.
    #[must_use]
    pub fn new(index: Arc<AclOptionIndex>, acl: UserAcl) -> Self {
        Self {
            index,
            acl,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The decoded permission map this evaluator answers from.
    #[must_use]
    pub fn acl(&self) -> &UserAcl {
        &self.acl
    }

    /// The shared option index this evaluator answers from.
    #[must_use]
    pub fn index(&self) -> &AclOptionIndex {
        &self.index
    }

    /// Tests one privilege, globally or within `forum_id`.
    ///
    /// A leading `!` negates the answer. Global permissions apply to every
    /// forum; local bits can only add permission on top of them, never
    /// remove it. Every recoverable oddity (unknown option, missing scope
    /// entry, bit position beyond the stored string) resolves to `false`:
    /// evaluation is fail-closed and never errors.
    #[must_use]
    pub fn has_privilege(&self, option: &str, forum_id: u32) -> bool {
        let (negated, option) = match option.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, option),
        };
        let forum_key = forum_id.to_string();

        let cached = self
            .cache
            .borrow()
            .get(&forum_key)
            .and_then(|options| options.get(option).copied());

        let granted = match cached {
            Some(granted) => granted,
            None => {
                let granted = self.evaluate(option, &forum_key);
                self.cache
                    .borrow_mut()
                    .entry(forum_key)
                    .or_default()
                    .insert(option.to_string(), granted);
                granted
            }
        };

        negated ^ granted
    }

    /// Logical OR of [`Self::has_privilege`] across `options`.
    ///
    /// Short-circuits on the first grant; later options stay uncomputed
    /// (and uncached) but the boolean result is identical to a full scan.
    #[must_use]
    pub fn has_privileges(&self, options: &[&str], forum_id: u32) -> bool {
        options
            .iter()
            .any(|option| self.has_privilege(option, forum_id))
    }

    fn evaluate(&self, option: &str, forum_key: &str) -> bool {
        let mut granted = false;

        // Global scope first: bit positions index into the "0" entry.
        if let Some(ordinal) = self.index.global_ordinal(option) {
            if let Some(bits) = self.acl.global_bits() {
                if let Some(bit) = bit_at(bits, ordinal) {
                    granted = bit;
                }
            }
        }

        // Local scope only adds permission on top, and only for real
        // forums. A forum with no decoded line falls back to 31 zeros.
        if forum_key != GLOBAL_FORUM {
            if let Some(ordinal) = self.index.local_ordinal(option) {
                let bits = self.acl.bits(forum_key).unwrap_or(ZERO_GROUP);
                if let Some(bit) = bit_at(bits, ordinal) {
                    granted |= bit;
                }
            }
        }

        granted
    }
}

const ZERO_GROUP: &str = "0000000000000000000000000000000";

const _: () = assert!(ZERO_GROUP.len() == GROUP_BITS);

/// Bit lookup with the legacy truthiness rules: any nonzero decimal digit
/// grants. Positions past the end of the string carry no information and
/// yield `None`; the decoder cannot emit a non-digit, but if one is ever
/// observed the lookup fails closed.
fn bit_at(bits: &str, ordinal: usize) -> Option<bool> {
    let byte = *bits.as_bytes().get(ordinal)?;
    match (byte as char).to_digit(10) {
        Some(digit) => Some(digit != 0),
        None => {
            tracing::warn!(ordinal, bit = %char::from(byte), "non-digit permission bit; denying");
            Some(false)
        }
    }
}

/// Builds a ready-to-query evaluator from raw option rows and the user's
/// raw permission blob.
///
/// # Errors
/// Fails when the permission blob cannot be decoded; see
/// [`decode_user_permissions`].
pub fn get_user_acl(rows: &[AclOptionRow], raw_permissions: &str) -> Result<AclEvaluator> {
    let index = build_option_index(rows);
    let acl = decode_user_permissions(raw_permissions)?;
    Ok(AclEvaluator::new(Arc::new(index), acl))
}
