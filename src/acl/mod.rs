//! The ACL engine: chunk unpacking, option indexing, blob decoding, and
//! privilege evaluation.
//!
//! phpBB stores every user's permissions as a packed string: one line per
//! forum (line 0 is the global scope), each line a run of base-36 chunks
//! that expand to 31-bit groups. Bit positions are assigned by the
//! enumeration order of the `acl_options` table, split into local and
//! global scopes. This module decodes that format and answers privilege
//! queries with global-first, local-OR-merge semantics.

pub mod decode;
pub mod eval;
pub mod index;
pub mod unpack;

pub use decode::decode_user_permissions;
pub use eval::{AclEvaluator, get_user_acl};
pub use index::build_option_index;
pub use unpack::{unpack_chunk, unpack_chunk_uncached};
