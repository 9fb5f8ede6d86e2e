//! Decodes a user's raw multi-line permission blob into per-forum
//! bit-strings.

use crate::acl::unpack::unpack_chunk;
use crate::constants::CHUNK_WIDTH;
use crate::error::{PhpbbError, Result};
use crate::types::UserAcl;

/// Decodes the `user_permissions` column into a [`UserAcl`].
///
/// The blob is one line per forum context; the line's position is the
/// forum id, with line 0 holding the global scope. Blank lines create no
/// entry for their forum. Each line is cut into consecutive 6-character
/// chunks and every chunk expands to a 31-bit group; a short trailing
/// chunk is parsed from whatever characters remain and still pads to 31
/// bits, matching how phpBB itself slices the string.
///
/// # Errors
/// Fails on the first chunk containing non base-36 characters. A partial
/// ACL would silently misreport permissions, so the whole decode is
/// rejected instead of dropping the bad line.
pub fn decode_user_permissions(raw: &str) -> Result<UserAcl> {
    let mut acl = UserAcl::default();

    for (forum, line) in raw.trim_end().lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        if !line.is_ascii() {
            return Err(PhpbbError::NonAsciiPermissionLine { forum });
        }

        let mut bits = String::with_capacity(line.len() / CHUNK_WIDTH * 32);
        for chunk in line.as_bytes().chunks(CHUNK_WIDTH) {
            // Safe split: the line is ASCII, so every byte boundary is a
            // char boundary.
            let chunk = std::str::from_utf8(chunk).map_err(|_| {
                PhpbbError::NonAsciiPermissionLine { forum }
            })?;
            bits.push_str(&unpack_chunk(chunk, forum)?);
        }
        acl.insert(forum.to_string(), bits);
    }

    tracing::debug!(forums = acl.len(), "decoded user permissions");
    Ok(acl)
}
