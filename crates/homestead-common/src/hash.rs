//! Identity hashing.
//!
//! Turns a tuple of identity strings into eight bytes. Each derived parcel
//! attribute reads one of those bytes, so the attributes are a pure function
//! of the identity. The hash is djb2 over the `|`-joined parts followed by
//! eight salted re-hash rounds. It is not cryptographic; it only has to
//! spread similar identities across the attribute bands.

/// Number of bytes produced by [`identity_hash`].
pub const IDENTITY_HASH_LEN: usize = 8;

/// Separator placed between identity parts before hashing.
pub const PART_SEPARATOR: char = '|';

const DJB2_INIT: u32 = 5381;
const GOLDEN_SALT: u32 = 0x9E37_79B9;

/// One djb2 step: `h * 33 + value`, modulo 2^32.
#[inline]
const fn djb2_step(h: u32, value: u32) -> u32 {
    (h << 5).wrapping_add(h).wrapping_add(value)
}

/// Hashes identity parts into [`IDENTITY_HASH_LEN`] bytes.
///
/// Characters are consumed as UTF-16 code units.
#[must_use]
pub fn identity_hash<S: AsRef<str>>(parts: &[S]) -> [u8; IDENTITY_HASH_LEN] {
    let mut h = DJB2_INIT;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            h = djb2_step(h, PART_SEPARATOR as u32);
        }
        for unit in part.as_ref().encode_utf16() {
            h = djb2_step(h, u32::from(unit));
        }
    }

    let mut out = [0u8; IDENTITY_HASH_LEN];
    for (i, byte) in out.iter_mut().enumerate() {
        h = djb2_step(h, (i as u32).wrapping_add(GOLDEN_SALT));
        *byte = (h & 0xFF) as u8;
    }
    out
}
