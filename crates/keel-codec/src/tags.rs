//! The wire type tags. One byte each; chosen to be printable so hex dumps
//! of node bytes stay readable.

pub const BOOL: u8 = b'B';
pub const BYTE: u8 = b'b';
pub const INT: u8 = b'i';
pub const LONG: u8 = b'l';
pub const STRING: u8 = b's';
pub const BYTES: u8 = b'a';
pub const INSTANT: u8 = b't';
pub const ZONED: u8 = b'z';
pub const EID: u8 = b'e';

/// Returns `true` if `tag` is a recognized wire tag.
pub fn is_known(tag: u8) -> bool {
    matches!(
        tag,
        BOOL | BYTE | INT | LONG | STRING | BYTES | INSTANT | ZONED | EID
    )
}
