//! Resumable boundary scan for values that arrive in pieces.
//!
//! [`FrameScanner`] walks marker headers without building a
//! [`Value`](crate::value::Value), remembering how far it got. Feeding it a growing
//! buffer costs time proportional to the new bytes only, so the framer decodes
//! a message once, when the scan says it is complete.

use rmp::Marker;

use super::{MAX_DECLARED_LEN, MAX_DEPTH};

/// Tracks how much of a partially received value has been walked.
#[derive(Debug, Clone, Default)]
pub struct FrameScanner {
    offset: usize,
    open: Vec<u64>,
    ready: bool,
}

enum Header {
    Incomplete,
    Invalid,
    Scalar { len: usize },
    Container { header: usize, children: u64 },
}

impl FrameScanner {
    /// Continues the scan over `bytes`, which must start with the same prefix
    /// as on the previous call.
    ///
    /// Returns `true` once `bytes` holds a complete value, or once the prefix
    /// is malformed so that decoding it reports the error. Stays `true` until
    /// [`FrameScanner::reset`].
    pub fn advance(&mut self, bytes: &[u8]) -> bool {
        while !self.ready {
            if self.open.len() > MAX_DEPTH {
                self.ready = true;
                break;
            }
            let item = bytes.get(self.offset..).unwrap_or_default();
            match header(item) {
                Header::Incomplete => return false,
                Header::Invalid => self.ready = true,
                Header::Scalar { len } => {
                    if item.len() < len {
                        return false;
                    }
                    self.offset += len;
                    self.ready = self.finish_item();
                }
                Header::Container { header, children } => {
                    self.offset += header;
                    if children == 0 {
                        self.ready = self.finish_item();
                    } else {
                        self.open.push(children);
                    }
                }
            }
        }
        true
    }

    /// Forgets the scan so the next value can start from offset zero.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.open.clear();
        self.ready = false;
    }

    /// Bytes walked so far.
    #[must_use]
    pub const fn scanned(&self) -> usize {
        self.offset
    }

    fn finish_item(&mut self) -> bool {
        while let Some(left) = self.open.last_mut() {
            *left = left.saturating_sub(1);
            if *left > 0 {
                return false;
            }
            self.open.pop();
        }
        true
    }
}

fn header(item: &[u8]) -> Header {
    let Some(&tag) = item.first() else {
        return Header::Incomplete;
    };
    match Marker::from_u8(tag) {
        Marker::Null | Marker::True | Marker::False | Marker::FixPos(_) | Marker::FixNeg(_) => {
            Header::Scalar { len: 1 }
        }
        Marker::U8 | Marker::I8 => Header::Scalar { len: 2 },
        Marker::U16 | Marker::I16 => Header::Scalar { len: 3 },
        Marker::U32 | Marker::I32 | Marker::F32 => Header::Scalar { len: 5 },
        Marker::U64 | Marker::I64 | Marker::F64 => Header::Scalar { len: 9 },
        Marker::FixStr(len) => payload(1, u64::from(len)),
        Marker::Str8 | Marker::Bin8 => sized(item, 1, 0),
        Marker::Str16 | Marker::Bin16 => sized(item, 2, 0),
        Marker::Str32 | Marker::Bin32 => sized(item, 4, 0),
        Marker::FixArray(count) => Header::Container {
            header: 1,
            children: u64::from(count),
        },
        Marker::Array16 => counted(item, 2, 1),
        Marker::Array32 => counted(item, 4, 1),
        Marker::FixMap(count) => Header::Container {
            header: 1,
            children: u64::from(count) * 2,
        },
        Marker::Map16 => counted(item, 2, 2),
        Marker::Map32 => counted(item, 4, 2),
        Marker::FixExt1 => payload(2, 1),
        Marker::FixExt2 => payload(2, 2),
        Marker::FixExt4 => payload(2, 4),
        Marker::FixExt8 => payload(2, 8),
        Marker::FixExt16 => payload(2, 16),
        Marker::Ext8 => sized(item, 1, 1),
        Marker::Ext16 => sized(item, 2, 1),
        Marker::Ext32 => sized(item, 4, 1),
        Marker::Reserved => Header::Invalid,
    }
}

/// Big-endian length field of `width` bytes following the marker.
fn declared(item: &[u8], width: usize) -> Option<u64> {
    let field = item.get(1..=width)?;
    Some(
        field
            .iter()
            .fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte)),
    )
}

fn sized(item: &[u8], width: usize, extra: usize) -> Header {
    declared(item, width).map_or(Header::Incomplete, |len| payload(1 + width + extra, len))
}

fn payload(header: usize, len: u64) -> Header {
    if len > MAX_DECLARED_LEN {
        return Header::Invalid;
    }
    usize::try_from(len).map_or(Header::Invalid, |body| Header::Scalar { len: header + body })
}

fn counted(item: &[u8], width: usize, per_entry: u64) -> Header {
    match declared(item, width) {
        None => Header::Incomplete,
        Some(count) if count > MAX_DECLARED_LEN => Header::Invalid,
        Some(count) => Header::Container {
            header: 1 + width,
            children: count * per_entry,
        },
    }
}
