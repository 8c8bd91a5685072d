//! In-place rewrite of the TIFF comment (ImageDescription) tag.
//!
//! # Rewrite Layout
//!
//! The IFD itself never moves and no other entry is touched:
//!
//! ```text
//! before:  [hdr][IFD 0 ... 270 -> old text ...][pixels][old text]
//! after:   [hdr][IFD 0 ... 270 -> new text ...][pixels][old text][pad][new text]
//! ```
//!
//! The new value is appended and flushed first; the 12-byte (or 20-byte
//! BigTIFF) entry is then overwritten with a single positional write. Until
//! that write lands, the entry still points at the old, intact value, so an
//! interrupted rewrite never leaves a truncated or mismatched tag. Values short
//! enough to live inside the entry are written inline instead of appended.
//!
//! # Reruns
//!
//! The first rewrite of a file orphans the original description. When the
//! committed value already ends the file and is at least as long as the new
//! one, the rewrite compacts instead:
//!
//! ```text
//! 1. [.. 270 -> A][A]              append B, commit   -> [.. 270 -> B][A][B]
//! 2. [.. 270 -> B][A][B]           copy B over A, commit -> [.. 270 -> A'][A'][B]
//! 3. [.. 270 -> A'][A'][B]         truncate            -> [.. 270 -> A'][A']
//! ```
//!
//! Every step leaves the entry pointing at a complete value, and the slot
//! being overwritten is never the committed one. Rerunning with documents of
//! the same length therefore keeps the file size fixed after the first run.
//! A longer document is appended and orphans the previous value.

use tracing::debug;

use crate::error::TiffError;
use crate::io::{RangeReader, RangeWriter};

use super::parser::{Ifd, IfdEntry, TiffHeader};
use super::tags::{FieldType, TiffTag};
use super::values::ValueReader;

/// Where a rewritten comment ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRewrite {
    /// File offset of the rewritten IFD entry
    pub entry_position: u64,

    /// File offset of the new value, `None` when stored inline
    pub value_offset: Option<u64>,

    /// New value length including the NUL terminator
    pub byte_count: u64,

    /// Old value length. Orphaned unless it was inline or reused
    pub previous_byte_count: u64,

    /// The new value took over the old value's slot and the file was trimmed
    pub reused_slot: bool,
}

/// Read the ImageDescription of IFD 0, if the tag is present.
pub async fn read_comment<R: RangeReader>(reader: &R) -> Result<Option<String>, TiffError> {
    let header = TiffHeader::read(reader).await?;
    let ifd = Ifd::read(reader, &header, header.first_ifd_offset).await?;

    match ifd.get_entry_by_tag(TiffTag::ImageDescription) {
        Some(entry) => {
            let value_reader = ValueReader::new(reader, &header);
            Ok(Some(value_reader.read_string(entry).await?))
        }
        None => Ok(None),
    }
}

/// Replace the ImageDescription of IFD 0 with `comment`.
///
/// The tag must already exist; it is rewritten as ASCII regardless of the
/// type it was stored with. A value that does not fit inline is appended, so
/// the first rewrite grows the file by the new document and leaves the old
/// value as unreferenced bytes. Later rewrites reuse the tail slot when the
/// new value fits in it (see the module docs).
///
/// # Errors
/// - `MissingTag` if IFD 0 has no ImageDescription entry
/// - `InvalidTagValue` if `comment` contains a NUL byte
/// - `OffsetOverflow` if a classic TIFF would need an offset past 4 GiB
pub async fn overwrite_comment<W: RangeWriter>(
    file: &W,
    comment: &str,
) -> Result<CommentRewrite, TiffError> {
    if comment.as_bytes().contains(&0) {
        return Err(TiffError::InvalidTagValue {
            tag: TiffTag::ImageDescription.name(),
            message: "comment contains a NUL byte".to_string(),
        });
    }

    let header = TiffHeader::read(file).await?;
    let ifd = Ifd::read(file, &header, header.first_ifd_offset).await?;
    let entry = ifd
        .get_entry_by_tag(TiffTag::ImageDescription)
        .ok_or(TiffError::MissingTag(TiffTag::ImageDescription.name()))?;

    let mut payload = Vec::with_capacity(comment.len() + 1);
    payload.extend_from_slice(comment.as_bytes());
    payload.push(0);
    let byte_count = payload.len() as u64;

    if !header.is_bigtiff && byte_count > u32::MAX as u64 {
        return Err(TiffError::InvalidTagValue {
            tag: TiffTag::ImageDescription.name(),
            message: format!("{} bytes exceeds a classic TIFF count", byte_count),
        });
    }

    if FieldType::Ascii.fits_inline(byte_count, header.is_bigtiff) {
        let mut field = vec![0u8; header.value_offset_size()];
        field[..payload.len()].copy_from_slice(&payload);
        commit_entry(file, &header, entry.position, byte_count, &field).await?;

        debug!(
            file = file.identifier(),
            entry = entry.position,
            bytes = byte_count,
            "rewrote ImageDescription inline"
        );
        return Ok(CommentRewrite {
            entry_position: entry.position,
            value_offset: None,
            byte_count,
            previous_byte_count: entry.count,
            reused_slot: false,
        });
    }

    let tail_slot = reusable_tail_slot(file, &header, entry, byte_count);

    let appended = append_value(file, &header, &payload).await?;
    commit_entry(
        file,
        &header,
        entry.position,
        byte_count,
        &offset_field(&header, appended),
    )
    .await?;

    let value_offset = match tail_slot {
        Some(slot) => {
            // The entry now points at the appended copy, so the old slot is free
            file.write_all_at(slot, &payload).await?;
            file.sync().await?;
            commit_entry(
                file,
                &header,
                entry.position,
                byte_count,
                &offset_field(&header, slot),
            )
            .await?;
            file.truncate(slot + byte_count).await?;
            file.sync().await?;
            slot
        }
        None => appended,
    };

    debug!(
        file = file.identifier(),
        entry = entry.position,
        offset = value_offset,
        bytes = byte_count,
        previous_bytes = entry.count,
        reused_slot = tail_slot.is_some(),
        "rewrote ImageDescription"
    );

    Ok(CommentRewrite {
        entry_position: entry.position,
        value_offset: Some(value_offset),
        byte_count,
        previous_byte_count: entry.count,
        reused_slot: tail_slot.is_some(),
    })
}

/// Offset of the committed value if it ends the file and can hold
/// `byte_count` bytes.
fn reusable_tail_slot<R: RangeReader>(
    file: &R,
    header: &TiffHeader,
    entry: &IfdEntry,
    byte_count: u64,
) -> Option<u64> {
    if entry.is_inline {
        return None;
    }
    let slot = entry.value_offset(header.byte_order);
    let len = entry.value_byte_size()?;
    (len >= byte_count && slot.checked_add(len) == Some(file.size())).then_some(slot)
}

/// Append `payload` on a word boundary and flush it. Returns its offset.
async fn append_value<W: RangeWriter>(
    file: &W,
    header: &TiffHeader,
    payload: &[u8],
) -> Result<u64, TiffError> {
    let pad = (file.size() % 2) as usize;
    let value_offset = file.size() + pad as u64;

    if !header.is_bigtiff && value_offset + payload.len() as u64 > u32::MAX as u64 {
        return Err(TiffError::OffsetOverflow(value_offset));
    }

    let mut block = vec![0u8; pad];
    block.extend_from_slice(payload);
    let written_at = file.append(&block).await?;
    file.sync().await?;

    Ok(written_at + pad as u64)
}

fn offset_field(header: &TiffHeader, offset: u64) -> Vec<u8> {
    if header.is_bigtiff {
        header.byte_order.u64_bytes(offset).to_vec()
    } else {
        header.byte_order.u32_bytes(offset as u32).to_vec()
    }
}

/// Overwrite the ImageDescription entry with one positional write and flush.
async fn commit_entry<W: RangeWriter>(
    file: &W,
    header: &TiffHeader,
    position: u64,
    byte_count: u64,
    value_field: &[u8],
) -> Result<(), TiffError> {
    let byte_order = header.byte_order;
    let mut raw_entry = Vec::with_capacity(header.ifd_entry_size());
    raw_entry.extend_from_slice(&byte_order.u16_bytes(TiffTag::ImageDescription.as_u16()));
    raw_entry.extend_from_slice(&byte_order.u16_bytes(FieldType::Ascii.as_u16()));
    if header.is_bigtiff {
        raw_entry.extend_from_slice(&byte_order.u64_bytes(byte_count));
    } else {
        raw_entry.extend_from_slice(&byte_order.u32_bytes(byte_count as u32));
    }
    raw_entry.extend_from_slice(value_field);

    file.write_all_at(position, &raw_entry).await?;
    file.sync().await?;
    Ok(())
}
