//! Minimal EXIF reader for the capture timestamp of an input image.
//!
//! Only walks far enough into the TIFF structure to find
//! `DateTimeOriginal` (tag 36867) inside the Exif sub-IFD. Any structural
//! problem yields `None`; callers treat the timestamp as best-effort.

use chrono::NaiveDateTime;

/// Optional APP1 prefix some decoders leave in front of the TIFF header.
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// IFD0 tag pointing at the Exif sub-IFD.
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;

/// `DateTimeOriginal`.
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

/// TIFF field type for NUL-terminated ASCII.
const TYPE_ASCII: u16 = 2;

const ENTRY_LEN: usize = 12;

/// EXIF date format, e.g. `2023:06:01 12:30:45`.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

struct Tiff<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> Tiff<'a> {
    fn parse(raw: &'a [u8]) -> Option<Self> {
        let data = raw.strip_prefix(EXIF_PREFIX).unwrap_or(raw);
        let order = match data.get(0..2)? {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return None,
        };
        let tiff = Self { data, order };
        (tiff.u16_at(2)? == 42).then_some(tiff)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(offset..offset + 2)?.try_into().ok()?;
        Some(match self.order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    fn first_ifd(&self) -> Option<usize> {
        self.u32_at(4).map(|o| o as usize)
    }

    /// Offset of the entry for `tag` in the IFD at `ifd`.
    fn find_entry(&self, ifd: usize, tag: u16) -> Option<usize> {
        let count = self.u16_at(ifd)? as usize;
        (0..count)
            .map(|i| ifd + 2 + i * ENTRY_LEN)
            .find(|&entry| self.u16_at(entry) == Some(tag))
    }

    fn ascii_value(&self, entry: usize) -> Option<&'a str> {
        if self.u16_at(entry + 2)? != TYPE_ASCII {
            return None;
        }
        let count = self.u32_at(entry + 4)? as usize;
        let start = if count <= 4 {
            entry + 8
        } else {
            self.u32_at(entry + 8)? as usize
        };
        let bytes = self.data.get(start..start.checked_add(count)?)?;
        let text = bytes.split(|b| *b == 0).next()?;
        std::str::from_utf8(text).ok()
    }
}

/// Extract `DateTimeOriginal` from a raw EXIF block.
pub fn date_time_original(raw: &[u8]) -> Option<NaiveDateTime> {
    let tiff = Tiff::parse(raw)?;
    let ifd0 = tiff.first_ifd()?;
    let pointer = tiff.find_entry(ifd0, TAG_EXIF_IFD_POINTER)?;
    let exif_ifd = tiff.u32_at(pointer + 8)? as usize;
    let entry = tiff.find_entry(exif_ifd, TAG_DATE_TIME_ORIGINAL)?;
    let text = tiff.ascii_value(entry)?;
    NaiveDateTime::parse_from_str(text.trim(), EXIF_DATE_FORMAT).ok()
}
