//! Tags embedded into encoded files.

/// Vendor string written into Vorbis comments.
pub(crate) const VENDOR: &str = concat!("lustre ", env!("CARGO_PKG_VERSION"));

/// Optional descriptive tags.
///
/// Each container gets them in its own form: a RIFF `LIST/INFO` chunk for
/// WAV, a Vorbis comment for FLAC and Ogg, and an ID3v2.3 tag for MP3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Track title.
    pub title: Option<String>,
    /// Performing artist.
    pub artist: Option<String>,
    /// Album or product.
    pub album: Option<String>,
    /// Genre.
    pub genre: Option<String>,
    /// Release year or date.
    pub year: Option<String>,
}

/// A tag field, named independently of any container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Title.
    Title,
    /// Artist.
    Artist,
    /// Album.
    Album,
    /// Genre.
    Genre,
    /// Year.
    Year,
}

impl Tag {
    /// RIFF INFO chunk id.
    pub fn riff_id(self) -> &'static [u8; 4] {
        match self {
            Tag::Title => b"INAM",
            Tag::Artist => b"IART",
            Tag::Album => b"IPRD",
            Tag::Genre => b"IGNR",
            Tag::Year => b"ICRD",
        }
    }

    /// Vorbis comment field name.
    pub fn vorbis_key(self) -> &'static str {
        match self {
            Tag::Title => "TITLE",
            Tag::Artist => "ARTIST",
            Tag::Album => "ALBUM",
            Tag::Genre => "GENRE",
            Tag::Year => "DATE",
        }
    }

    /// ID3v2.3 text frame id.
    pub fn id3_frame(self) -> &'static [u8; 4] {
        match self {
            Tag::Title => b"TIT2",
            Tag::Artist => b"TPE1",
            Tag::Album => b"TALB",
            Tag::Genre => b"TCON",
            Tag::Year => b"TYER",
        }
    }
}

impl Metadata {
    /// Metadata with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// True when no tag is set.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Set tags with non-empty values, in a fixed order.
    pub fn entries(&self) -> Vec<(Tag, &str)> {
        [
            (Tag::Title, &self.title),
            (Tag::Artist, &self.artist),
            (Tag::Album, &self.album),
            (Tag::Genre, &self.genre),
            (Tag::Year, &self.year),
        ]
        .into_iter()
        .filter_map(|(tag, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (tag, v))
        })
        .collect()
    }

    /// RIFF `LIST` chunk of type `INFO`, or `None` when there is nothing to
    /// write.
    ///
    /// Values are NUL-terminated and every sub-chunk is padded to an even
    /// length.
    pub fn riff_info_chunk(&self) -> Option<Vec<u8>> {
        let entries = self.entries();
        if entries.is_empty() {
            return None;
        }

        let mut body = b"INFO".to_vec();
        for (tag, value) in entries {
            let mut text = value.as_bytes().to_vec();
            text.push(0);
            body.extend_from_slice(tag.riff_id());
            body.extend_from_slice(&(text.len() as u32).to_le_bytes());
            body.extend_from_slice(&text);
            if text.len() % 2 == 1 {
                body.push(0);
            }
        }

        let mut chunk = b"LIST".to_vec();
        chunk.extend_from_slice(&(body.len() as u32).to_le_bytes());
        chunk.extend_from_slice(&body);
        Some(chunk)
    }

    /// `KEY=value` strings for a Vorbis comment block.
    pub fn vorbis_comments(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(tag, value)| format!("{}={}", tag.vorbis_key(), value))
            .collect()
    }

    /// Vorbis comment body: vendor string, then the `KEY=value` entries,
    /// all length-prefixed little-endian.
    ///
    /// This is the payload of a FLAC `VORBIS_COMMENT` block; the Ogg comment
    /// header is the same bytes behind a packet type and framing bit.
    pub fn vorbis_comment_body(&self, vendor: &str) -> Vec<u8> {
        let comments = self.vorbis_comments();
        let mut out = Vec::new();
        out.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        out.extend_from_slice(vendor.as_bytes());
        out.extend_from_slice(&(comments.len() as u32).to_le_bytes());
        for comment in comments {
            out.extend_from_slice(&(comment.len() as u32).to_le_bytes());
            out.extend_from_slice(comment.as_bytes());
        }
        out
    }

    /// ID3v2.3 tag of text frames, or `None` when there is nothing to write.
    ///
    /// ASCII values are stored as ISO-8859-1, anything else as UTF-16 with a
    /// byte order mark.
    pub fn id3v2_tag(&self) -> Option<Vec<u8>> {
        let entries = self.entries();
        if entries.is_empty() {
            return None;
        }

        let mut frames = Vec::new();
        for (tag, value) in entries {
            let mut text = Vec::new();
            if value.is_ascii() {
                text.push(0x00);
                text.extend_from_slice(value.as_bytes());
            } else {
                text.push(0x01);
                text.extend_from_slice(&[0xFF, 0xFE]);
                for unit in value.encode_utf16() {
                    text.extend_from_slice(&unit.to_le_bytes());
                }
            }
            frames.extend_from_slice(tag.id3_frame());
            frames.extend_from_slice(&(text.len() as u32).to_be_bytes());
            frames.extend_from_slice(&[0, 0]);
            frames.extend_from_slice(&text);
        }

        let mut tag = b"ID3".to_vec();
        tag.extend_from_slice(&[3, 0, 0]);
        tag.extend_from_slice(&syncsafe(frames.len() as u32));
        tag.extend_from_slice(&frames);
        Some(tag)
    }
}

/// 28-bit integer spread over four 7-bit bytes.
fn syncsafe(n: u32) -> [u8; 4] {
    [
        ((n >> 21) & 0x7F) as u8,
        ((n >> 14) & 0x7F) as u8,
        ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata {
            title: Some("Night Drive".into()),
            artist: Some("Lumen".into()),
            album: None,
            genre: Some("  ".into()),
            year: Some("2024".into()),
        }
    }

    #[test]
    fn test_entries_skip_blank() {
        let tags: Vec<Tag> = sample().entries().into_iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec![Tag::Title, Tag::Artist, Tag::Year]);
        assert!(Metadata::default().is_empty());
        assert!(!Metadata::titled("x").is_empty());
    }

    #[test]
    fn test_riff_info_layout() {
        let chunk = sample().riff_info_chunk().unwrap();
        assert_eq!(&chunk[0..4], b"LIST");
        let size = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]) as usize;
        assert_eq!(size + 8, chunk.len());
        assert_eq!(&chunk[8..12], b"INFO");

        // "Night Drive\0" is 12 bytes, no pad
        assert_eq!(&chunk[12..16], b"INAM");
        assert_eq!(u32::from_le_bytes([chunk[16], chunk[17], chunk[18], chunk[19]]), 12);
        assert_eq!(&chunk[20..32], b"Night Drive\0");
        // "Lumen\0" is 6 bytes
        assert_eq!(&chunk[32..36], b"IART");
        assert_eq!(&chunk[40..46], b"Lumen\0");
        // "2024\0" is 5 bytes, padded to 6
        assert_eq!(&chunk[46..50], b"ICRD");
        assert_eq!(chunk.len(), 50 + 4 + 6);
        assert_eq!(chunk.len() % 2, 0);

        assert!(Metadata::default().riff_info_chunk().is_none());
    }

    #[test]
    fn test_vorbis_comment_body() {
        let m = sample();
        assert_eq!(
            m.vorbis_comments(),
            vec!["TITLE=Night Drive", "ARTIST=Lumen", "DATE=2024"]
        );
        let body = m.vorbis_comment_body("v1");
        assert_eq!(&body[0..4], &2u32.to_le_bytes());
        assert_eq!(&body[4..6], b"v1");
        assert_eq!(&body[6..10], &3u32.to_le_bytes());
        assert_eq!(&body[10..14], &17u32.to_le_bytes());
        assert_eq!(&body[14..31], b"TITLE=Night Drive");
    }

    #[test]
    fn test_id3v2_layout() {
        let tag = sample().id3v2_tag().unwrap();
        assert_eq!(&tag[0..6], b"ID3\x03\x00\x00");
        assert_eq!(&tag[6..10], &syncsafe((tag.len() - 10) as u32));

        // TIT2, size 12 (encoding byte + 11 chars), two flag bytes
        assert_eq!(&tag[10..14], b"TIT2");
        assert_eq!(&tag[14..18], &12u32.to_be_bytes());
        assert_eq!(tag[20], 0x00);
        assert_eq!(&tag[21..32], b"Night Drive");
        assert_eq!(&tag[32..36], b"TPE1");
        assert!(tag.windows(4).any(|w| w == b"TYER"));

        assert!(Metadata::default().id3v2_tag().is_none());
    }

    #[test]
    fn test_id3v2_non_ascii_is_utf16() {
        let tag = Metadata::titled("Café").id3v2_tag().unwrap();
        // encoding byte, BOM, four UTF-16 units
        assert_eq!(&tag[14..18], &11u32.to_be_bytes());
        assert_eq!(&tag[20..23], &[0x01, 0xFF, 0xFE]);
        assert_eq!(&tag[29..31], &0x00E9u16.to_le_bytes());
    }

    #[test]
    fn test_syncsafe() {
        assert_eq!(syncsafe(0), [0, 0, 0, 0]);
        assert_eq!(syncsafe(127), [0, 0, 0, 127]);
        assert_eq!(syncsafe(128), [0, 0, 1, 0]);
        assert_eq!(syncsafe(0x0FFF_FFFF), [0x7F; 4]);
    }
}
