//! Magic-byte registry
//!
//! Maps a normalized MIME type to the byte sequences a genuine file of that
//! type starts with. Types without an entry have no reliable signature.

const JPEG: &[&[u8]] = &[&[0xFF, 0xD8, 0xFF]];
const PNG: &[&[u8]] = &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]];
const GIF: &[&[u8]] = &[b"GIF87a", b"GIF89a"];
const WEBP: &[&[u8]] = &[b"RIFF"];
const TIFF: &[&[u8]] = &[b"II*\0", b"MM\0*"];
const PDF: &[&[u8]] = &[b"%PDF"];
/// OLE2 compound document (legacy Office).
const OLE2: &[&[u8]] = &[&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]];
/// ZIP container (OOXML).
const ZIP: &[&[u8]] = &[b"PK\x03\x04"];
const PSD: &[&[u8]] = &[b"8BPS"];
const POSTSCRIPT: &[&[u8]] = &[b"%!PS"];
/// Illustrator files are saved either PDF-compatible or as EPS.
const ILLUSTRATOR: &[&[u8]] = &[b"%PDF", b"%!PS"];

const STANDARD: &[(&str, &[&[u8]])] = &[
    ("image/jpeg", JPEG),
    ("image/png", PNG),
    ("image/gif", GIF),
    ("image/webp", WEBP),
    ("image/tiff", TIFF),
    ("application/pdf", PDF),
    ("application/msword", OLE2),
    ("application/vnd.ms-excel", OLE2),
    ("application/vnd.ms-powerpoint", OLE2),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ZIP,
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ZIP,
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ZIP,
    ),
    ("image/vnd.adobe.photoshop", PSD),
    ("application/postscript", POSTSCRIPT),
    ("application/illustrator", ILLUSTRATOR),
];

/// Static MIME type → signature registry.
#[derive(Debug, Clone, Copy)]
pub struct SignatureTable {
    entries: &'static [(&'static str, &'static [&'static [u8]])],
}

impl SignatureTable {
    /// The built-in table covering every allow-listed type that has a signature.
    pub const fn standard() -> Self {
        Self { entries: STANDARD }
    }

    /// Candidate signatures for a normalized MIME type, if any are registered.
    pub fn lookup(&self, mime_type: &str) -> Option<&'static [&'static [u8]]> {
        self.entries
            .iter()
            .find(|(mime, _)| *mime == mime_type)
            .map(|(_, signatures)| *signatures)
    }

    /// `None` when the type has no entry, otherwise whether any candidate prefixes `data`.
    pub fn matches(&self, mime_type: &str, data: &[u8]) -> Option<bool> {
        self.lookup(mime_type)
            .map(|signatures| signatures.iter().any(|sig| data.starts_with(sig)))
    }

    /// Longest registered signature; prefixes shorter than this may fail to match.
    pub fn max_signature_len(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|(_, signatures)| signatures.iter())
            .map(|sig| sig.len())
            .max()
            .unwrap_or(0)
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::standard()
    }
}
