use std::io::{self, BufRead, Read};
use std::path::Path;

/// Compression wrapped around the tar stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl Compression {
    /// Map the `is_compressed` flag used by callers onto a codec.
    pub fn from_flag(compressed: bool) -> Self {
        if compressed { Self::Gzip } else { Self::None }
    }

    pub fn is_compressed(self) -> bool {
        self != Self::None
    }

    /// Detect the codec from the first bytes of the stream.
    ///
    /// Returns `None` when the bytes are neither gzip nor a ustar header.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            [0x1F, 0x8B, ..] => Some(Self::Gzip),
            _ if is_tar_header(data) => Some(Self::None),
            _ => None,
        }
    }

    /// Guess the codec from a file name.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::Gzip)
        } else if name.ends_with(".tar") {
            Some(Self::None)
        } else {
            None
        }
    }

    /// Wrap `reader` in the matching decompression filter.
    pub fn decoder<R: Read>(self, reader: R) -> Decoder<R> {
        match self {
            Self::None => Decoder::Passthrough(reader),
            Self::Gzip => Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(reader))),
        }
    }
}

fn is_tar_header(data: &[u8]) -> bool {
    // Both POSIX "ustar\0" and old GNU "ustar " carry the same prefix.
    data.len() >= 262 && data[257..262] == *b"ustar"
}

/// Peek at the start of a buffered stream without consuming it.
pub fn detect_from_reader<R: BufRead>(reader: &mut R) -> io::Result<Option<Compression>> {
    Ok(Compression::detect(reader.fill_buf()?))
}

/// Decompression filter applied ahead of tar parsing.
#[derive(Debug)]
pub enum Decoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
        }
    }
}
