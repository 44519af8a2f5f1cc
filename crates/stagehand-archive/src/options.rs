use crate::format::Compression;

/// Size of the intermediate buffer used to copy entry contents.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnpackOptions {
    pub compression: Compression,
    pub strip_components: usize,
    pub buffer_size: usize,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            strip_components: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl UnpackOptions {
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn compressed(self, compressed: bool) -> Self {
        self.compression(Compression::from_flag(compressed))
    }

    pub fn strip_components(mut self, n: usize) -> Self {
        self.strip_components = n;
        self
    }

    /// Zero is bumped to one byte.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }
}
