/// The block-compressed formats this crate encodes and decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// RGB with optional 1-bit punch-through alpha. 8 bytes per block.
    Bc1,
    /// RGB plus explicit 4-bit alpha. 16 bytes per block.
    Bc2,
    /// RGB plus interpolated 8-value alpha. 16 bytes per block.
    Bc3,
    /// One interpolated channel (R). 8 bytes per block.
    Bc4,
    /// Two interpolated channels (R and G). 16 bytes per block.
    Bc5,
}

impl Format {
    /// The size of one encoded 4x4 block in bytes.
    pub const fn block_size(self) -> usize {
        match self {
            Format::Bc1 | Format::Bc4 => 8,
            Format::Bc2 | Format::Bc3 | Format::Bc5 => 16,
        }
    }

    /// Whether the format carries an RGB color block.
    pub(crate) const fn has_color(self) -> bool {
        matches!(self, Format::Bc1 | Format::Bc2 | Format::Bc3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sizes() {
        assert_eq!(Format::Bc1.block_size(), 8);
        assert_eq!(Format::Bc2.block_size(), 16);
        assert_eq!(Format::Bc3.block_size(), 16);
        assert_eq!(Format::Bc4.block_size(), 8);
        assert_eq!(Format::Bc5.block_size(), 16);
    }
}
