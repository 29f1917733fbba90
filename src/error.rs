/// Errors raised while building the per-level catalogs.
/// Per-frame updates never fail; they degrade instead.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// I/O error while decoding lump bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lump's byte length is not a multiple of its record size.
    #[error("Malformed {lump} lump: {len} bytes is not a multiple of {record_size}")]
    LumpSize {
        lump: &'static str,
        len: usize,
        record_size: usize,
    },

    /// A leaf references ambient samples past the end of the sample array.
    #[error("Leaf {leaf} references ambient samples {first}..{end} but only {available} exist")]
    AmbientRange {
        leaf: usize,
        first: usize,
        end: usize,
        available: usize,
    },

    /// The leaf ambient index disagrees with the number of leaves.
    #[error("Ambient index has {index_len} entries for {leaf_count} leaves")]
    AmbientIndexLength { index_len: usize, leaf_count: usize },

    /// A cubemap's face size cannot fit in the texel data.
    #[error("Cubemap {cubemap}: face size {size} exceeds the {available} available texels")]
    CubemapSize {
        cubemap: usize,
        size: i32,
        available: usize,
    },

    /// A cubemap face points outside the texel data.
    #[error("Cubemap {cubemap} face {face}: texels {offset}..{end} out of range ({available} available)")]
    CubemapFace {
        cubemap: usize,
        face: usize,
        offset: usize,
        end: usize,
        available: usize,
    },
}
