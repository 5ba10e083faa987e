//! Texture eligibility and packing layout of a tensor shape.
//!
//! Textures are built from 5-D tensors whose innermost dimension is a
//! 4-wide (RGBA) vector. The remaining four dimensions are folded into a
//! 2-D image; which dimensions go to which axis is the packing layout.
//! Both image extents must stay below the device's spatial limit, and among
//! fitting layouts the most square one wins.

use std::fmt;

use texscope_ir::{
    DEFAULT_TEXTURE_SPATIAL_LIMIT, Dimension, GLOBAL, GLOBAL_TEXTURE, TensorShape, VirtualDevice,
};

/// Rank of a texture-backed tensor.
pub const TEXTURE_RANK: usize = 5;

/// Extent of the innermost (vector) dimension of a texture-backed tensor.
pub const TEXTURE_LANES: u32 = 4;

/// How the four outer dimensions `a0..a3` fold into a 2-D image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexturePacking {
    /// `(a0 * a1 * a2) x a3`.
    Flat,
    /// `(a0 * a1) x (a2 * a3)`.
    Nhwc,
    /// `a0 x (a1 * a2 * a3)`.
    Weight,
}

impl TexturePacking {
    /// Candidates in tie-break order.
    pub const ALL: [Self; 3] = [Self::Flat, Self::Nhwc, Self::Weight];

    /// Suffix appended to the texture scope; empty for [`Self::Flat`].
    pub fn tag(self) -> &'static str {
        match self {
            Self::Flat => "",
            Self::Nhwc => "nhwc",
            Self::Weight => "weight",
        }
    }

    /// The full memory scope string for this packing.
    pub fn scope(self) -> String {
        match self.tag() {
            "" => GLOBAL_TEXTURE.to_owned(),
            tag => format!("{GLOBAL_TEXTURE}-{tag}"),
        }
    }

    /// Image extents for outer dimensions `dims`, `None` on overflow.
    fn extents(self, dims: [u64; 4]) -> Option<(u64, u64)> {
        let [a0, a1, a2, a3] = dims;
        match self {
            Self::Flat => Some((a0.checked_mul(a1)?.checked_mul(a2)?, a3)),
            Self::Nhwc => Some((a0.checked_mul(a1)?, a2.checked_mul(a3)?)),
            Self::Weight => Some((a0, a1.checked_mul(a2)?.checked_mul(a3)?)),
        }
    }
}

impl fmt::Display for TexturePacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope())
    }
}

/// Every packing whose extents both fit under `limit`, with its score
/// (the absolute difference of the two extents), in tie-break order.
pub fn packing_candidates(dims: [u32; 4], limit: i64) -> Vec<(TexturePacking, u64)> {
    let Ok(limit) = u64::try_from(limit) else {
        return Vec::new();
    };
    let dims = dims.map(u64::from);
    TexturePacking::ALL
        .into_iter()
        .filter_map(|packing| {
            let (left, right) = packing.extents(dims)?;
            (left < limit && right < limit).then(|| (packing, left.abs_diff(right)))
        })
        .collect()
}

/// The fitting packing with the smallest score; earlier candidates win ties.
pub fn best_packing(dims: [u32; 4], limit: i64) -> Option<TexturePacking> {
    let mut best: Option<(TexturePacking, u64)> = None;
    for (packing, score) in packing_candidates(dims, limit) {
        match best {
            Some((_, best_score)) if best_score <= score => {}
            _ => best = Some((packing, score)),
        }
    }
    best.map(|(packing, _)| packing)
}

/// Memory scope that fits a tensor of `shape` placed on `vd`.
///
/// Returns `"global"` unless the placement is constrained and the shape is
/// a static 5-D tensor with 4 lanes that fits one of the packings.
pub fn texture_scope(shape: &TensorShape, vd: &VirtualDevice) -> String {
    if vd.is_fully_unconstrained() || shape.rank() != TEXTURE_RANK {
        return GLOBAL.to_owned();
    }
    let Some(dims) = shape.static_dims() else {
        return GLOBAL.to_owned();
    };
    let [a0, a1, a2, a3, TEXTURE_LANES] = dims[..] else {
        return GLOBAL.to_owned();
    };
    let limit = vd
        .target
        .as_ref()
        .map_or(DEFAULT_TEXTURE_SPATIAL_LIMIT, |t| t.texture_spatial_limit());
    best_packing([a0, a1, a2, a3], limit).map_or_else(|| GLOBAL.to_owned(), TexturePacking::scope)
}

/// The texture scope of `shape` when it can be stored as RGBA texels.
pub fn rgba_vectorizable_scope(shape: &TensorShape, vd: &VirtualDevice) -> Option<String> {
    let scope = texture_scope(shape, vd);
    let lanes_fit = shape.last() == Some(&Dimension::Fixed(TEXTURE_LANES));
    (scope != GLOBAL && lanes_fit).then_some(scope)
}
