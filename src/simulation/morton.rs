//! # Morton (Z-order) keys
//!
//! A position is quantized per axis into 21 bits relative to the system
//! [`Bounds`], and the three quantized values are bit-interleaved into one
//! 63-bit key:
//!
//! ```text
//! bit:   62 61 60  59 58 57  ...  2  1  0
//!         z  y  x   z  y  x  ...  z  y  x
//!        \_depth 0_/\_depth 1_/    \_depth 20_/
//! ```
//!
//! Each 3-bit group ("triplet") selects one octant at one tree depth, read
//! from the most significant end: bit 0 of the triplet is the +x half, bit 1
//! the +y half, bit 2 the +z half. Sorting bodies by key therefore lays them
//! out depth-first through the octree, and every subtree is a contiguous run.
//! Bit 63 is never set.

use super::bounds::Bounds;
use super::states::NVec3;

/// Bits per axis: 64 / 3 rounded down
pub const MORTON_BITS: u32 = 21;

/// Largest quantized axis value, `2^21 - 1`
pub const MORTON_SCALE: u32 = (1 << MORTON_BITS) - 1;

/// Deepest tree level; a node at this depth has consumed every triplet
pub const MAX_DEPTH: usize = MORTON_BITS as usize;

/// Interleaved 63-bit Morton key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MortonKey(pub u64);

impl MortonKey {
    /// Octant (0..8) selected by this key at tree depth `depth` (root = 0)
    #[inline]
    pub fn octant(self, depth: usize) -> usize {
        debug_assert!(depth < MAX_DEPTH, "depth {depth} has no triplet");
        let shift = 3 * (MAX_DEPTH - 1 - depth);
        ((self.0 >> shift) & 0b111) as usize
    }

    /// Per-axis index of the cell holding this key at tree depth `depth`,
    /// i.e. the first `depth` bits of each quantized coordinate
    #[inline]
    pub fn cell(self, depth: usize) -> [u32; 3] {
        debug_assert!(depth <= MAX_DEPTH);
        let shift = MAX_DEPTH - depth;
        decode(self).map(|q| q >> shift)
    }
}

/// A coordinate that cannot be quantized
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("non-finite {axis} coordinate ({value})")]
pub struct NonFinite {
    pub axis: char,
    pub value: f64,
}

/// Map `value` linearly from `[lo, hi]` onto `[0, 2^21 - 1]`
///
/// Values outside the range clamp to the nearest end. When `lo == hi` the
/// whole axis collapses onto 0.
#[inline]
pub fn scale(value: f64, lo: f64, hi: f64) -> u32 {
    let extent = hi - lo;
    let frac = if extent > 0.0 {
        ((value - lo) / extent).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (frac * f64::from(MORTON_SCALE)) as u32
}

/// Spread the low 21 bits of `v` so bit `i` lands on bit `3 * i`
///
/// Each step doubles the number of groups and halves their spacing
/// (32, 16, 8, 4, 2) until every bit sits two zeros apart.
#[inline]
pub fn expand(v: u32) -> u64 {
    let mut x = u64::from(v) & 0x1f_ffff;
    x = (x | x << 32) & 0x001f_0000_0000_ffff;
    x = (x | x << 16) & 0x001f_0000_ff00_00ff;
    x = (x | x << 8) & 0x100f_00f0_0f00_f00f;
    x = (x | x << 4) & 0x10c3_0c30_c30c_30c3;
    x = (x | x << 2) & 0x1249_2492_4924_9249;
    x
}

/// Inverse of [`expand`]: gather every third bit starting at bit 0
#[inline]
pub fn compact(x: u64) -> u32 {
    let mut x = x & 0x1249_2492_4924_9249;
    x = (x | x >> 2) & 0x10c3_0c30_c30c_30c3;
    x = (x | x >> 4) & 0x100f_00f0_0f00_f00f;
    x = (x | x >> 8) & 0x001f_0000_ff00_00ff;
    x = (x | x >> 16) & 0x001f_0000_0000_ffff;
    x = (x | x >> 32) & 0x1f_ffff;
    x as u32
}

/// Quantize and interleave one position
pub fn encode(position: &NVec3, bounds: &Bounds) -> Result<MortonKey, NonFinite> {
    let mut dilated = [0u64; 3];
    for (axis, name) in ['x', 'y', 'z'].into_iter().enumerate() {
        let value = position[axis];
        if !value.is_finite() {
            return Err(NonFinite { axis: name, value });
        }
        let (lo, hi) = bounds.axis(axis);
        dilated[axis] = expand(scale(value, lo, hi));
    }
    Ok(MortonKey(dilated[0] | (dilated[1] << 1) | (dilated[2] << 2)))
}

/// Quantized `[x, y, z]` stored in a key
pub fn decode(key: MortonKey) -> [u32; 3] {
    [compact(key.0), compact(key.0 >> 1), compact(key.0 >> 2)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_naive(v: u32) -> u64 {
        let mut out = 0u64;
        for i in 0..MORTON_BITS {
            out |= ((u64::from(v) >> i) & 1) << (3 * i);
        }
        out
    }

    fn cube(half: f64) -> Bounds {
        Bounds::new(NVec3::new(-half, -half, -half), NVec3::new(half, half, half))
    }

    #[test]
    fn expand_matches_bit_loop() {
        for v in (0..=MORTON_SCALE).step_by(997).chain([0, 1, 2, 0x15_5555, 0x0a_aaaa, MORTON_SCALE]) {
            assert_eq!(expand(v), expand_naive(v), "v = {v:#x}");
        }
    }

    #[test]
    fn compact_recovers_every_21_bit_value() {
        for v in 0..=MORTON_SCALE {
            assert_eq!(compact(expand(v)), v);
        }
    }

    #[test]
    fn expand_ignores_high_bits() {
        assert_eq!(expand(1 << 21), 0);
        assert_eq!(expand(u32::MAX), expand(MORTON_SCALE));
    }

    #[test]
    fn scale_clamps_and_handles_degenerate_axis() {
        assert_eq!(scale(-1000.0, -1000.0, 1000.0), 0);
        assert_eq!(scale(1000.0, -1000.0, 1000.0), MORTON_SCALE);
        assert_eq!(scale(-5000.0, -1000.0, 1000.0), 0);
        assert_eq!(scale(5000.0, -1000.0, 1000.0), MORTON_SCALE);
        assert_eq!(scale(3.0, 3.0, 3.0), 0);
        assert_eq!(scale(0.0, -1.0, 1.0), MORTON_SCALE / 2);
    }

    #[test]
    fn extreme_corners() {
        let b = cube(1000.0);
        assert_eq!(encode(&NVec3::new(-1000.0, -1000.0, -1000.0), &b), Ok(MortonKey(0)));
        assert_eq!(
            encode(&NVec3::new(1000.0, 1000.0, 1000.0), &b),
            Ok(MortonKey((1u64 << 63) - 1))
        );
    }

    #[test]
    fn corners_land_in_distinct_top_octants() {
        let b = cube(1000.0);
        let mut seen = [false; 8];
        for octant in 0..8 {
            let sign = |bit: usize| if octant & bit != 0 { 1000.0 } else { -1000.0 };
            let p = NVec3::new(sign(1), sign(2), sign(4));
            let key = encode(&p, &b).unwrap();
            assert_eq!(key.octant(0), octant, "corner {p:?}");
            assert_eq!(key.0 >> 60, octant as u64);
            seen[octant] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn cell_is_the_quantized_prefix() {
        let key = MortonKey(expand(0b101 << 18) | expand(MORTON_SCALE) << 1);
        assert_eq!(key.cell(0), [0, 0, 0]);
        assert_eq!(key.cell(1), [1, 1, 0]);
        assert_eq!(key.cell(3), [0b101, 0b111, 0]);
        assert_eq!(key.cell(MAX_DEPTH), decode(key));
    }

    #[test]
    fn octant_reads_triplets_from_the_top() {
        // x = 0b100..0 (only depth-0 bit), z = 0b010..0 (only depth-1 bit)
        let key = MortonKey(expand(1 << 20) | expand(1 << 19) << 2);
        assert_eq!(key.octant(0), 0b001);
        assert_eq!(key.octant(1), 0b100);
        assert_eq!(key.octant(2), 0);
        assert_eq!(key.octant(MAX_DEPTH - 1), 0);
    }

    #[test]
    fn decode_inverts_encode_quantization() {
        let b = cube(1.0);
        let p = NVec3::new(0.25, -0.5, 0.75);
        let key = encode(&p, &b).unwrap();
        let q = decode(key);
        assert_eq!(q, [scale(0.25, -1.0, 1.0), scale(-0.5, -1.0, 1.0), scale(0.75, -1.0, 1.0)]);
    }

    #[test]
    fn non_finite_coordinates_are_reported() {
        let b = cube(1.0);
        assert_eq!(
            encode(&NVec3::new(0.0, f64::INFINITY, 0.0), &b),
            Err(NonFinite { axis: 'y', value: f64::INFINITY })
        );
        let err = encode(&NVec3::new(0.0, 0.0, f64::NAN), &b).unwrap_err();
        assert_eq!(err.axis, 'z');
        assert!(err.value.is_nan());
    }
}
