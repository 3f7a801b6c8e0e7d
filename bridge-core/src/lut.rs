//! Precomputed stick lookup tables.
//!
//! The last correction stage routes the stick sample through an inverse
//! table: for a desired game-side coordinate it yields the raw value whose
//! forward-mapped image is that coordinate. The forward model — what the
//! game itself does to a stick sample — is the octagon clamp followed by
//! the 4/5 linear scale; the inverse is derived from it by scanning, so the
//! `inverse ∘ forward = identity` law holds by construction wherever the
//! forward map covers a cell.
//!
//! At 2 × 64 KiB per table pair these live in statics, zero-initialized at
//! link time and filled once during startup.

use crate::stages::{linear_scale_point, octagon_clamp_point};

/// A 256×256 table pair mapping a stick sample to a corrected sample.
pub struct StickLut {
    x: [[u8; 256]; 256],
    y: [[u8; 256]; 256],
}

impl StickLut {
    /// Zero-filled table; meaningful only as static initializer before one
    /// of the `fill_*` methods runs.
    pub const ZEROED: Self = Self {
        x: [[0; 256]; 256],
        y: [[0; 256]; 256],
    };

    /// Look up the mapped value for a stick sample.
    #[inline]
    #[must_use]
    pub fn lookup(&self, x: u8, y: u8) -> (u8, u8) {
        (self.x[x as usize][y as usize], self.y[x as usize][y as usize])
    }

    /// Every sample maps to itself.
    pub fn fill_identity(&mut self) {
        for x in 0..=255u8 {
            for y in 0..=255u8 {
                self.x[x as usize][y as usize] = x;
                self.y[x as usize][y as usize] = y;
            }
        }
    }

    /// Fill with the forward model: octagon clamp then 4/5 linear scale.
    pub fn fill_forward_model(&mut self) {
        for x in 0..=255u8 {
            for y in 0..=255u8 {
                let (cx, cy) = octagon_clamp_point(x, y);
                let (fx, fy) = linear_scale_point(cx, cy);
                self.x[x as usize][y as usize] = fx;
                self.y[x as usize][y as usize] = fy;
            }
        }
    }

    /// Derive the inverse of a forward table by scanning its image.
    ///
    /// Cells the forward map never produces keep the identity mapping, so a
    /// lookup outside the covered region degrades to a pass-through rather
    /// than to garbage.
    pub fn fill_inverse_of(&mut self, forward: &StickLut) {
        self.fill_identity();
        for x in 0..=255u8 {
            for y in 0..=255u8 {
                let (fx, fy) = forward.lookup(x, y);
                self.x[fx as usize][fy as usize] = x;
                self.y[fx as usize][fy as usize] = y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::boxed::Box;

    fn forward_and_inverse() -> (Box<StickLut>, Box<StickLut>) {
        let mut forward = Box::new(StickLut::ZEROED);
        forward.fill_forward_model();
        let mut inverse = Box::new(StickLut::ZEROED);
        inverse.fill_inverse_of(&forward);
        (forward, inverse)
    }

    #[test]
    fn test_identity_lookup() {
        let mut lut = Box::new(StickLut::ZEROED);
        lut.fill_identity();
        assert_eq!(lut.lookup(0, 0), (0, 0));
        assert_eq!(lut.lookup(128, 128), (128, 128));
        assert_eq!(lut.lookup(255, 17), (255, 17));
    }

    #[test]
    fn test_forward_model_center_fixed() {
        let mut forward = Box::new(StickLut::ZEROED);
        forward.fill_forward_model();
        assert_eq!(forward.lookup(128, 128), (128, 128));
    }

    #[test]
    fn test_inverse_undoes_forward_on_image() {
        let (forward, inverse) = forward_and_inverse();
        // For every sample, the inverse of its image forward-maps back onto
        // the same image point.
        for x in (0..=255u8).step_by(5) {
            for y in (0..=255u8).step_by(5) {
                let (fx, fy) = forward.lookup(x, y);
                let (ix, iy) = inverse.lookup(fx, fy);
                assert_eq!(
                    forward.lookup(ix, iy),
                    (fx, fy),
                    "forward∘inverse not identity at image of ({x},{y})"
                );
            }
        }
    }

    #[test]
    fn test_uncovered_cells_pass_through() {
        let (forward, inverse) = forward_and_inverse();
        // (0, 128) scales to (26, 128); anything left of that is outside the
        // forward image and must map to itself.
        let (fx, _) = forward.lookup(0, 128);
        assert_eq!(fx, 26);
        assert_eq!(inverse.lookup(5, 128), (5, 128));
    }
}
