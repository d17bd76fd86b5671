// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Visual masker — paints opaque rectangles over the OCR tokens the detection
// layer marked as sensitive.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use medicloak_core::types::{MaskedRegion, RedactionResult, SensitiveSubstringSet, Token};
use medicloak_detect::{Degradations, Redactor};
use tracing::{debug, instrument};

/// Applies token decisions to page images.
pub struct VisualMasker<'a> {
    redactor: &'a Redactor,
    colour: Rgb<u8>,
}

impl<'a> VisualMasker<'a> {
    /// Uses the mask colour from the redactor's configuration.
    pub fn new(redactor: &'a Redactor) -> Self {
        Self {
            redactor,
            colour: Rgb(redactor.config().mask_colour),
        }
    }

    /// Which tokens to cover, without touching any image.
    pub fn mask_visual(
        &self,
        tokens: &[Token],
        sensitive: &SensitiveSubstringSet,
        degradations: &mut Degradations,
    ) -> RedactionResult {
        self.redactor.mask_tokens(tokens, sensitive, degradations)
    }

    /// Cover every sensitive token of one page.
    ///
    /// `tokens` must all belong to the page in `image`; the returned regions
    /// are the ones actually painted.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), tokens = tokens.len()))]
    pub fn mask_page(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
        sensitive: &SensitiveSubstringSet,
        degradations: &mut Degradations,
    ) -> (DynamicImage, Vec<MaskedRegion>) {
        let result = self.mask_visual(tokens, sensitive, degradations);
        let mut canvas = image.to_rgb8();
        let painted = self.paint(&mut canvas, result.masked_regions);
        debug!(painted = painted.len(), "page masked");
        (DynamicImage::ImageRgb8(canvas), painted)
    }

    /// Fill each region, clipped to the canvas. Regions with no visible area
    /// are dropped.
    pub fn paint(&self, canvas: &mut RgbImage, regions: Vec<MaskedRegion>) -> Vec<MaskedRegion> {
        let (width, height) = canvas.dimensions();
        let mut painted = Vec::with_capacity(regions.len());
        for region in regions {
            if let Some(rect) = clip(&region, width, height) {
                draw_filled_rect_mut(&mut *canvas, rect, self.colour);
                painted.push(region);
            }
        }
        painted
    }
}

/// The part of a region's box that lies on a `width` x `height` canvas.
fn clip(region: &MaskedRegion, width: u32, height: u32) -> Option<Rect> {
    let bbox = region.bounding_box;
    if bbox.is_empty() {
        return None;
    }
    let left = bbox.left.max(0);
    let top = bbox.top.max(0);
    let right = bbox.right().min(i32::try_from(width).unwrap_or(i32::MAX));
    let bottom = bbox.bottom().min(i32::try_from(height).unwrap_or(i32::MAX));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32))
}
