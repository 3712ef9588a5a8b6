/// A basic representation of an image with RGBA pixel data.
/// Each pixel occupies 4 bytes: R, G, B, and A (alpha).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Pixel data stored in a 1D `Vec<u8>`, in RGBA format (4 bytes per pixel).
    pub img_data: Vec<u8>,
    /// The width (in pixels) of the image.
    pub width: usize,
    /// The height (in pixels) of the image.
    pub height: usize,
}

impl Default for Photo {
    /// Creates an empty `Photo` with zero width and height, and no image data.
    fn default() -> Photo {
        Photo {
            img_data: Vec::new(),
            width: 0,
            height: 0,
        }
    }
}

impl Photo {
    /// Creates a `width` × `height` photo with every pixel set to `rgba`.
    ///
    /// # Examples
    /// ```
    /// # use geomosaic::photo::Photo;
    /// let p = Photo::filled(3, 2, [10, 20, 30, 255]);
    /// assert_eq!(p.img_data.len(), 3 * 2 * 4);
    /// assert_eq!(p.get_rgba(2, 1), Some([10, 20, 30, 255]));
    /// assert_eq!(p.get_rgba(3, 0), None);
    /// ```
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Photo {
        Photo {
            img_data: rgba.repeat(width * height),
            width,
            height,
        }
    }

    /// Wraps an existing RGBA buffer, or returns `None` when its length does not
    /// match `width * height * 4`.
    pub fn from_rgba(width: usize, height: usize, img_data: Vec<u8>) -> Option<Photo> {
        if img_data.len() != width * height * 4 {
            return None;
        }
        Some(Photo {
            img_data,
            width,
            height,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the RGBA value at `(x, y)`, or `None` if out of bounds.
    pub fn get_rgba(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y * self.width + x) * 4;
        let px = &self.img_data[index..index + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Writes `rgba` at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set_rgba(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y * self.width + x) * 4;
        self.img_data[index..index + 4].copy_from_slice(&rgba);
    }

    /// Samples the photo at a continuous position with bilinear interpolation.
    ///
    /// Pixel `(i, j)` has its center at `(i + 0.5, j + 0.5)`. Everything outside
    /// the photo is transparent. Color channels are interpolated premultiplied
    /// by alpha so transparent neighbours do not darken edges.
    ///
    /// Returns `[r, g, b, a]` as floats in `0.0..=255.0`.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> [f32; 4] {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = (fx - x0) as f32;
        let ty = (fy - y0) as f32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let mut acc = [0.0f32; 4];
        let taps = [
            (x0, y0, (1.0 - tx) * (1.0 - ty)),
            (x0 + 1, y0, tx * (1.0 - ty)),
            (x0, y0 + 1, (1.0 - tx) * ty),
            (x0 + 1, y0 + 1, tx * ty),
        ];
        for (px, py, weight) in taps {
            if weight == 0.0 || px < 0 || py < 0 {
                continue;
            }
            if let Some([r, g, b, a]) = self.get_rgba(px as usize, py as usize) {
                let alpha = a as f32 / 255.0;
                acc[0] += r as f32 * alpha * weight;
                acc[1] += g as f32 * alpha * weight;
                acc[2] += b as f32 * alpha * weight;
                acc[3] += a as f32 * weight;
            }
        }

        if acc[3] <= 0.0 {
            return [0.0; 4];
        }
        let coverage = acc[3] / 255.0;
        [acc[0] / coverage, acc[1] / coverage, acc[2] / coverage, acc[3]]
    }

    /// Height `get_scaled_proportional` gives a `width` × `height` photo scaled
    /// to `new_width`.
    pub fn proportional_height(width: usize, height: usize, new_width: usize) -> usize {
        let scale_factor = new_width as f32 / width as f32;
        ((height as f32 * scale_factor).round() as usize).max(1)
    }

    /// Produces a new `Photo` scaled proportionally to `new_width`.
    ///
    /// This method preserves the aspect ratio by computing a scale factor and rounding
    /// the new height accordingly. The pixel values in the resulting image are computed
    /// by averaging all corresponding pixels from the original image that fall into
    /// the region mapped by the new pixel.
    ///
    /// Returns `None` if `new_width` is zero or the photo is empty.
    pub fn get_scaled_proportional(&self, new_width: usize) -> Option<Photo> {
        if new_width == 0 || self.is_empty() {
            return None;
        }

        let scale_factor = new_width as f32 / self.width as f32;
        let new_height = Photo::proportional_height(self.width, self.height, new_width);

        let mut new_img_data = vec![0u8; new_width * new_height * 4];

        for new_y in 0..new_height {
            for new_x in 0..new_width {
                // Block of source pixels covered by this destination pixel.
                let orig_x_start = (((new_x as f32) / scale_factor).round() as usize).min(self.width - 1);
                let orig_y_start = (((new_y as f32) / scale_factor).round() as usize).min(self.height - 1);
                let orig_x_end = ((((new_x + 1) as f32) / scale_factor).round() as usize)
                    .saturating_sub(1)
                    .clamp(orig_x_start, self.width - 1);
                let orig_y_end = ((((new_y + 1) as f32) / scale_factor).round() as usize)
                    .saturating_sub(1)
                    .clamp(orig_y_start, self.height - 1);

                let mut totals = [0u32; 4];
                let mut pixel_count: u32 = 0;

                for orig_y in orig_y_start..=orig_y_end {
                    for orig_x in orig_x_start..=orig_x_end {
                        let orig_index = (orig_y * self.width + orig_x) * 4;
                        for (total, &value) in totals.iter_mut().zip(&self.img_data[orig_index..orig_index + 4]) {
                            *total += value as u32;
                        }
                        pixel_count += 1;
                    }
                }

                let new_index = (new_y * new_width + new_x) * 4;
                for (channel, total) in totals.iter().enumerate() {
                    new_img_data[new_index + channel] = (total / pixel_count) as u8;
                }
            }
        }

        Some(Photo {
            img_data: new_img_data,
            width: new_width,
            height: new_height,
        })
    }
}
