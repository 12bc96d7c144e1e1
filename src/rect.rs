/// Integer rectangle in full-image pixel coordinates, right/bottom exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from an origin and size. Saturates instead of overflowing.
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// Width as a signed span; zero or negative for degenerate rects.
    pub fn width(&self) -> i64 {
        i64::from(self.right) - i64::from(self.left)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.bottom) - i64::from(self.top)
    }

    /// `right <= left` or `bottom <= top`.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Intersect with `[0, width) x [0, height)`.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<PixelRect> {
        let x0 = i64::from(self.left).max(0);
        let y0 = i64::from(self.top).max(0);
        let x1 = i64::from(self.right).min(i64::from(width));
        let y1 = i64::from(self.bottom).min(i64::from(height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Non-empty rectangle already clipped to image bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Output dimensions at the given sample size.
    ///
    /// Floor division, never below one pixel; a sample size of 0 counts as 1.
    pub fn sampled_size(&self, sample_size: u32) -> (u32, u32) {
        (
            sampled_extent(self.width, sample_size),
            sampled_extent(self.height, sample_size),
        )
    }
}

/// `max(1, extent / sample_size)` for a non-empty extent.
pub fn sampled_extent(extent: u32, sample_size: u32) -> u32 {
    (extent / sample_size.max(1)).max(1)
}
