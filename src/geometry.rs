/// Shared geometric primitives and the focus-overlay mask computation.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Hidden or not-yet-laid-out elements report an empty box.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Window metrics at the time of a layout read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub scroll_height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
            scroll_height: height,
        }
    }

    pub const fn scrolled(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    pub const fn with_scroll_height(mut self, scroll_height: f64) -> Self {
        self.scroll_height = scroll_height;
        self
    }
}

/// A document-positioned box, rendered as absolute `top/left/width/height`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StyleBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl StyleBox {
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn declarations(&self) -> [(&'static str, String); 4] {
        [
            ("top", px(self.top)),
            ("left", px(self.left)),
            ("width", px(self.width)),
            ("height", px(self.height)),
        ]
    }

    pub fn css(&self) -> String {
        self.declarations()
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskPanel {
    Top,
    Bottom,
    Left,
    Right,
}

impl MaskPanel {
    pub const ALL: [MaskPanel; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Top => "visual-builder__overlay--top",
            Self::Bottom => "visual-builder__overlay--bottom",
            Self::Left => "visual-builder__overlay--left",
            Self::Right => "visual-builder__overlay--right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineTint {
    Enabled,
    Disabled,
}

impl OutlineTint {
    pub const fn color(self) -> &'static str {
        match self {
            Self::Enabled => "#715cdd",
            Self::Disabled => "#909090",
        }
    }
}

/// Four panels covering everything except the target, plus the target outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    pub top: StyleBox,
    pub bottom: StyleBox,
    pub left: StyleBox,
    pub right: StyleBox,
    pub outline: StyleBox,
    pub tint: OutlineTint,
}

impl OverlayGeometry {
    pub fn panel(&self, panel: MaskPanel) -> StyleBox {
        match panel {
            MaskPanel::Top => self.top,
            MaskPanel::Bottom => self.bottom,
            MaskPanel::Left => self.left,
            MaskPanel::Right => self.right,
        }
    }
}

/// Computes the mask for `target` (viewport-relative) under the given scroll.
///
/// Returns `None` for a degenerate target so callers skip rendering instead of
/// drawing a zero-size cut-out.
pub fn compute_overlay(target: Rect, viewport: Viewport, tint: OutlineTint) -> Option<OverlayGeometry> {
    if target.is_degenerate() {
        return None;
    }

    let doc_top = target.top + viewport.scroll_y;
    let doc_bottom = target.bottom + viewport.scroll_y;
    let doc_left = target.left + viewport.scroll_x;
    let doc_right = target.right + viewport.scroll_x;
    let page_height = viewport.scroll_height.max(viewport.height);
    let page_width = viewport.width + viewport.scroll_x;

    Some(OverlayGeometry {
        top: StyleBox::new(0.0, 0.0, page_width, doc_top),
        bottom: StyleBox::new(
            doc_bottom,
            0.0,
            page_width,
            (page_height - doc_bottom).max(0.0),
        ),
        left: StyleBox::new(doc_top, 0.0, doc_left, target.height),
        right: StyleBox::new(
            doc_top,
            doc_right,
            (page_width - doc_right).max(0.0),
            target.height,
        ),
        outline: StyleBox::new(doc_top, doc_left, target.width, target.height),
        tint,
    })
}

/// Formats a length the way inline styles expect it: `10px`, `12.5px`.
pub fn px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0px".to_string();
    }
    format!("{rounded}px")
}
