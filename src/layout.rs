//! Static catalog of print layouts and the structural constants shared by the
//! capture and composition pipelines. Everything here is compiled-in
//! configuration: created once at process start, never mutated.

use std::sync::OnceLock;

use crate::error::{BoothError, BoothResult};

/// Seconds counted down before each shot.
pub const COUNTDOWN_DURATION_SECS: u32 = 3;
/// Pause between consecutive shots, in milliseconds.
pub const PAUSE_BETWEEN_PHOTOS_MS: u64 = 1500;
/// Photos taken in a digital session (more than any layout needs, so the
/// user picks favorites afterwards).
pub const DIGITAL_CAPTURE_COUNT: usize = 8;
/// Height of the bottom caption band on non-vintage layouts, in pixels.
pub const LOGO_AREA_HEIGHT: u32 = 60;
/// Branding text drawn in the caption band.
pub const CAPTION_TEXT: &str = "Photobooth";

pub const DEFAULT_FRAME_COLOR: &str = "#ffffff";
pub const FRAME_COLORS: [&str; 8] = [
    "#ffffff", "#000000", "#f8b4c8", "#a8d8ea", "#ffd93d", "#c8e6c9", "#e1bee7", "#ffe0b2",
];
pub const VINTAGE_FRAME_COLORS: [&str; 2] = ["#ffffff", "#000000"];

/// UI flow families. The capture/composition core is shared; the mode only
/// selects layouts, filters, and frame palettes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoothMode {
    Digital,
    Vintage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LayoutId {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "2x2-horizontal")]
    TwoByTwoHorizontal,
    #[serde(rename = "2x2-vertical")]
    TwoByTwoVertical,
    #[serde(rename = "1x4-strip")]
    OneByFourStrip,
    #[serde(rename = "2x4-grid")]
    TwoByFourGrid,
    #[serde(rename = "vintage-strip")]
    VintageStrip,
    #[serde(rename = "vintage-4x1")]
    VintageFourAcross,
}

impl LayoutId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::TwoByTwoHorizontal => "2x2-horizontal",
            Self::TwoByTwoVertical => "2x2-vertical",
            Self::OneByFourStrip => "1x4-strip",
            Self::TwoByFourGrid => "2x4-grid",
            Self::VintageStrip => "vintage-strip",
            Self::VintageFourAcross => "vintage-4x1",
        }
    }
}

/// Placement rectangle in canvas coordinates. Owned by exactly one
/// [`LayoutConfig`]; photos map to slots by index.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Slot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Slot {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Immutable layout descriptor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutConfig {
    pub id: LayoutId,
    pub label: String,
    pub photo_count: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub padding: u32,
    pub slots: Vec<Slot>,
}

impl LayoutConfig {
    /// Check the structural invariants: one slot per photo, every slot inside
    /// the canvas.
    pub fn validate(&self) -> BoothResult<()> {
        if self.slots.len() != self.photo_count {
            return Err(BoothError::validation(format!(
                "layout '{}' declares {} photos but {} slots",
                self.id.as_str(),
                self.photo_count,
                self.slots.len()
            )));
        }
        let (w, h) = (f64::from(self.canvas_width), f64::from(self.canvas_height));
        for (i, s) in self.slots.iter().enumerate() {
            if s.width <= 0.0 || s.height <= 0.0 {
                return Err(BoothError::validation(format!(
                    "layout '{}' slot {i} has non-positive size",
                    self.id.as_str()
                )));
            }
            if s.x < 0.0 || s.y < 0.0 || s.x + s.width > w || s.y + s.height > h {
                return Err(BoothError::validation(format!(
                    "layout '{}' slot {i} exceeds canvas bounds",
                    self.id.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Vintage layouts get no caption band.
    pub fn is_vintage(&self) -> bool {
        matches!(self.id, LayoutId::VintageStrip | LayoutId::VintageFourAcross)
    }

    /// Aspect ratio of the first slot; used to crop the viewfinder and the
    /// captured stills so they match the printed cell.
    pub fn slot_aspect_ratio(&self) -> f64 {
        let s = &self.slots[0];
        s.width / s.height
    }
}

fn build_layouts() -> Vec<LayoutConfig> {
    vec![
        LayoutConfig {
            id: LayoutId::Single,
            label: "Single".into(),
            photo_count: 1,
            canvas_width: 600,
            canvas_height: 860,
            padding: 40,
            slots: vec![Slot::new(40.0, 40.0, 520.0, 720.0)],
        },
        LayoutConfig {
            id: LayoutId::TwoByTwoHorizontal,
            label: "2x2".into(),
            photo_count: 4,
            canvas_width: 800,
            canvas_height: 660,
            padding: 30,
            slots: vec![
                Slot::new(30.0, 30.0, 365.0, 260.0),
                Slot::new(405.0, 30.0, 365.0, 260.0),
                Slot::new(30.0, 310.0, 365.0, 260.0),
                Slot::new(405.0, 310.0, 365.0, 260.0),
            ],
        },
        LayoutConfig {
            id: LayoutId::TwoByTwoVertical,
            label: "2x2 Vertical".into(),
            photo_count: 4,
            canvas_width: 640,
            canvas_height: 820,
            padding: 30,
            slots: vec![
                Slot::new(30.0, 30.0, 282.0, 335.0),
                Slot::new(328.0, 30.0, 282.0, 335.0),
                Slot::new(30.0, 395.0, 282.0, 335.0),
                Slot::new(328.0, 395.0, 282.0, 335.0),
            ],
        },
        LayoutConfig {
            id: LayoutId::OneByFourStrip,
            label: "Photo Strip".into(),
            photo_count: 4,
            canvas_width: 400,
            canvas_height: 1260,
            padding: 24,
            slots: vec![
                Slot::new(24.0, 24.0, 352.0, 270.0),
                Slot::new(24.0, 318.0, 352.0, 270.0),
                Slot::new(24.0, 612.0, 352.0, 270.0),
                Slot::new(24.0, 906.0, 352.0, 270.0),
            ],
        },
        LayoutConfig {
            id: LayoutId::TwoByFourGrid,
            label: "2x4 Grid".into(),
            photo_count: 8,
            canvas_width: 800,
            canvas_height: 1260,
            padding: 24,
            slots: vec![
                Slot::new(24.0, 24.0, 368.0, 270.0),
                Slot::new(408.0, 24.0, 368.0, 270.0),
                Slot::new(24.0, 318.0, 368.0, 270.0),
                Slot::new(408.0, 318.0, 368.0, 270.0),
                Slot::new(24.0, 612.0, 368.0, 270.0),
                Slot::new(408.0, 612.0, 368.0, 270.0),
                Slot::new(24.0, 906.0, 368.0, 270.0),
                Slot::new(408.0, 906.0, 368.0, 270.0),
            ],
        },
        LayoutConfig {
            id: LayoutId::VintageStrip,
            label: "Vintage Strip".into(),
            photo_count: 4,
            canvas_width: 400,
            canvas_height: 2220,
            padding: 30,
            slots: vec![
                Slot::new(30.0, 30.0, 340.0, 510.0),
                Slot::new(30.0, 560.0, 340.0, 510.0),
                Slot::new(30.0, 1090.0, 340.0, 510.0),
                Slot::new(30.0, 1620.0, 340.0, 510.0),
            ],
        },
        LayoutConfig {
            id: LayoutId::VintageFourAcross,
            label: "Vintage 4x1".into(),
            photo_count: 4,
            canvas_width: 1160,
            canvas_height: 510,
            padding: 30,
            slots: vec![
                Slot::new(30.0, 30.0, 260.0, 390.0),
                Slot::new(310.0, 30.0, 260.0, 390.0),
                Slot::new(590.0, 30.0, 260.0, 390.0),
                Slot::new(870.0, 30.0, 260.0, 390.0),
            ],
        },
    ]
}

/// All registered layouts.
pub fn all_layouts() -> &'static [LayoutConfig] {
    static LAYOUTS: OnceLock<Vec<LayoutConfig>> = OnceLock::new();
    LAYOUTS.get_or_init(build_layouts)
}

/// Look up one layout by id.
pub fn layout(id: LayoutId) -> &'static LayoutConfig {
    all_layouts()
        .iter()
        .find(|l| l.id == id)
        .expect("registry covers every LayoutId")
}

/// Layouts offered by each UI mode.
pub fn layouts_for_mode(mode: BoothMode) -> &'static [LayoutId] {
    match mode {
        BoothMode::Digital => &[
            LayoutId::Single,
            LayoutId::TwoByTwoHorizontal,
            LayoutId::TwoByTwoVertical,
            LayoutId::OneByFourStrip,
            LayoutId::TwoByFourGrid,
        ],
        BoothMode::Vintage => &[LayoutId::VintageStrip, LayoutId::VintageFourAcross],
    }
}
