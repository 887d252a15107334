//! Cover-crop math shared by the viewfinder, the still capture path, and the
//! composition/video renderers.

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CoverCrop {
    pub sx: f64,
    pub sy: f64,
    pub sw: f64,
    pub sh: f64,
}

/// Source rectangle for object-fit:cover behavior.
///
/// The returned rectangle has the target's aspect ratio, fits inside the
/// source, and is centered: scaling it to `(target_w, target_h)` fills the
/// target exactly with no letterboxing. Equal aspect ratios yield the full
/// source rectangle.
pub fn calculate_cover_crop(src_w: f64, src_h: f64, target_w: f64, target_h: f64) -> CoverCrop {
    let src_aspect = src_w / src_h;
    let target_aspect = target_w / target_h;

    if src_aspect > target_aspect {
        // Source is relatively wider: crop horizontally.
        let sh = src_h;
        let sw = src_h * target_aspect;
        CoverCrop {
            sx: (src_w - sw) / 2.0,
            sy: 0.0,
            sw,
            sh,
        }
    } else {
        let sw = src_w;
        let sh = src_w / target_aspect;
        CoverCrop {
            sx: 0.0,
            sy: (src_h - sh) / 2.0,
            sw,
            sh,
        }
    }
}
