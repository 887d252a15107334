/// Easing curves used by the strip-video animations: `OutCubic` shapes the
/// photo fade-in, `Linear` drives the flash-dissolve alpha ramps.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    OutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}
