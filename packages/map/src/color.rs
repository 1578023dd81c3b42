//! Color scales for the continuous choropleth modes.

use school_share_analysis_models::ViewMode;

/// Fill for regions with no value, or no improvement.
pub const NO_DATA_COLOR: &str = "#e0e0e0";
/// Fill opacity for [`NO_DATA_COLOR`].
pub const NO_DATA_OPACITY: f64 = 0.3;
/// Fill opacity for regions colored from a gradient.
pub const GRADIENT_OPACITY: f64 = 0.6;

/// Quantile of the positive values used as the top of the scale.
pub const BOUND_QUANTILE: f64 = 0.95;
/// Scale top when no region has a positive distance reduction.
pub const DISTANCE_FALLBACK_BOUND: f64 = 1.0;
/// Scale top when no region has a positive percent improvement; also the
/// cap on the percent scale.
pub const PERCENT_FALLBACK_BOUND: f64 = 100.0;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` or `#rgb`.
    #[must_use]
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').filter(|d| d.is_ascii())?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
                Some(Self(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }

    /// Formats as lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| {
            (f64::from(b) - f64::from(a))
                .mul_add(t, f64::from(a))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// A linear color scale through evenly spaced stops, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    /// Hex stops from zero to the bound.
    pub stops: &'static [&'static str],
}

impl Gradient {
    /// Gray to green, for distance reduction.
    pub const DISTANCE: Self = Self {
        stops: &["#f5f5f5", "#c7e9c0", "#74c476", "#238b45"],
    };

    /// Gray to blue, for percent improvement.
    pub const PERCENT: Self = Self {
        stops: &["#f5f5f5", "#c6dbef", "#6baed6", "#2171b5"],
    };

    /// Gradient for a continuous view mode; `None` for the status view.
    #[must_use]
    pub const fn for_mode(mode: ViewMode) -> Option<Self> {
        match mode {
            ViewMode::Distance => Some(Self::DISTANCE),
            ViewMode::Percent => Some(Self::PERCENT),
            ViewMode::Status => None,
        }
    }

    /// Color of `value` on a scale from 0 to `bound`. Values outside the
    /// range clamp to the end stops.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn color_at(&self, value: f64, bound: f64) -> String {
        let stops: Vec<Rgb> = self
            .stops
            .iter()
            .filter_map(|s| Rgb::parse_hex(s))
            .collect();
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return NO_DATA_COLOR.to_string();
        };
        if stops.len() == 1 || bound <= 0.0 || value.is_nan() {
            return first.to_hex();
        }

        let t = (value / bound).clamp(0.0, 1.0);
        if t >= 1.0 {
            return last.to_hex();
        }

        let segments = (stops.len() - 1) as f64;
        let scaled = t * segments;
        let idx = scaled.floor() as usize;
        stops[idx].lerp(stops[idx + 1], scaled - idx as f64).to_hex()
    }
}

/// Quantile `q` of `values` with linear interpolation between order
/// statistics. Non-finite values are ignored.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some((sorted[hi] - sorted[lo]).mul_add(frac, sorted[lo]))
}

/// Top of the color scale for `mode`: the 95th percentile of the strictly
/// positive values, so a few outliers do not wash out every other region.
///
/// Falls back to a fixed bound when nothing is positive. The percent scale
/// never exceeds 100.
#[must_use]
pub fn color_bound(values: &[f64], mode: ViewMode) -> f64 {
    let fallback = match mode {
        ViewMode::Percent => PERCENT_FALLBACK_BOUND,
        ViewMode::Distance | ViewMode::Status => DISTANCE_FALLBACK_BOUND,
    };

    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    let bound = match (quantile(&positive, BOUND_QUANTILE), mode) {
        (Some(q), ViewMode::Percent) => q.min(PERCENT_FALLBACK_BOUND),
        (Some(q), _) => q,
        (None, _) => fallback,
    };

    if bound.is_nan() || bound <= 0.0 {
        fallback
    } else {
        bound
    }
}
