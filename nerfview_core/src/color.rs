//! Scalar-to-color mapping for sector fills.
//!
//! Two fixed 100-stop palettes: inferno for density uncertainty, viridis for
//! color uncertainty (any channel whose title mentions "color"). Values are
//! mapped into the middle 80% of the palette so neither end washes out
//! against the white sector background.

use serde::Serialize;

/// Number of stops in a resampled palette.
const PALETTE_STOPS: usize = 100;

/// Usable span of the palette, as fractions of its full range.
const USABLE_SPAN: (f64, f64) = (0.1, 0.9);

/// Viridis anchor colors at 0, 1/4, 1/2, 3/4, 1.
const VIRIDIS_ANCHORS: [[f32; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

/// Inferno anchor colors at 0, 1/4, 1/2, 3/4, 1.
const INFERNO_ANCHORS: [[f32; 3]; 5] = [
    [0.0, 0.0, 4.0],
    [87.0, 16.0, 110.0],
    [188.0, 55.0, 84.0],
    [249.0, 142.0, 9.0],
    [252.0, 255.0, 164.0],
];

/// A fixed color ramp resampled to [`PALETTE_STOPS`] entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    name: &'static str,
    stops: Vec<[f32; 3]>,
}

impl Palette {
    pub fn viridis() -> Self {
        Self {
            name: "viridis",
            stops: resample(&VIRIDIS_ANCHORS, PALETTE_STOPS),
        }
    }

    pub fn inferno() -> Self {
        Self {
            name: "inferno",
            stops: resample(&INFERNO_ANCHORS, PALETTE_STOPS),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Samples the palette at `t` in `[0, 1]`, clamping out-of-range input.
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        let idx = ((t * self.stops.len() as f64) as usize).min(self.stops.len() - 1);
        let stop = self.stops[idx];
        [stop[0] as u8, stop[1] as u8, stop[2] as u8]
    }
}

/// Piecewise-linear resampling of evenly spaced anchors to `n` stops.
fn resample(anchors: &[[f32; 3]], n: usize) -> Vec<[f32; 3]> {
    let segments = anchors.len() - 1;
    (0..n)
        .map(|i| {
            let t = i as f32 / (n - 1) as f32;
            let scaled = (t * segments as f32).min(segments as f32 - 1e-6);
            let seg = scaled as usize;
            let frac = scaled - seg as f32;
            let (a, b) = (anchors[seg], anchors[seg + 1]);
            [
                a[0] + (b[0] - a[0]) * frac,
                a[1] + (b[1] - a[1]) * frac,
                a[2] + (b[2] - a[2]) * frac,
            ]
        })
        .collect()
}

/// Maps a primary scalar to a sector fill color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorMap {
    palette: Palette,
}

impl ColorMap {
    /// Selects the palette by channel identity: a title mentioning "color"
    /// gets viridis, everything else inferno.
    pub fn for_channel_title(title: &str) -> Self {
        let palette = if title.to_lowercase().contains("color") {
            Palette::viridis()
        } else {
            Palette::inferno()
        };
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Maps `value` from `[0, domain_max]` into the usable palette span and
    /// returns the 8-bit RGB color. Out-of-range values clamp to the span
    /// ends; they never wrap and never fail.
    pub fn map(&self, value: f64, domain_max: f64) -> [u8; 3] {
        let (lo, hi) = USABLE_SPAN;
        let t = if domain_max > 0.0 {
            lo + (value / domain_max).clamp(0.0, 1.0) * (hi - lo)
        } else {
            lo
        };
        self.palette.sample(t)
    }
}
