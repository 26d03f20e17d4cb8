use crate::{core::geo::LatLng, model::report::Report};

/// Represents a data point for the heatmap
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPoint {
    pub report_id: String,
    /// Position of the data point
    pub position: LatLng,
    /// Weight derived from the report severity
    pub intensity: f64,
}

impl HeatmapPoint {
    pub fn from_report(report: &Report) -> Self {
        Self {
            report_id: report.id.clone(),
            position: report.position(),
            intensity: report.severity.heatmap_intensity(),
        }
    }

    /// Colour of this point under `config`
    pub fn color(&self, config: &HeatmapConfig) -> Rgba {
        config.color_at(self.intensity)
    }
}

/// RGBA colour, straight alpha
pub type Rgba = [u8; 4];

/// Rendering hints for a heatmap layer
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    /// Radius of influence for each data point (in pixels)
    pub radius: f64,
    /// Blur factor for smoother appearance
    pub blur: f64,
    /// Minimum intensity value for color mapping
    pub min_intensity: f64,
    /// Maximum intensity value for color mapping
    pub max_intensity: f64,
    /// Gradient stops from low to high intensity
    pub gradient: Vec<(f64, Rgba)>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: 25.0,
            blur: 15.0,
            min_intensity: 0.0,
            max_intensity: 1.0,
            gradient: vec![
                (0.0, [0, 0, 255, 0]),
                (0.4, [0, 0, 255, 160]),
                (0.6, [0, 255, 255, 200]),
                (0.7, [0, 255, 0, 220]),
                (0.8, [255, 255, 0, 240]),
                (1.0, [255, 0, 0, 255]),
            ],
        }
    }
}

impl HeatmapConfig {
    /// Map intensity to color using the gradient
    pub fn color_at(&self, intensity: f64) -> Rgba {
        let (Some(first), Some(last)) = (self.gradient.first(), self.gradient.last()) else {
            return [0, 0, 0, 0];
        };
        let span = self.max_intensity - self.min_intensity;
        if intensity <= self.min_intensity || span <= 0.0 {
            return first.1;
        }
        if intensity >= self.max_intensity {
            return last.1;
        }

        let normalized = (intensity - self.min_intensity) / span;

        for pair in self.gradient.windows(2) {
            let (t1, c1) = pair[0];
            let (t2, c2) = pair[1];
            if normalized >= t1 && normalized <= t2 {
                let t = if t2 > t1 { (normalized - t1) / (t2 - t1) } else { 0.0 };
                let lerp = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
                return [
                    lerp(c1[0], c2[0]),
                    lerp(c1[1], c2[1]),
                    lerp(c1[2], c2[2]),
                    lerp(c1[3], c2[3]),
                ];
            }
        }

        last.1
    }
}
