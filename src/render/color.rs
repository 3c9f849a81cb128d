use image::Rgb;

/// ColorBrewer RdYlGn, red (low) through yellow to green (high).
const RD_YL_GN: [[u8; 3]; 11] = [
    [165, 0, 38],
    [215, 48, 39],
    [244, 109, 67],
    [253, 174, 97],
    [254, 224, 139],
    [255, 255, 191],
    [217, 239, 139],
    [166, 217, 106],
    [102, 189, 99],
    [26, 152, 80],
    [0, 104, 55],
];

pub const NO_DATA: Rgb<u8> = Rgb([200, 200, 200]);

/// Diverging scale whose neutral color sits on `mid`. The domain is made
/// symmetric around `mid` so equal distances get equal color shifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergingScale {
    mid: f64,
    half_span: f64,
}

impl DivergingScale {
    pub fn centered(values: &[f64], mid: f64) -> Self {
        let half_span = values
            .iter()
            .map(|v| (v - mid).abs())
            .fold(0.0_f64, f64::max);
        Self { mid, half_span }
    }

    pub fn midpoint(&self) -> f64 {
        self.mid
    }

    /// Position in [0, 1], 0.5 at the midpoint.
    pub fn position(&self, value: f64) -> f64 {
        if self.half_span <= f64::EPSILON {
            return 0.5;
        }
        (0.5 + (value - self.mid) / (2.0 * self.half_span)).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> Rgb<u8> {
        interpolate(self.position(value))
    }
}

fn interpolate(t: f64) -> Rgb<u8> {
    let last = RD_YL_GN.len() - 1;
    let scaled = t.clamp(0.0, 1.0) * last as f64;
    let lo = (scaled.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = scaled - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (RD_YL_GN[lo], RD_YL_GN[hi]);
    Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
}

/// Mean of `(value, weight)` pairs. Falls back to the plain mean when
/// the weights sum to zero, and to `None` for no values.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    if total_weight > 0.0 {
        Some(pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight)
    } else {
        Some(pairs.iter().map(|(v, _)| v).sum::<f64>() / pairs.len() as f64)
    }
}

pub fn hex(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0[0], color.0[1], color.0[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_maps_to_neutral() {
        let scale = DivergingScale::centered(&[0.2, 0.9], 0.5);
        assert_eq!(scale.position(0.5), 0.5);
        assert_eq!(scale.color(0.5), Rgb([255, 255, 191]));
    }

    #[test]
    fn test_symmetric_domain() {
        let scale = DivergingScale::centered(&[0.1, 0.6], 0.5);
        // 0.1 is the furthest point, so it sits at the red end.
        assert_eq!(scale.position(0.1), 0.0);
        assert!((scale.position(0.6) - 0.625).abs() < 1e-9);
        assert_eq!(scale.color(0.1), Rgb([165, 0, 38]));
        assert_eq!(scale.position(0.9), 1.0);
    }

    #[test]
    fn test_degenerate_scale() {
        let scale = DivergingScale::centered(&[0.4, 0.4], 0.4);
        assert_eq!(scale.position(0.4), 0.5);
        assert_eq!(scale.position(0.9), 0.5);
    }

    #[test]
    fn test_weighted_mean() {
        assert_eq!(weighted_mean(&[]), None);
        assert_eq!(weighted_mean(&[(1.0, 3.0), (0.0, 1.0)]), Some(0.75));
        let unweighted = weighted_mean(&[(0.2, 0.0), (0.4, 0.0)]).unwrap();
        assert!((unweighted - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(Rgb([0, 104, 55])), "#006837");
    }
}
