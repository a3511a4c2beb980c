//! Summary table and histogram data of a run
use super::{TallyAggregator, TrackCategory};
use crate::{
    photon::TerminalPhoton,
    utils::{f64_to_usize, usize_to_f64},
};
use kahan::KahanSummator;
use nalgebra::Point3;
use num::Zero;
use std::fmt::Display;
use uom::si::{f64::Length, length::millimeter};

/// Simple histogram with equally sized bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    lower: f64,
    bin_width: f64,
    counts: Vec<usize>,
}
impl Histogram {
    /// Sort the values into `nr_of_bins` bins between `lower` and `upper`.
    ///
    /// Values outside `[lower, upper]` and non-finite values are ignored. The upper edge belongs to the last bin.
    #[must_use]
    pub fn new(values: impl Iterator<Item = f64>, lower: f64, upper: f64, nr_of_bins: usize) -> Self {
        let nr_of_bins = nr_of_bins.max(1);
        let bin_width = (upper - lower) / usize_to_f64(nr_of_bins);
        let mut counts = vec![0; nr_of_bins];
        for value in values.filter(|v| v.is_finite() && (lower..=upper).contains(v)) {
            let bin = f64_to_usize((value - lower) / bin_width).min(nr_of_bins - 1);
            counts[bin] += 1;
        }
        Self {
            lower,
            bin_width,
            counts,
        }
    }
    /// Count integer values. Bin `i` holds the number of occurrences of the value `i`.
    #[must_use]
    pub fn from_integers(values: impl Iterator<Item = usize>) -> Self {
        let mut counts: Vec<usize> = Vec::new();
        for value in values {
            if value >= counts.len() {
                counts.resize(value + 1, 0);
            }
            counts[value] += 1;
        }
        Self {
            lower: 0.0,
            bin_width: 1.0,
            counts,
        }
    }
    /// Returns the counts per bin.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
    /// Returns the lower edges of all bins.
    #[must_use]
    pub fn bin_edges(&self) -> Vec<f64> {
        (0..self.counts.len())
            .map(|i| usize_to_f64(i).mul_add(self.bin_width, self.lower))
            .collect()
    }
    /// Returns the width of the bins.
    #[must_use]
    pub const fn bin_width(&self) -> f64 {
        self.bin_width
    }
    /// Returns the sum of all counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Summary of a run: photon counts per behaviour, counts among detected photons, photon transport efficiency and
/// histogram data for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct TallySummary {
    /// seed of the run
    pub seed: u64,
    /// number of recorded photons
    pub nr_of_photons: usize,
    /// photons leaving the geometry
    pub no_hit: usize,
    /// photons absorbed in the bulk
    pub bulk_absorb: usize,
    /// photons absorbed on a detector surface
    pub surface_detect: usize,
    /// photons absorbed on other surfaces
    pub surface_absorb: usize,
    /// photons stopped by the step limit
    pub step_limit: usize,
    /// photons hitting unknown surfaces
    pub unresolved: usize,
    /// total number of specular reflections
    pub reflect_specular: usize,
    /// total number of diffuse reflections
    pub reflect_diffuse: usize,
    /// total number of bulk (Rayleigh) scatter events
    pub rayleigh_scatter: usize,
    /// detected photons which were scattered
    pub detected_scattered: usize,
    /// detected photons which were diffusely reflected
    pub detected_diffuse: usize,
    /// detected photons which were specularly reflected
    pub detected_specular: usize,
    /// detected photons without any reflection or scatter event
    pub detected_direct: usize,
    /// photon transport efficiency (detected / emitted)
    pub pte: f64,
    /// statistical uncertainty of the photon transport efficiency
    pub pte_error: f64,
    /// mean number of step events per photon
    pub mean_steps: f64,
    /// mean geometric track length per photon
    pub mean_path_length: Length,
    /// angle of incidence (in degrees) of detected photons, 1 degree bins from 0 to 90 degrees
    pub incident_angle: Histogram,
    /// emission angle (in degrees) of detected photons against the vertical (y) axis, 1 degree bins from 0 to 90
    /// degrees
    pub emission_angle: Histogram,
    /// final positions of detected photons
    pub detected_positions: Vec<Point3<Length>>,
    /// number of specular reflections per detected photon
    pub reflection_multiplicity: Histogram,
    /// number of step events per photon
    pub step_count: Histogram,
}
impl TallySummary {
    /// Calculate the summary of all photons recorded by the given aggregator.
    #[must_use]
    pub fn new(tally: &TallyAggregator) -> Self {
        let counters = tally.counters();
        let photons = tally.photons();
        let nr_of_photons = photons.len();
        let detected = || tally.photons_in(TrackCategory::Detected);
        let (pte, pte_error, mean_steps, mean_path_length) = if nr_of_photons == 0 {
            (0.0, 0.0, 0.0, Length::zero())
        } else {
            let n = usize_to_f64(nr_of_photons);
            let det = usize_to_f64(counters.detected);
            let steps: kahan::KahanSum<f64> = photons
                .iter()
                .map(|p| usize_to_f64(p.record().nr_of_steps()))
                .kahan_sum();
            let path: kahan::KahanSum<f64> = photons
                .iter()
                .map(|p| p.track().path_length().get::<millimeter>())
                .kahan_sum();
            (
                det / n,
                det.sqrt() / n,
                steps.sum() / n,
                Length::new::<millimeter>(path.sum() / n),
            )
        };
        Self {
            seed: tally.seed(),
            nr_of_photons,
            no_hit: counters.no_hit,
            bulk_absorb: counters.bulk_absorbed,
            surface_detect: counters.detected,
            surface_absorb: counters.surface_absorbed,
            step_limit: counters.step_limit,
            unresolved: counters.unresolved,
            reflect_specular: photons.iter().map(|p| p.record().nr_of_specular()).sum(),
            reflect_diffuse: photons.iter().map(|p| p.record().nr_of_diffuse()).sum(),
            rayleigh_scatter: photons.iter().map(|p| p.record().nr_of_scatters()).sum(),
            detected_scattered: detected().filter(|p| p.flags().scattered).count(),
            detected_diffuse: detected().filter(|p| p.flags().diffuse).count(),
            detected_specular: detected().filter(|p| p.flags().specular).count(),
            detected_direct: detected()
                .filter(|p| !p.flags().reflected && !p.flags().scattered)
                .count(),
            pte,
            pte_error,
            mean_steps,
            mean_path_length,
            incident_angle: Histogram::new(
                detected().filter_map(TerminalPhoton::incident_angle_deg),
                0.0,
                90.0,
                90,
            ),
            emission_angle: Histogram::new(
                detected().filter_map(emission_angle_deg),
                0.0,
                90.0,
                90,
            ),
            detected_positions: detected().map(|p| p.record().position()).collect(),
            reflection_multiplicity: Histogram::from_integers(
                detected().map(|p| p.record().nr_of_specular()),
            ),
            step_count: Histogram::from_integers(photons.iter().map(|p| p.record().nr_of_steps())),
        }
    }
}
/// Angle between the first track segment and the y axis, folded into [0, 90] degrees.
fn emission_angle_deg(photon: &TerminalPhoton) -> Option<f64> {
    let segment = photon.track().first_segment()?;
    let length = segment.norm();
    if length.is_zero() {
        return None;
    }
    Some((segment.y.abs() / length).min(1.0).acos().to_degrees())
}

impl Display for TallySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fraction = |count: usize| {
            if self.nr_of_photons == 0 {
                0.0
            } else {
                usize_to_f64(count) / usize_to_f64(self.nr_of_photons)
            }
        };
        writeln!(
            f,
            "Photon tally (seed {}, {} photons)",
            self.seed, self.nr_of_photons
        )?;
        writeln!(f, "{:<28}{:>12}{:>12}", "behaviour", "count", "fraction")?;
        for (label, count) in [
            ("no hit", self.no_hit),
            ("bulk absorb", self.bulk_absorb),
            ("surface detect", self.surface_detect),
            ("surface absorb", self.surface_absorb),
            ("step limit", self.step_limit),
            ("unresolved", self.unresolved),
        ] {
            writeln!(f, "{label:<28}{count:>12}{:>12.4}", fraction(count))?;
        }
        writeln!(f, "{:<28}{:>12}", "reflect specular", self.reflect_specular)?;
        writeln!(f, "{:<28}{:>12}", "reflect diffuse", self.reflect_diffuse)?;
        writeln!(f, "{:<28}{:>12}", "rayleigh scatter", self.rayleigh_scatter)?;
        writeln!(f, "among detected photons")?;
        for (label, count) in [
            ("  scattered", self.detected_scattered),
            ("  diffuse reflected", self.detected_diffuse),
            ("  specular reflected", self.detected_specular),
            ("  direct hit", self.detected_direct),
        ] {
            writeln!(f, "{label:<28}{count:>12}")?;
        }
        writeln!(f, "{:<28}{:>12.2}", "mean steps", self.mean_steps)?;
        writeln!(
            f,
            "{:<28}{:>12.2} mm",
            "mean path length",
            self.mean_path_length.get::<millimeter>()
        )?;
        write!(
            f,
            "{:<28}{:>12.6} +/- {:.6}",
            "photon transport efficiency", self.pte, self.pte_error
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        millimeter, nanometer,
        photon::{PhotonRecord, TerminalState, UndetectedReason},
        run_context::{RunConfig, RunContext},
        tally::test_helper::terminal,
    };
    use approx::assert_abs_diff_eq;
    use nalgebra::vector;

    fn detected_from(
        id: usize,
        start: Point3<Length>,
        vertices: &[Point3<Length>],
        specular: usize,
    ) -> TerminalPhoton {
        let mut p = PhotonRecord::new(id, start, vector![0.0, 1.0, 0.0], nanometer!(175.0)).unwrap();
        for vertex in vertices {
            p.count_step();
            p.set_position(*vertex);
        }
        for _ in 0..specular {
            p.add_specular_reflection();
        }
        p.terminate(TerminalState::Detected)
    }

    #[test]
    fn histogram() {
        let h = Histogram::new([0.0, 0.5, 1.0, 89.5, 90.0, 95.0, f64::NAN].into_iter(), 0.0, 90.0, 90);
        assert_eq!(h.counts().len(), 90);
        assert_eq!(h.counts()[0], 2);
        assert_eq!(h.counts()[1], 1);
        assert_eq!(h.counts()[89], 2);
        assert_eq!(h.total(), 5);
        assert_abs_diff_eq!(h.bin_width(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h.bin_edges()[45], 45.0, epsilon = 1e-12);
    }
    #[test]
    fn histogram_from_integers() {
        let h = Histogram::from_integers([0, 2, 2, 5].into_iter());
        assert_eq!(h.counts(), &[1, 0, 2, 0, 0, 1]);
        assert!(Histogram::from_integers(std::iter::empty()).counts().is_empty());
    }
    #[test]
    fn summary() {
        let mut config = RunConfig::default();
        config.set_seed(3);
        let mut tally = TallyAggregator::new(&RunContext::new(config));
        tally.record(terminal(0, 0, 0, 0, TerminalState::Detected));
        tally.record(terminal(1, 2, 1, 1, TerminalState::Detected));
        tally.record(terminal(2, 1, 0, 0, TerminalState::SurfaceAbsorbed));
        tally.record(terminal(3, 0, 0, 0, TerminalState::BulkAbsorbed));
        let s = tally.summary();
        assert_eq!(s.seed, 3);
        assert_eq!(s.nr_of_photons, 4);
        assert_eq!(s.surface_detect, 2);
        assert_eq!(s.surface_absorb, 1);
        assert_eq!(s.bulk_absorb, 1);
        assert_eq!(s.no_hit, 0);
        assert_eq!(s.reflect_specular, 3);
        assert_eq!(s.reflect_diffuse, 1);
        assert_eq!(s.rayleigh_scatter, 1);
        assert_eq!(s.detected_scattered, 1);
        assert_eq!(s.detected_diffuse, 1);
        assert_eq!(s.detected_specular, 1);
        assert_eq!(s.detected_direct, 1);
        assert_abs_diff_eq!(s.pte, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.pte_error, 2.0_f64.sqrt() / 4.0, epsilon = 1e-12);
        // 1 + 5 + 2 + 1 steps
        assert_abs_diff_eq!(s.mean_steps, 2.25, epsilon = 1e-12);
        // photon 0 hit at 0.5 degree, photon 1 at 10.5 degree
        assert_eq!(s.incident_angle.total(), 2);
        assert_eq!(s.incident_angle.counts()[0], 1);
        assert_eq!(s.incident_angle.counts()[10], 1);
        // specular reflections of the detected photons 0 and 1
        assert_eq!(s.reflection_multiplicity.counts(), &[1, 0, 1]);
        // every track runs 10 mm along +z
        assert_abs_diff_eq!(s.mean_path_length.get::<millimeter>(), 10.0, epsilon = 1e-9);
        assert_eq!(s.emission_angle.total(), 2);
        assert_eq!(s.emission_angle.counts()[89], 2);
        assert_eq!(
            s.detected_positions,
            vec![millimeter!(0.0, 0.0, 10.0), millimeter!(0.0, 0.0, 10.0)]
        );
        assert_eq!(s.step_count.total(), 4);
        let table = s.to_string();
        assert!(table.starts_with("Photon tally (seed 3, 4 photons)"));
        assert!(table.contains("surface detect"));
        assert!(table.contains("mean path length"));
        assert!(table.ends_with("0.500000 +/- 0.353553"));
    }
    #[test]
    fn multiplicity_of_detected_photons() {
        let mut tally = TallyAggregator::new(&RunContext::new(RunConfig::default()));
        tally.record(terminal(0, 1, 0, 0, TerminalState::Detected));
        tally.record(terminal(
            1,
            3,
            2,
            0,
            TerminalState::Undetected(UndetectedReason::StepLimit),
        ));
        assert_eq!(tally.summary().reflection_multiplicity.counts(), &[0, 1]);
    }
    #[test]
    fn emission_angle() {
        let mut tally = TallyAggregator::new(&RunContext::new(RunConfig::default()));
        // 30.5 degree against the y axis, pointing downwards
        let (sin, cos) = 30.5_f64.to_radians().sin_cos();
        tally.record(detected_from(
            0,
            millimeter!(0.0, 0.0, 0.0),
            &[millimeter!(10.0 * sin, -10.0 * cos, 0.0), millimeter!(0.0, 50.0, 0.0)],
            1,
        ));
        // along the y axis
        tally.record(detected_from(
            1,
            millimeter!(0.0, 0.0, 0.0),
            &[millimeter!(0.0, 20.0, 0.0)],
            0,
        ));
        // no segment, no emission angle
        tally.record(detected_from(2, millimeter!(1.0, 2.0, 3.0), &[], 0));
        let s = tally.summary();
        assert_eq!(s.emission_angle.total(), 2);
        assert_eq!(s.emission_angle.counts()[0], 1);
        assert_eq!(s.emission_angle.counts()[30], 1);
        assert_eq!(
            s.detected_positions,
            vec![
                millimeter!(0.0, 50.0, 0.0),
                millimeter!(0.0, 20.0, 0.0),
                millimeter!(1.0, 2.0, 3.0)
            ]
        );
        assert_eq!(s.reflection_multiplicity.counts(), &[2, 1]);
    }
    #[test]
    fn empty_run() {
        let tally = TallyAggregator::new(&RunContext::new(RunConfig::default()));
        let s = tally.summary();
        assert_eq!(s.pte, 0.0);
        assert_eq!(s.pte_error, 0.0);
        assert_eq!(s.incident_angle.total(), 0);
        assert_eq!(s.emission_angle.total(), 0);
        assert!(s.detected_positions.is_empty());
        assert!(s.reflection_multiplicity.counts().is_empty());
        assert_eq!(s.mean_path_length, Length::zero());
        assert!(s.to_string().contains("0.000000 +/- 0.000000"));
    }
    #[test]
    fn undetected_reasons() {
        let mut tally = TallyAggregator::new(&RunContext::new(RunConfig::default()));
        tally.record(terminal(
            0,
            0,
            0,
            0,
            TerminalState::Undetected(UndetectedReason::Unresolved),
        ));
        tally.record(terminal(
            1,
            0,
            0,
            0,
            TerminalState::Undetected(UndetectedReason::StepLimit),
        ));
        let s = tally.summary();
        assert_eq!(s.unresolved, 1);
        assert_eq!(s.step_limit, 1);
        assert_eq!(s.pte, 0.0);
    }
}
