#![warn(missing_docs)]
//! Classification and aggregation of terminated photons.
//!
//! Every [`TerminalPhoton`] is recorded exactly once. It is counted in exactly one terminal-state counter and
//! classified in a fixed order:
//!   - detected photons land in the detected tracks (and in the detected-reflected tracks if they were reflected)
//!   - otherwise reflected photons land in the reflected tracks and in exactly one of the diffuse-reflected
//!     (any diffuse reflection) or specular-reflected (specular reflections only) tracks
//!   - all remaining photons land in the undetected tracks
use crate::{
    error::LxeResult,
    photon::{TerminalPhoton, TerminalState, Track, UndetectedReason},
    run_context::RunContext,
};
use itertools::Either;
use log::info;
use std::collections::BTreeMap;
use strum::{Display, EnumIter, IntoEnumIterator};

pub mod export;
pub mod summary;

pub use export::{DetectedPhotonWriter, TrackReporter};
pub use summary::{Histogram, TallySummary};

/// Named track populations of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum TrackCategory {
    /// every recorded photon
    #[strum(to_string = "All Photon")]
    All,
    /// photons absorbed on a detector surface
    #[strum(to_string = "Detected Photon")]
    Detected,
    /// detected photons which were reflected before
    #[strum(to_string = "Detected Reflected Photon")]
    DetectedReflected,
    /// undetected photons which were reflected
    #[strum(to_string = "Reflected Photon")]
    Reflected,
    /// undetected photons reflected specularly only
    #[strum(to_string = "Specular Reflected Photon")]
    SpecularReflected,
    /// undetected photons reflected diffusely at least once
    #[strum(to_string = "Diffuse Reflected Photon")]
    DiffuseReflected,
    /// photons neither detected nor reflected
    #[strum(to_string = "Undetected Photon")]
    Undetected,
    /// photons without any bulk scatter event
    #[strum(to_string = "Unscattered Photon")]
    FilteredScattered,
}
impl TrackCategory {
    /// Returns true if the given photon belongs to this category.
    #[must_use]
    pub fn contains(self, photon: &TerminalPhoton) -> bool {
        let detected = photon.is_detected();
        let flags = photon.flags();
        match self {
            Self::All => true,
            Self::Detected => detected,
            Self::DetectedReflected => detected && flags.reflected,
            Self::Reflected => !detected && flags.reflected,
            Self::SpecularReflected => !detected && flags.reflected && !flags.diffuse,
            Self::DiffuseReflected => !detected && flags.reflected && flags.diffuse,
            Self::Undetected => !detected && !flags.reflected,
            Self::FilteredScattered => photon.record().nr_of_scatters() == 0,
        }
    }
    /// Returns true if this category is computed on demand from all tracks instead of being stored.
    #[must_use]
    pub const fn is_view(self) -> bool {
        matches!(self, Self::All | Self::FilteredScattered)
    }
}

/// Number of photons per terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalCounters {
    /// photons absorbed on a detector surface
    pub detected: usize,
    /// photons absorbed on a non-detecting surface
    pub surface_absorbed: usize,
    /// photons absorbed in a bulk material
    pub bulk_absorbed: usize,
    /// photons terminated without absorption
    pub undetected: usize,
    /// undetected photons which reached the step limit
    pub step_limit: usize,
    /// undetected photons which left the geometry
    pub no_hit: usize,
    /// undetected photons which hit an unknown surface
    pub unresolved: usize,
}
impl TerminalCounters {
    fn add(&mut self, state: TerminalState) {
        match state {
            TerminalState::Detected => self.detected += 1,
            TerminalState::SurfaceAbsorbed => self.surface_absorbed += 1,
            TerminalState::BulkAbsorbed => self.bulk_absorbed += 1,
            TerminalState::Undetected(reason) => {
                self.undetected += 1;
                match reason {
                    UndetectedReason::StepLimit => self.step_limit += 1,
                    UndetectedReason::NoHit => self.no_hit += 1,
                    UndetectedReason::Unresolved => self.unresolved += 1,
                }
            }
        }
    }
    /// Returns the sum of all terminal states (equals the number of recorded photons).
    #[must_use]
    pub const fn total(&self) -> usize {
        self.detected + self.surface_absorbed + self.bulk_absorbed + self.undetected
    }
}

/// Accumulates terminated photons of a run.
#[derive(Debug, Clone)]
pub struct TallyAggregator {
    seed: u64,
    photons: Vec<TerminalPhoton>,
    buckets: BTreeMap<TrackCategory, Vec<usize>>,
    counters: TerminalCounters,
}
impl TallyAggregator {
    /// Creates a new, empty [`TallyAggregator`] for the given run.
    #[must_use]
    pub fn new(context: &RunContext) -> Self {
        Self {
            seed: context.seed(),
            photons: Vec::new(),
            buckets: TrackCategory::iter()
                .filter(|c| !c.is_view())
                .map(|c| (c, Vec::new()))
                .collect(),
            counters: TerminalCounters::default(),
        }
    }
    /// Record a terminated photon. Every photon must be recorded exactly once.
    pub fn record(&mut self, photon: TerminalPhoton) {
        let idx = self.photons.len();
        self.counters.add(photon.state());
        for (category, bucket) in &mut self.buckets {
            if category.contains(&photon) {
                bucket.push(idx);
            }
        }
        self.photons.push(photon);
    }
    /// Returns the seed of the run.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
    /// Returns the number of recorded photons.
    #[must_use]
    pub fn nr_of_photons(&self) -> usize {
        self.photons.len()
    }
    /// Returns the terminal-state counters.
    #[must_use]
    pub const fn counters(&self) -> &TerminalCounters {
        &self.counters
    }
    /// Returns all recorded photons in recording order.
    #[must_use]
    pub fn photons(&self) -> &[TerminalPhoton] {
        &self.photons
    }
    /// Returns the photons of the given category in recording order.
    ///
    /// View categories ([`TrackCategory::is_view`]) are filtered lazily from all recorded photons.
    pub fn photons_in(
        &self,
        category: TrackCategory,
    ) -> impl Iterator<Item = &TerminalPhoton> + '_ {
        match self.buckets.get(&category) {
            Some(bucket) => Either::Left(bucket.iter().map(|idx| &self.photons[*idx])),
            None => Either::Right(self.photons.iter().filter(move |p| category.contains(p))),
        }
    }
    /// Returns the tracks of the given category.
    #[must_use]
    pub fn tracks(&self, category: TrackCategory) -> Vec<&Track> {
        self.photons_in(category).map(TerminalPhoton::track).collect()
    }
    /// Returns the number of photons in the given category.
    #[must_use]
    pub fn count(&self, category: TrackCategory) -> usize {
        self.buckets
            .get(&category)
            .map_or_else(|| self.photons_in(category).count(), Vec::len)
    }
    /// Hand the tracks of the given categories to a reporter.
    ///
    /// Each category is reported with a title like `"Detected Photon Tracks, Seed 7"`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the reporter fails.
    pub fn report(
        &self,
        categories: &[TrackCategory],
        reporter: &mut dyn TrackReporter,
    ) -> LxeResult<()> {
        for category in categories {
            let title = format!("{category} Tracks, Seed {}", self.seed);
            let tracks = self.tracks(*category);
            info!("reporting {} tracks: {title}", tracks.len());
            reporter.report_tracks(&title, &tracks)?;
        }
        Ok(())
    }
    /// Calculate the summary of all recorded photons.
    #[must_use]
    pub fn summary(&self) -> TallySummary {
        TallySummary::new(self)
    }
}
