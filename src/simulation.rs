#![warn(missing_docs)]
//! Parallel propagation of independent photons.
//!
//! Photons are propagated in parallel, each on one worker with its own random stream derived from the run seed
//! and the photon id. The terminated photons are merged into a [`TallyAggregator`] by a single writer in photon id
//! order, so the result does not depend on the scheduling of the workers.
use crate::{
    error::LxeResult,
    photon::{PhotonRecord, TerminalPhoton},
    propagation::PropagationEngine,
    run_context::RunContext,
    source::IsotropicSource,
    surface::SurfaceModel,
    tally::TallyAggregator,
    tracer::PhotonTracer,
};
use log::info;
use rayon::prelude::*;
use std::sync::Arc;

/// A single simulation run.
pub struct Simulation<T: PhotonTracer> {
    context: RunContext,
    engine: PropagationEngine,
    tracer: T,
}
impl<T: PhotonTracer> Simulation<T> {
    /// Creates a new [`Simulation`].
    #[must_use]
    pub fn new(context: RunContext, surfaces: Arc<SurfaceModel>, tracer: T) -> Self {
        let engine = PropagationEngine::new(surfaces, &context);
        Self {
            context,
            engine,
            tracer,
        }
    }
    /// Returns the context of this run.
    #[must_use]
    pub const fn context(&self) -> &RunContext {
        &self.context
    }
    /// Emit photons from the given source and propagate them.
    ///
    /// # Errors
    ///
    /// This function will return an error if the emission or the propagation of any photon fails.
    pub fn run(&self, source: &IsotropicSource) -> LxeResult<TallyAggregator> {
        let photons = source.generate(&self.context)?;
        self.run_photons(photons)
    }
    /// Propagate the given photons and aggregate the results.
    ///
    /// The first error aborts the whole run.
    ///
    /// # Errors
    ///
    /// This function will return an error if the propagation of any photon fails.
    pub fn run_photons(&self, photons: Vec<PhotonRecord>) -> LxeResult<TallyAggregator> {
        info!(
            "propagating {} photons (run {})",
            photons.len(),
            self.context.run_id()
        );
        let mut terminated = photons
            .into_par_iter()
            .map(|photon| {
                let mut rng = self.context.photon_rng(photon.id());
                self.engine.propagate(photon, &self.tracer, &mut rng)
            })
            .collect::<LxeResult<Vec<TerminalPhoton>>>()?;
        terminated.sort_by_key(TerminalPhoton::id);
        let mut tally = TallyAggregator::new(&self.context);
        for photon in terminated {
            tally.record(photon);
        }
        let counters = tally.counters();
        info!(
            "run finished: {} detected, {} surface absorbed, {} bulk absorbed, {} undetected",
            counters.detected, counters.surface_absorbed, counters.bulk_absorbed, counters.undetected
        );
        Ok(tally)
    }
}
