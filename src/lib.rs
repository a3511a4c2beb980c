//! This is the documentation for the **lxeoptics** package, a simulation of optical photon transport inside a
//! liquid-xenon detector vessel.
//!
//! For every photon-surface interaction the [`SurfaceModel`](surface::SurfaceModel) decides whether a photon is
//! reflected (specularly or diffusely), transmitted or absorbed, based on wavelength and angle dependent (complex)
//! refractive indices. The [`PropagationEngine`](propagation::PropagationEngine) drives photons through a geometry
//! provided by a [`PhotonTracer`](tracer::PhotonTracer) and the [`TallyAggregator`](tally::TallyAggregator)
//! classifies the terminated photons into track populations for downstream analysis.
//!
//! Data flow: [`PropertyTable`](property_table::PropertyTable) -> [`SurfaceModel`](surface::SurfaceModel) ->
//! [`PropagationEngine`](propagation::PropagationEngine) -> [`TallyAggregator`](tally::TallyAggregator)
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod materials;
pub mod photon;
pub mod propagation;
pub mod property_table;
pub mod run_context;
pub mod simulation;
pub mod source;
pub mod surface;
pub mod tally;
pub mod tracer;
pub mod utils;

pub use simulation::Simulation;
