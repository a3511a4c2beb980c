//! Export of tally data
use super::{TallyAggregator, TrackCategory};
use crate::{
    error::{LxeError, LxeResult},
    photon::{TerminalPhoton, Track},
};
use log::info;
use serde::Serialize;
use std::{fs::File, io::Write, path::Path};
use uom::si::length::{millimeter, nanometer};

/// Capability interface of a reporting collaborator (e.g. a track plotter).
pub trait TrackReporter {
    /// Report a set of photon tracks under the given title.
    ///
    /// # Errors
    ///
    /// This function returns an error if the reporter cannot process the tracks.
    fn report_tracks(&mut self, title: &str, tracks: &[&Track]) -> LxeResult<()>;
}

/// One line of the detected photon export.
#[derive(Debug, Serialize)]
struct DetectedPhotonRow {
    id: usize,
    x_mm: f64,
    y_mm: f64,
    z_mm: f64,
    dir_x: f64,
    dir_y: f64,
    dir_z: f64,
    wavelength_nm: f64,
    incident_angle_deg: Option<f64>,
    nr_of_specular: usize,
    nr_of_diffuse: usize,
    nr_of_scatters: usize,
}
const HEADER: [&str; 12] = [
    "id",
    "x_mm",
    "y_mm",
    "z_mm",
    "dir_x",
    "dir_y",
    "dir_z",
    "wavelength_nm",
    "incident_angle_deg",
    "nr_of_specular",
    "nr_of_diffuse",
    "nr_of_scatters",
];
impl From<&TerminalPhoton> for DetectedPhotonRow {
    fn from(photon: &TerminalPhoton) -> Self {
        let record = photon.record();
        let pos = record.position();
        let dir = record.direction();
        Self {
            id: record.id(),
            x_mm: pos.x.get::<millimeter>(),
            y_mm: pos.y.get::<millimeter>(),
            z_mm: pos.z.get::<millimeter>(),
            dir_x: dir.x,
            dir_y: dir.y,
            dir_z: dir.z,
            wavelength_nm: record.wavelength().get::<nanometer>(),
            incident_angle_deg: photon.incident_angle_deg(),
            nr_of_specular: record.nr_of_specular(),
            nr_of_diffuse: record.nr_of_diffuse(),
            nr_of_scatters: record.nr_of_scatters(),
        }
    }
}

/// Writes detected photons as CSV (one row per photon, with header) for later reuse.
pub struct DetectedPhotonWriter<W: Write> {
    writer: csv::Writer<W>,
    nr_of_rows: usize,
}
impl<W: Write> DetectedPhotonWriter<W> {
    /// Creates a new [`DetectedPhotonWriter`] and writes the header line.
    ///
    /// # Errors
    ///
    /// This function will return an error if the header cannot be written.
    pub fn new(writer: W) -> LxeResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(HEADER)?;
        Ok(Self {
            writer,
            nr_of_rows: 0,
        })
    }
    /// Write a single photon. Undetected photons are skipped.
    ///
    /// Returns true if a row was written.
    ///
    /// # Errors
    ///
    /// This function will return an error if the row cannot be written.
    pub fn write(&mut self, photon: &TerminalPhoton) -> LxeResult<bool> {
        if !photon.is_detected() {
            return Ok(false);
        }
        self.writer.serialize(DetectedPhotonRow::from(photon))?;
        self.nr_of_rows += 1;
        Ok(true)
    }
    /// Write all detected photons of a tally. Returns the number of written rows.
    ///
    /// # Errors
    ///
    /// This function will return an error if a row cannot be written.
    pub fn write_tally(&mut self, tally: &TallyAggregator) -> LxeResult<usize> {
        let mut written = 0;
        for photon in tally.photons_in(TrackCategory::Detected) {
            if self.write(photon)? {
                written += 1;
            }
        }
        self.writer.flush().map_err(|e| LxeError::Export(e.to_string()))?;
        info!("exported {written} detected photons");
        Ok(written)
    }
    /// Returns the number of rows written so far (without header).
    #[must_use]
    pub const fn nr_of_rows(&self) -> usize {
        self.nr_of_rows
    }
    /// Flush all rows and return the underlying writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if flushing fails.
    pub fn into_inner(self) -> LxeResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| LxeError::Export(format!("could not flush csv data: {e}")))
    }
}
impl DetectedPhotonWriter<File> {
    /// Creates a new [`DetectedPhotonWriter`] writing to the file at the given path.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file cannot be created.
    pub fn create(path: &Path) -> LxeResult<Self> {
        let file = File::create(path).map_err(|e| {
            LxeError::Export(format!("could not create file {}: {e}", path.display()))
        })?;
        Self::new(file)
    }
}
