#![warn(missing_docs)]
//! Per-photon state and history.
//!
//! A [`PhotonRecord`] is created at emission and mutated once per step event by the
//! [`PropagationEngine`](crate::propagation::PropagationEngine). On termination it is frozen into a
//! [`TerminalPhoton`] which carries the [`TerminalState`] and is consumed by the
//! [`TallyAggregator`](crate::tally::TallyAggregator).
use crate::error::{LxeError, LxeResult};
use nalgebra::{Point3, Vector3};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uom::si::{
    angle::degree,
    f64::{Angle, Length},
    length::{millimeter, nanometer},
};

/// Reason for a photon ending up undetected without being absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UndetectedReason {
    /// the step cap of the run was reached (or the tracer signalled its own limit)
    StepLimit,
    /// the photon left the geometry without hitting any surface
    NoHit,
    /// the photon hit a surface which is not part of the surface model
    Unresolved,
}

/// Final state of a photon. Terminal states are absorbing: no further event is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalState {
    /// absorbed on a detector surface
    Detected,
    /// absorbed on a non-detecting surface
    SurfaceAbsorbed,
    /// absorbed inside a bulk material
    BulkAbsorbed,
    /// terminated without absorption
    Undetected(UndetectedReason),
}
impl Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detected => write!(f, "detected"),
            Self::SurfaceAbsorbed => write!(f, "surface absorbed"),
            Self::BulkAbsorbed => write!(f, "bulk absorbed"),
            Self::Undetected(UndetectedReason::StepLimit) => write!(f, "undetected (step limit)"),
            Self::Undetected(UndetectedReason::NoHit) => write!(f, "undetected (no hit)"),
            Self::Undetected(UndetectedReason::Unresolved) => write!(f, "undetected (unresolved)"),
        }
    }
}

/// History flags of a photon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PhotonFlags {
    /// absorbed on a detector surface. Exclusive with the absorbed flags.
    pub detected: bool,
    /// reflected (specularly or diffusely) at least once
    pub reflected: bool,
    /// reflected diffusely at least once
    pub diffuse: bool,
    /// reflected specularly at least once
    pub specular: bool,
    /// absorbed inside a bulk material
    pub bulk_absorbed: bool,
    /// absorbed on a non-detecting surface
    pub surface_absorbed: bool,
    /// scattered inside a bulk material at least once
    pub scattered: bool,
    /// left the geometry without hitting a surface
    pub no_hit: bool,
    /// hit a surface unknown to the surface model
    pub unresolved: bool,
}

/// Polyline of the positions visited by a photon, starting at its emission point.
///
/// The length of a track is its number of segments, i.e. the number of step events which moved the photon to a
/// new vertex. A photon stopped by the step cap after `n` boundary hits has a track of length `n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    positions: Vec<Point3<Length>>,
}
impl Track {
    /// Creates a new [`Track`] starting at the given emission point.
    #[must_use]
    pub fn new(start: Point3<Length>) -> Self {
        Self {
            positions: vec![start],
        }
    }
    /// Append a vertex.
    pub fn push(&mut self, position: Point3<Length>) {
        self.positions.push(position);
    }
    /// Returns all vertices of this [`Track`] including the emission point.
    #[must_use]
    pub fn positions(&self) -> &[Point3<Length>] {
        &self.positions
    }
    /// Returns the number of segments of this [`Track`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }
    /// Returns true if the track does not contain any segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns the first segment (in mm) of this [`Track`], if any.
    #[must_use]
    pub fn first_segment(&self) -> Option<Vector3<f64>> {
        match self.positions.as_slice() {
            [start, next, ..] => Some(segment_mm(start, next)),
            _ => None,
        }
    }
    /// Returns the geometric length of the track.
    #[must_use]
    pub fn path_length(&self) -> Length {
        self.positions
            .windows(2)
            .map(|w| Length::new::<millimeter>(segment_mm(&w[0], &w[1]).norm()))
            .fold(Length::zero(), |acc, l| acc + l)
    }
}

fn segment_mm(start: &Point3<Length>, end: &Point3<Length>) -> Vector3<f64> {
    Vector3::new(
        (end.x - start.x).get::<millimeter>(),
        (end.y - start.y).get::<millimeter>(),
        (end.z - start.z).get::<millimeter>(),
    )
}

/// Mutable state of a photon during propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotonRecord {
    id: usize,
    pos: Point3<Length>,
    /// propagation direction (normalized)
    dir: Vector3<f64>,
    wvl: Length,
    /// polarization vector (normalized, perpendicular to the direction)
    pol: Vector3<f64>,
    flags: PhotonFlags,
    nr_of_specular: usize,
    nr_of_diffuse: usize,
    nr_of_scatters: usize,
    nr_of_steps: usize,
    incident_angle: Option<Angle>,
    track: Track,
}
impl PhotonRecord {
    /// Creates a new [`PhotonRecord`] at its emission point.
    ///
    /// The direction is normalized. The polarization is chosen perpendicular to the direction.
    ///
    /// # Errors
    ///
    /// This function returns an error if
    ///  - the given wavelength is <= 0.0, `NaN` or +inf
    ///  - the direction vector has a zero length or is not finite
    ///  - a coordinate of the position is not finite
    pub fn new(
        id: usize,
        position: Point3<Length>,
        direction: Vector3<f64>,
        wavelength: Length,
    ) -> LxeResult<Self> {
        if wavelength.is_zero() || wavelength.is_sign_negative() || !wavelength.is_finite() {
            return Err(LxeError::Other("wavelength must be >0".into()));
        }
        if direction.norm().is_zero() || !direction.iter().all(|c| c.is_finite()) {
            return Err(LxeError::Other(
                "length of direction must be >0 and finite".into(),
            ));
        }
        if !position.iter().all(|c| c.is_finite()) {
            return Err(LxeError::Other("position must be finite".into()));
        }
        let dir = direction.normalize();
        Ok(Self {
            id,
            pos: position,
            dir,
            wvl: wavelength,
            pol: perpendicular(&dir),
            flags: PhotonFlags::default(),
            nr_of_specular: 0,
            nr_of_diffuse: 0,
            nr_of_scatters: 0,
            nr_of_steps: 0,
            incident_angle: None,
            track: Track::new(position),
        })
    }
    /// Returns the id of this [`PhotonRecord`].
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }
    /// Returns the current position of this [`PhotonRecord`].
    #[must_use]
    pub const fn position(&self) -> Point3<Length> {
        self.pos
    }
    /// Move the photon to the given position and append it to the track.
    pub fn set_position(&mut self, position: Point3<Length>) {
        self.pos = position;
        self.track.push(position);
    }
    /// Returns the (normalized) direction of this [`PhotonRecord`].
    #[must_use]
    pub const fn direction(&self) -> Vector3<f64> {
        self.dir
    }
    /// Sets the direction of this [`PhotonRecord`].
    ///
    /// The direction is normalized. The polarization is projected onto the plane perpendicular to the new
    /// direction.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given direction has zero length or is not finite.
    pub fn set_direction(&mut self, direction: Vector3<f64>) -> LxeResult<()> {
        if direction.norm().is_zero() || !direction.iter().all(|c| c.is_finite()) {
            return Err(LxeError::Propagation(
                "length of direction must be >0 and finite".into(),
            ));
        }
        self.dir = direction.normalize();
        let projected = self.pol - self.dir * self.pol.dot(&self.dir);
        self.pol = if projected.norm() > 1e-9 {
            projected.normalize()
        } else {
            perpendicular(&self.dir)
        };
        Ok(())
    }
    /// Mirror direction and polarization about the plane with the given normal.
    ///
    /// # Errors
    ///
    /// This function will return an error if the normal has zero length or is not finite.
    pub fn mirror(&mut self, normal: &Vector3<f64>) -> LxeResult<()> {
        if normal.norm().is_zero() || !normal.iter().all(|c| c.is_finite()) {
            return Err(LxeError::Propagation(
                "surface normal must have a length >0 and be finite".into(),
            ));
        }
        let n = normal.normalize();
        self.dir = (self.dir - 2.0 * self.dir.dot(&n) * n).normalize();
        self.pol = (self.pol - 2.0 * self.pol.dot(&n) * n).normalize();
        Ok(())
    }
    /// Returns the wavelength of this [`PhotonRecord`].
    #[must_use]
    pub const fn wavelength(&self) -> Length {
        self.wvl
    }
    /// Returns the polarization vector of this [`PhotonRecord`].
    #[must_use]
    pub const fn polarization(&self) -> Vector3<f64> {
        self.pol
    }
    /// Returns the history flags of this [`PhotonRecord`].
    #[must_use]
    pub const fn flags(&self) -> &PhotonFlags {
        &self.flags
    }
    /// Returns the number of specular reflections.
    #[must_use]
    pub const fn nr_of_specular(&self) -> usize {
        self.nr_of_specular
    }
    /// Returns the number of diffuse reflections.
    #[must_use]
    pub const fn nr_of_diffuse(&self) -> usize {
        self.nr_of_diffuse
    }
    /// Returns the number of bulk scatter events.
    #[must_use]
    pub const fn nr_of_scatters(&self) -> usize {
        self.nr_of_scatters
    }
    /// Returns the number of processed step events.
    #[must_use]
    pub const fn nr_of_steps(&self) -> usize {
        self.nr_of_steps
    }
    /// Returns the angle of incidence of the last boundary hit (if any).
    #[must_use]
    pub const fn incident_angle(&self) -> Option<Angle> {
        self.incident_angle
    }
    /// Returns the track of this [`PhotonRecord`].
    #[must_use]
    pub const fn track(&self) -> &Track {
        &self.track
    }
    pub(crate) fn count_step(&mut self) {
        self.nr_of_steps += 1;
    }
    pub(crate) fn set_incident_angle(&mut self, angle: Angle) {
        self.incident_angle = Some(angle);
    }
    pub(crate) fn add_specular_reflection(&mut self) {
        self.flags.reflected = true;
        self.flags.specular = true;
        self.nr_of_specular += 1;
    }
    pub(crate) fn add_diffuse_reflection(&mut self) {
        self.flags.reflected = true;
        self.flags.diffuse = true;
        self.nr_of_diffuse += 1;
    }
    pub(crate) fn add_scatter(&mut self) {
        self.flags.scattered = true;
        self.nr_of_scatters += 1;
    }
    /// Freeze this photon into a [`TerminalPhoton`] with the given final state.
    ///
    /// The terminal flags (`detected`, `surface_absorbed`, `bulk_absorbed`, `no_hit`, `unresolved`) are set
    /// according to the state.
    #[must_use]
    pub fn terminate(mut self, state: TerminalState) -> TerminalPhoton {
        match state {
            TerminalState::Detected => self.flags.detected = true,
            TerminalState::SurfaceAbsorbed => self.flags.surface_absorbed = true,
            TerminalState::BulkAbsorbed => self.flags.bulk_absorbed = true,
            TerminalState::Undetected(UndetectedReason::NoHit) => self.flags.no_hit = true,
            TerminalState::Undetected(UndetectedReason::Unresolved) => {
                self.flags.unresolved = true;
            }
            TerminalState::Undetected(UndetectedReason::StepLimit) => {}
        }
        TerminalPhoton {
            record: self,
            state,
        }
    }
}
impl Display for PhotonRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mm = Length::format_args(millimeter, uom::fmt::DisplayStyle::Abbreviation);
        let nm = Length::format_args(nanometer, uom::fmt::DisplayStyle::Abbreviation);
        write!(
            f,
            "photon #{}: pos: ({}, {}, {}), dir: ({:.4}, {:.4}, {:.4}), wavelength: {:.2}, steps: {}",
            self.id,
            mm.with(self.pos.x),
            mm.with(self.pos.y),
            mm.with(self.pos.z),
            self.dir.x,
            self.dir.y,
            self.dir.z,
            nm.with(self.wvl),
            self.nr_of_steps
        )
    }
}

/// A photon which has reached its [`TerminalState`]. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalPhoton {
    record: PhotonRecord,
    state: TerminalState,
}
impl TerminalPhoton {
    /// Returns the final state of this photon.
    #[must_use]
    pub const fn state(&self) -> TerminalState {
        self.state
    }
    /// Returns the frozen photon record.
    #[must_use]
    pub const fn record(&self) -> &PhotonRecord {
        &self.record
    }
    /// Returns the photon id.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.record.id
    }
    /// Returns the history flags.
    #[must_use]
    pub const fn flags(&self) -> &PhotonFlags {
        &self.record.flags
    }
    /// Returns the track.
    #[must_use]
    pub const fn track(&self) -> &Track {
        &self.record.track
    }
    /// Returns true if the photon was detected.
    #[must_use]
    pub fn is_detected(&self) -> bool {
        self.state == TerminalState::Detected
    }
    /// Returns the angle of incidence (in degrees) of the last boundary hit.
    #[must_use]
    pub fn incident_angle_deg(&self) -> Option<f64> {
        self.record.incident_angle.map(|a| a.get::<degree>())
    }
}

/// Returns a normalized vector perpendicular to `v`.
fn perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&helper).normalize()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{degree, millimeter, nanometer};
    use approx::assert_abs_diff_eq;
    use nalgebra::vector;

    fn photon() -> PhotonRecord {
        PhotonRecord::new(
            3,
            millimeter!(0.0, 0.0, 0.0),
            vector![0.0, 0.0, 2.0],
            nanometer!(175.0),
        )
        .unwrap()
    }
    #[test]
    fn new() {
        let p = photon();
        assert_eq!(p.id(), 3);
        assert_eq!(p.direction(), vector![0.0, 0.0, 1.0]);
        assert_eq!(p.wavelength(), nanometer!(175.0));
        assert_abs_diff_eq!(p.polarization().dot(&p.direction()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.polarization().norm(), 1.0, epsilon = 1e-12);
        assert_eq!(p.flags(), &PhotonFlags::default());
        assert_eq!(p.nr_of_steps(), 0);
        assert_eq!(p.incident_angle(), None);
        assert_eq!(p.track().positions(), &[millimeter!(0.0, 0.0, 0.0)]);
        assert!(p.track().is_empty());
    }
    #[test]
    fn new_wrong() {
        let pos = millimeter!(0.0, 0.0, 0.0);
        let dir = vector![0.0, 0.0, 1.0];
        assert!(PhotonRecord::new(0, pos, dir, nanometer!(0.0)).is_err());
        assert!(PhotonRecord::new(0, pos, dir, nanometer!(-10.0)).is_err());
        assert!(PhotonRecord::new(0, pos, dir, nanometer!(f64::NAN)).is_err());
        assert!(PhotonRecord::new(0, pos, dir, nanometer!(f64::INFINITY)).is_err());
        assert!(PhotonRecord::new(0, pos, vector![0.0, 0.0, 0.0], nanometer!(175.0)).is_err());
        assert!(PhotonRecord::new(0, pos, vector![f64::NAN, 0.0, 1.0], nanometer!(175.0)).is_err());
        assert!(PhotonRecord::new(
            0,
            millimeter!(f64::NAN, 0.0, 0.0),
            dir,
            nanometer!(175.0)
        )
        .is_err());
    }
    #[test]
    fn track_segments() {
        let mut p = photon();
        p.set_position(millimeter!(0.0, 0.0, 10.0));
        p.set_position(millimeter!(0.0, 0.0, 10.0));
        p.set_position(millimeter!(0.0, 0.0, 0.0));
        assert_eq!(p.track().len(), 3);
        assert_eq!(p.track().positions().len(), 4);
        assert_eq!(p.position(), millimeter!(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(
            p.track().path_length().get::<millimeter>(),
            20.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            p.track().first_segment().unwrap(),
            vector![0.0, 0.0, 10.0],
            epsilon = 1e-9
        );
        let track = Track::new(millimeter!(1.0, 2.0, 3.0));
        assert!(track.is_empty());
        assert_eq!(track.first_segment(), None);
        assert!(Track::default().is_empty());
        assert_eq!(Track::default().path_length(), Length::zero());
    }
    #[test]
    fn mirror() {
        let mut p = PhotonRecord::new(
            0,
            millimeter!(0.0, 0.0, 0.0),
            vector![1.0, 0.0, -1.0],
            nanometer!(175.0),
        )
        .unwrap();
        p.mirror(&vector![0.0, 0.0, 1.0]).unwrap();
        let expected = vector![1.0, 0.0, 1.0].normalize();
        assert_abs_diff_eq!(p.direction(), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(p.polarization().dot(&p.direction()), 0.0, epsilon = 1e-12);
        // the sign of the normal does not matter
        p.mirror(&vector![0.0, 0.0, -3.0]).unwrap();
        assert_abs_diff_eq!(
            p.direction(),
            vector![1.0, 0.0, -1.0].normalize(),
            epsilon = 1e-12
        );
        assert!(p.mirror(&vector![0.0, 0.0, 0.0]).is_err());
    }
    #[test]
    fn set_direction() {
        let mut p = photon();
        p.set_direction(vector![0.0, 3.0, 0.0]).unwrap();
        assert_abs_diff_eq!(p.direction(), vector![0.0, 1.0, 0.0], epsilon = 1e-12);
        assert_abs_diff_eq!(p.polarization().dot(&p.direction()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.polarization().norm(), 1.0, epsilon = 1e-12);
        assert!(p.set_direction(vector![0.0, 0.0, 0.0]).is_err());
    }
    #[test]
    fn counters() {
        let mut p = photon();
        p.add_specular_reflection();
        p.add_specular_reflection();
        p.add_diffuse_reflection();
        p.add_scatter();
        p.count_step();
        p.set_incident_angle(degree!(12.0));
        assert_eq!(p.nr_of_specular(), 2);
        assert_eq!(p.nr_of_diffuse(), 1);
        assert_eq!(p.nr_of_scatters(), 1);
        assert_eq!(p.nr_of_steps(), 1);
        assert!(p.flags().reflected && p.flags().specular && p.flags().diffuse && p.flags().scattered);
        assert_eq!(p.incident_angle(), Some(degree!(12.0)));
    }
    #[test]
    fn terminate() {
        let t = photon().terminate(TerminalState::Detected);
        assert!(t.is_detected());
        assert!(t.flags().detected);
        assert!(!t.flags().surface_absorbed && !t.flags().bulk_absorbed);
        assert_eq!(t.id(), 3);
        let t = photon().terminate(TerminalState::Undetected(UndetectedReason::Unresolved));
        assert!(t.flags().unresolved);
        assert!(!t.is_detected());
        let t = photon().terminate(TerminalState::Undetected(UndetectedReason::NoHit));
        assert!(t.flags().no_hit);
        let t = photon().terminate(TerminalState::BulkAbsorbed);
        assert!(t.flags().bulk_absorbed);
        assert_eq!(t.incident_angle_deg(), None);
    }
    #[test]
    fn display() {
        assert_eq!(
            format!("{}", TerminalState::Undetected(UndetectedReason::StepLimit)),
            "undetected (step limit)"
        );
        assert_eq!(format!("{}", TerminalState::Detected), "detected");
        assert!(format!("{}", photon()).starts_with("photon #3: pos: (0 mm, 0 mm, 0 mm)"));
    }
}
