/// Proximity analysis for the flood proximity service.
///
/// Everything here is a pure function of its inputs: no clocks, no I/O,
/// no shared state. The view recomputes from scratch whenever the user's
/// position or the station list changes.
///
/// Submodules:
/// - `distance`: great-circle distance between two coordinates.
/// - `proximity`: distance-annotated, nearest-first station ranking.

pub mod distance;
pub mod proximity;
