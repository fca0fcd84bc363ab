//! Statistics & transform engine.
//!
//! Every function here is a pure function of a [`SolarTable`] and the chosen
//! metric. Absence of a required column is "no result" (`None` / empty),
//! never an error; only the significance tests have preconditions that fail
//! with [`significance::SignificanceError`].
//!
//! [`SolarTable`]: crate::data::model::SolarTable

pub mod correlation;
pub mod describe;
pub mod resample;
pub mod significance;
pub mod summary;
