//! Numeric building blocks shared by the evaluation stages.

pub mod cost;
pub mod extremum;
pub mod float;
pub mod incidence;

pub use cost::piecewise_convex_cost;
pub use extremum::{
    max_of_series, max_with_location, min_of_series, min_with_location, Extremum, Label,
};
pub use float::{clamp_hi_lo, nan_max, positive_part};
pub use incidence::Incidence;
