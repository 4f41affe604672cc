#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! Core traits, parameter tables and numerical utilities shared by the
//! SAFT equations of state in `saft-gamma`.

pub mod constants;
mod equation_of_state;
mod errors;
pub mod numerical;
pub mod parameter;

pub use equation_of_state::{validate_density, validate_molefracs, HelmholtzContribution};
pub use errors::{EosError, EosResult};
