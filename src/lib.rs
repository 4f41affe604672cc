#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! Group contribution SAFT equations of state.
//!
//! A [SaftEos] combines the residual Helmholtz energy contributions of a
//! [SaftVariant](saft::SaftVariant), e.g. SAFT-γ Mie, with the association
//! between sites on the beads and an ideal gas contribution. Every quantity
//! is evaluated for a batch of molar densities at once.
//!
//! ```no_run
//! # use saft_gamma::{EosConfig, SaftEos};
//! # use ndarray::arr1;
//! # fn main() -> Result<(), saft_gamma_core::EosError> {
//! let eos = SaftEos::from_config(EosConfig::from_json("water.json")?)?;
//! let a_res = eos.residual_helmholtz_energy(&[100.0, 1000.0][..], 300.0, &arr1(&[1.0]))?;
//! assert_eq!(a_res.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod association;
mod eos;
pub mod hard_sphere;
pub mod ideal_gas;
pub mod saft;

pub use eos::{EosConfig, SaftEos, SaftEosOptions};
pub use saft_gamma_core::{EosError, EosResult};
