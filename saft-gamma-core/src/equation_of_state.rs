use crate::{EosError, EosResult};
use ndarray::{Array1, ArrayView1, AsArray};
use std::fmt;

/// Individual residual Helmholtz energy contribution.
///
/// Implementors evaluate the reduced Helmholtz energy $\frac{A}{Nk_BT}$ for
/// every density sample at once. The returned array is aligned with `density`.
pub trait HelmholtzContribution: fmt::Display + Send + Sync {
    /// Reduced Helmholtz energy for each density sample (mol/m³) at the
    /// temperature `temperature` (K) and composition `molefracs`.
    fn helmholtz_energy(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> Array1<f64>;
}

/// Normalize densities to a non-empty 1-D array of finite, non-negative values.
pub fn validate_density<'a>(density: impl AsArray<'a, f64>) -> EosResult<Array1<f64>> {
    let density: ArrayView1<f64> = density.into();
    if density.iter().any(|rho| rho.is_nan()) {
        return Err(EosError::InvalidInput(
            "NaN was given as a value of density".into(),
        ));
    }
    if density.is_empty() {
        return Err(EosError::InvalidInput("No value of density was given".into()));
    }
    if density.iter().any(|rho| rho.is_infinite()) {
        return Err(EosError::InvalidInput(
            "Density values have to be finite".into(),
        ));
    }
    if density.iter().any(|&rho| rho < 0.0) {
        return Err(EosError::InvalidInput(
            "Density values cannot be negative".into(),
        ));
    }
    Ok(density.to_owned())
}

/// Check that the mole fractions match the number of components and are non-negative.
pub fn validate_molefracs(molefracs: &Array1<f64>, components: usize) -> EosResult<()> {
    if molefracs.len() != components {
        return Err(EosError::IncompatibleComponents(components, molefracs.len()));
    }
    if molefracs.iter().any(|&x| x < 0.0 || x.is_nan()) {
        return Err(EosError::InvalidInput(
            "Mole fractions cannot be less than zero".into(),
        ));
    }
    Ok(())
}
