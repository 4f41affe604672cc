//! Collection of ideal gas models.
use ndarray::Array1;
use saft_gamma_core::constants::{KB, NAV, PLANCK};
use saft_gamma_core::EosError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Methods for the ideal gas contribution to the Helmholtz energy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdealGasMethod {
    /// Translational contribution from the thermal de Broglie wavelength
    /// $$\frac{A^\mathrm{ig}}{Nk_BT}=\sum_{i,x_i>0}x_i\ln\left(x_i\rho N_A\Lambda_i^3\right)-1,~~~~\Lambda_i=\frac{h}{\sqrt{2\pi m_ik_BT}}$$
    #[default]
    #[serde(rename = "Abroglie")]
    DeBroglie,
}

impl IdealGasMethod {
    /// Reduced ideal gas Helmholtz energy for every density sample (mol/m³).
    ///
    /// `masses` are the molar masses of the components in kg/mol.
    pub fn helmholtz_energy(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
        masses: &Array1<f64>,
    ) -> Array1<f64> {
        match self {
            Self::DeBroglie => {
                let lambda3 = masses.mapv(|m| de_broglie_wavelength(m, temperature).powi(3));
                density.mapv(|rho| {
                    molefracs
                        .iter()
                        .zip(lambda3.iter())
                        .filter(|(&x, _)| x > 0.0)
                        .map(|(&x, &l3)| x * (x * rho * NAV * l3).ln())
                        .sum::<f64>()
                        - 1.0
                })
            }
        }
    }
}

/// Thermal de Broglie wavelength in m of a molecule with molar mass `mass` in kg/mol.
pub fn de_broglie_wavelength(mass: f64, temperature: f64) -> f64 {
    PLANCK / (2.0 * PI * mass / NAV * KB * temperature).sqrt()
}

impl FromStr for IdealGasMethod {
    type Err = EosError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "Abroglie" => Ok(Self::DeBroglie),
            _ => Err(EosError::Configuration(format!(
                "unknown ideal gas method `{name}`, available: Abroglie"
            ))),
        }
    }
}

impl fmt::Display for IdealGasMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeBroglie => write!(f, "Abroglie"),
        }
    }
}
