//! SAFT variants that supply the non-association contributions of a [SaftEos](crate::SaftEos).
use crate::association::{AssociationMixingRules, RadiusReduction};
use crate::ideal_gas::IdealGasMethod;
use ndarray::{Array1, Array2, Array3, Array4, Array6};
use saft_gamma_core::parameter::{ParameterError, ParameterTables};
use saft_gamma_core::{EosError, EosResult, HelmholtzContribution};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "gamma_mie")]
mod gamma_mie;
#[cfg(feature = "gamma_sw")]
mod gamma_sw;
mod user_defined;
#[cfg(feature = "gamma_mie")]
pub use gamma_mie::{GammaMie, GammaMieParameters};
#[cfg(feature = "gamma_sw")]
pub use gamma_sw::{GammaSw, GammaSwParameters};
pub use user_defined::{ContactValueFn, RefreshFn, UserDefinedSaft};

/// Bonding model the contact values are used with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BondingKind {
    /// Tabulated bonding volumes `Kklab`.
    Klab,
    /// Bonding volumes `Kijklab` from bonding radii.
    Ijklab,
}

/// Capabilities a SAFT variant has to provide to an equation of state.
///
/// The variant owns everything that depends on the functional form of the
/// model: the residual contributions apart from association, the contact
/// values used in the association strength and the parameters it accepts.
pub trait SaftVariant: fmt::Display + Send + Sync {
    /// Name of the variant, e.g. `gamma_mie`.
    fn name(&self) -> &str;

    /// Default method of the ideal gas contribution.
    fn ideal_gas_method(&self) -> IdealGasMethod {
        IdealGasMethod::DeBroglie
    }

    /// Base names of all parameters that can be updated.
    fn parameter_types(&self) -> &[&str];

    /// The widest physically meaningful bounds of a parameter.
    fn parameter_bound_extreme(&self, parameter: &str) -> Option<[f64; 2]>;

    /// Default combining rules of the association parameters.
    fn mixing_rules(&self) -> AssociationMixingRules {
        AssociationMixingRules::default()
    }

    /// Residual contributions in the order they are evaluated.
    fn residual_contributions(&self) -> &[Box<dyn HelmholtzContribution>];

    /// Contact values `g[sample, comp_i, comp_j]` entering the association strength.
    fn calc_gr_assoc(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
        bonding: BondingKind,
    ) -> Array3<f64>;

    /// Bonding volumes `Kijklab` in m³/mol from the bonding radii `rc_klab` in Å.
    fn calc_kijklab(
        &self,
        _temperature: f64,
        _rc_klab: &Array4<f64>,
        _reduction: RadiusReduction,
    ) -> EosResult<Array6<f64>> {
        Err(EosError::Configuration(format!(
            "the SAFT variant `{}` does not support bonding radii",
            self.name()
        )))
    }

    /// Maximum molar density in mol/m³ at the packing fraction `maxpack`.
    fn density_max(&self, molefracs: &Array1<f64>, temperature: f64, maxpack: f64) -> f64;

    /// Recalculate all derived parameters from the current tables.
    fn parameter_refresh(&mut self, tables: &ParameterTables) -> EosResult<()>;
}

/// Built-in SAFT variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaftName {
    GammaMie,
    GammaSw,
}

impl SaftName {
    /// Instantiate the variant from parameter tables.
    pub fn build(&self, tables: &ParameterTables) -> EosResult<Box<dyn SaftVariant>> {
        match self {
            #[cfg(feature = "gamma_mie")]
            Self::GammaMie => Ok(Box::new(GammaMie::new(tables)?)),
            #[cfg(feature = "gamma_sw")]
            Self::GammaSw => Ok(Box::new(GammaSw::new(tables)?)),
            #[allow(unreachable_patterns)]
            _ => Err(EosError::Configuration(format!(
                "the SAFT variant `{self}` is not enabled in this build"
            ))),
        }
    }
}

impl FromStr for SaftName {
    type Err = EosError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "gamma_mie" => Ok(Self::GammaMie),
            "gamma_sw" => Ok(Self::GammaSw),
            _ => Err(EosError::Configuration(format!(
                "unknown SAFT variant `{name}`, available: gamma_mie, gamma_sw"
            ))),
        }
    }
}

impl fmt::Display for SaftName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GammaMie => write!(f, "gamma_mie"),
            Self::GammaSw => write!(f, "gamma_sw"),
        }
    }
}

/// Instantiate the built-in variant `name` from parameter tables.
pub fn saft_type(name: &str, tables: &ParameterTables) -> EosResult<Box<dyn SaftVariant>> {
    name.parse::<SaftName>()?.build(tables)
}

/// Required self interaction parameter of every bead.
pub(crate) fn bead_parameters(
    tables: &ParameterTables,
    parameter: &str,
) -> Result<Array1<f64>, ParameterError> {
    (0..tables.beads().len())
        .map(|k| tables.bead_parameter(k, parameter))
        .collect::<Result<Vec<_>, _>>()
        .map(Array1::from)
}

/// Optional self interaction parameter of every bead.
pub(crate) fn bead_parameters_or(tables: &ParameterTables, parameter: &str, default: f64) -> Array1<f64> {
    Array1::from_shape_fn(tables.beads().len(), |k| {
        tables.bead_record(k).get(parameter).unwrap_or(default)
    })
}

/// Segment weights $w_{ik}=\nu_{ik}V_kS_k$ with $V_k$ (`Vks`) and $S_k$ (`Sk`) defaulting to 1.
pub(crate) fn segment_weights(tables: &ParameterTables) -> Array2<f64> {
    let vks = bead_parameters_or(tables, "Vks", 1.0);
    let sk = bead_parameters_or(tables, "Sk", 1.0);
    tables.molecular_composition() * &(vks * sk)
}

/// Bead pair parameter from the cross library, or from combining the self
/// interactions with `rule` if it is not set.
pub(crate) fn bead_pair_parameters<F: Fn(f64, f64) -> f64>(
    tables: &ParameterTables,
    parameter: &str,
    self_values: &Array1<f64>,
    rule: F,
) -> Array2<f64> {
    let beads = tables.beads();
    Array2::from_shape_fn((beads.len(), beads.len()), |(k, l)| {
        if k == l {
            return self_values[k];
        }
        tables
            .cross_library()
            .parameter(&beads[k], &beads[l], parameter)
            .unwrap_or_else(|| rule(self_values[k], self_values[l]))
    })
}
