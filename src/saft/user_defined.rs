use super::{BondingKind, SaftVariant};
use crate::ideal_gas::IdealGasMethod;
use ndarray::{Array1, Array3};
use saft_gamma_core::parameter::ParameterTables;
use saft_gamma_core::{EosResult, HelmholtzContribution};
use std::fmt;

/// Contact values `g[sample, comp_i, comp_j]` as a function of density, temperature and mole fractions.
pub type ContactValueFn =
    Box<dyn Fn(&Array1<f64>, f64, &Array1<f64>, BondingKind) -> Array3<f64> + Send + Sync>;

/// Callback to recalculate derived parameters from the parameter tables.
pub type RefreshFn = Box<dyn FnMut(&ParameterTables) -> EosResult<()> + Send + Sync>;

/// A SAFT variant assembled from externally supplied contributions.
///
/// # Example
/// ```
/// # use saft_gamma::saft::{SaftVariant, UserDefinedSaft};
/// # use ndarray::Array3;
/// let variant = UserDefinedSaft::new("ideal", Vec::new(), Box::new(|rho, _, x, _| {
///     Array3::ones((rho.len(), x.len(), x.len()))
/// }))
/// .with_parameter("epsilonHB", [100.0, 5000.0]);
/// assert_eq!(variant.parameter_types(), &["epsilonHB"]);
/// ```
pub struct UserDefinedSaft {
    name: String,
    contributions: Vec<Box<dyn HelmholtzContribution>>,
    contact_value: ContactValueFn,
    ideal_gas_method: IdealGasMethod,
    parameter_types: Vec<&'static str>,
    bounds: Vec<[f64; 2]>,
    core_volume: Option<Array1<f64>>,
    refresh: Option<RefreshFn>,
}

impl UserDefinedSaft {
    pub fn new(
        name: &str,
        contributions: Vec<Box<dyn HelmholtzContribution>>,
        contact_value: ContactValueFn,
    ) -> Self {
        Self {
            name: name.to_string(),
            contributions,
            contact_value,
            ideal_gas_method: IdealGasMethod::default(),
            parameter_types: Vec::new(),
            bounds: Vec::new(),
            core_volume: None,
            refresh: None,
        }
    }

    /// Accept updates of `parameter` within `bounds`.
    pub fn with_parameter(mut self, parameter: &'static str, bounds: [f64; 2]) -> Self {
        self.parameter_types.push(parameter);
        self.bounds.push(bounds);
        self
    }

    /// Molar core volumes of the components in m³/mol used for the maximum density.
    pub fn with_core_volume(mut self, core_volume: Array1<f64>) -> Self {
        self.core_volume = Some(core_volume);
        self
    }

    /// Callback that is executed whenever the parameter tables changed.
    pub fn with_refresh(mut self, refresh: RefreshFn) -> Self {
        self.refresh = Some(refresh);
        self
    }
}

impl SaftVariant for UserDefinedSaft {
    fn name(&self) -> &str {
        &self.name
    }

    fn ideal_gas_method(&self) -> IdealGasMethod {
        self.ideal_gas_method
    }

    fn parameter_types(&self) -> &[&str] {
        &self.parameter_types
    }

    fn parameter_bound_extreme(&self, parameter: &str) -> Option<[f64; 2]> {
        self.parameter_types
            .iter()
            .position(|&p| p == parameter)
            .map(|i| self.bounds[i])
    }

    fn residual_contributions(&self) -> &[Box<dyn HelmholtzContribution>] {
        &self.contributions
    }

    fn calc_gr_assoc(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
        bonding: BondingKind,
    ) -> Array3<f64> {
        (self.contact_value)(density, temperature, molefracs, bonding)
    }

    /// Without core volumes the density is unbounded.
    fn density_max(&self, molefracs: &Array1<f64>, _temperature: f64, maxpack: f64) -> f64 {
        match &self.core_volume {
            Some(b) => maxpack / molefracs.dot(b),
            None => f64::INFINITY,
        }
    }

    fn parameter_refresh(&mut self, tables: &ParameterTables) -> EosResult<()> {
        match self.refresh.as_mut() {
            Some(refresh) => refresh(tables),
            None => Ok(()),
        }
    }
}

impl fmt::Display for UserDefinedSaft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (k, c) in self.contributions.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}
