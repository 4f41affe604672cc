use crate::association::{
    assoc_site_indices, association_energy, calc_assoc_matrices, calc_xika,
    initiate_assoc_matrices, AssociationMatrices, AssociationMixingRules, AssociationSites,
    AssociationSolverOptions, BondingModel, RadiusReduction, SiteBonding, SiteFractions,
};
use crate::ideal_gas::IdealGasMethod;
use crate::saft::{saft_type, BondingKind, SaftVariant};
use ndarray::{arr1, Array1, Array2, Array3, AsArray};
use saft_gamma_core::constants::RGAS;
use saft_gamma_core::numerical::{central_difference, partial_density_central_difference};
use saft_gamma_core::parameter::{
    BeadLibrary, CrossLibrary, ParameterError, ParameterName, ParameterTables,
};
use saft_gamma_core::{validate_density, validate_molefracs, EosError, EosResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Customization options of a [SaftEos].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaftEosOptions {
    /// Settings of the site fraction iteration.
    pub association: AssociationSolverOptions,
    /// Site position as a fraction of the segment size, used with bonding
    /// radii if no site positions `rd` are given.
    pub reduction_ratio: f64,
    /// Replaces the combining rules of the SAFT variant.
    pub mixing_rules: Option<AssociationMixingRules>,
    /// Replaces the ideal gas method of the SAFT variant.
    pub ideal_gas_method: Option<IdealGasMethod>,
}

impl Default for SaftEosOptions {
    fn default() -> Self {
        Self {
            association: AssociationSolverOptions::default(),
            reduction_ratio: 0.25,
            mixing_rules: None,
            ideal_gas_method: None,
        }
    }
}

fn default_saft_name() -> String {
    "gamma_mie".into()
}

/// Everything needed to build a [SaftEos], e.g. from a JSON file.
///
/// ```json
/// {
///     "saft_name": "gamma_mie",
///     "beads": ["H2O"],
///     "molecular_composition": [[1.0]],
///     "bead_library": {"H2O": {"sigma": 3.0063, "...": 0.0}}
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EosConfig {
    #[serde(default = "default_saft_name")]
    pub saft_name: String,
    pub beads: Vec<String>,
    /// One row per component with the number of each bead.
    pub molecular_composition: Vec<Vec<f64>>,
    pub bead_library: BeadLibrary,
    #[serde(default)]
    pub cross_library: CrossLibrary,
    #[serde(default)]
    pub options: SaftEosOptions,
}

impl EosConfig {
    pub fn from_json<P: AsRef<Path>>(file: P) -> EosResult<Self> {
        let reader = BufReader::new(File::open(file).map_err(ParameterError::from)?);
        Ok(serde_json::from_reader(reader).map_err(ParameterError::from)?)
    }

    /// Parameter tables described by the configuration.
    pub fn parameter_tables(&self) -> EosResult<ParameterTables> {
        let ncols = self.beads.len();
        if let Some(row) = self.molecular_composition.iter().find(|r| r.len() != ncols) {
            return Err(EosError::Configuration(format!(
                "every row of the molecular composition needs {ncols} bead counts, got {}",
                row.len()
            )));
        }
        let nrows = self.molecular_composition.len();
        let molecular_composition = Array2::from_shape_vec(
            (nrows, ncols),
            self.molecular_composition.concat(),
        )
        .map_err(|e| EosError::Configuration(e.to_string()))?;
        Ok(ParameterTables::new(
            self.beads.clone(),
            molecular_composition,
            self.bead_library.clone(),
            self.cross_library.clone(),
        )?)
    }
}

/// Association sites and tensors derived from the parameter tables.
struct AssociationState {
    sites: AssociationSites,
    matrices: AssociationMatrices,
    flag_assoc: bool,
}

impl AssociationState {
    fn new(
        tables: &ParameterTables,
        mixing_rules: &AssociationMixingRules,
    ) -> Result<Self, ParameterError> {
        let sites = initiate_assoc_matrices(
            tables.beads(),
            tables.bead_library(),
            tables.molecular_composition(),
        )?;
        let matrices = calc_assoc_matrices(
            tables.beads(),
            tables.bead_library(),
            tables.molecular_composition(),
            &sites,
            tables.cross_library(),
            mixing_rules,
        )?;
        let flag_assoc = sites.flag_assoc && matrices.is_active();
        Ok(Self {
            sites,
            matrices,
            flag_assoc,
        })
    }
}

/// Group contribution SAFT equation of state.
///
/// The residual Helmholtz energy is the sum of the contributions of a
/// [SaftVariant] and of the association between sites on the beads. All
/// quantities are evaluated for a batch of densities at once and returned
/// per density sample.
///
/// The parameter tables are owned by the equation of state. Parameters are
/// changed with [SaftEos::update_parameter], after which every evaluation
/// fails with [EosError::StaleParameters] until [SaftEos::parameter_refresh]
/// has been called.
pub struct SaftEos {
    tables: ParameterTables,
    variant: Box<dyn SaftVariant>,
    options: SaftEosOptions,
    mixing_rules: AssociationMixingRules,
    ideal_gas_method: IdealGasMethod,
    masses: Array1<f64>,
    association: AssociationState,
    refreshed: u64,
}

impl SaftEos {
    /// Equation of state of the built-in variant `saft_name` with default options.
    pub fn new(saft_name: &str, tables: ParameterTables) -> EosResult<Self> {
        Self::with_options(saft_name, tables, SaftEosOptions::default())
    }

    pub fn with_options(
        saft_name: &str,
        tables: ParameterTables,
        options: SaftEosOptions,
    ) -> EosResult<Self> {
        let variant = saft_type(saft_name, &tables)?;
        Self::from_variant(variant, tables, options)
    }

    /// Equation of state of an arbitrary variant, which has to be
    /// consistent with `tables`.
    pub fn from_variant(
        variant: Box<dyn SaftVariant>,
        tables: ParameterTables,
        options: SaftEosOptions,
    ) -> EosResult<Self> {
        if !(options.reduction_ratio > 0.0) {
            return Err(EosError::Configuration(format!(
                "the reduction ratio has to be positive, got {}",
                options.reduction_ratio
            )));
        }
        let mixing_rules = match options.mixing_rules {
            Some(rules) => {
                info!(?rules, variant = variant.name(), "overriding association mixing rules");
                rules
            }
            None => variant.mixing_rules(),
        };
        let ideal_gas_method = match options.ideal_gas_method {
            Some(method) => {
                info!(%method, variant = variant.name(), "overriding ideal gas method");
                method
            }
            None => variant.ideal_gas_method(),
        };
        let masses = tables.component_masses()?;
        let association = AssociationState::new(&tables, &mixing_rules)?;
        debug!(
            variant = variant.name(),
            components = tables.components(),
            beads = tables.beads().len(),
            sites = association.sites.sitenames.len(),
            flag_assoc = association.flag_assoc,
            "initialized equation of state"
        );
        Ok(Self {
            refreshed: tables.generation(),
            tables,
            variant,
            options,
            mixing_rules,
            ideal_gas_method,
            masses,
            association,
        })
    }

    pub fn from_config(config: EosConfig) -> EosResult<Self> {
        let tables = config.parameter_tables()?;
        Self::with_options(&config.saft_name, tables, config.options)
    }

    pub fn components(&self) -> usize {
        self.tables.components()
    }

    pub fn beads(&self) -> &[String] {
        self.tables.beads()
    }

    pub fn parameter_tables(&self) -> &ParameterTables {
        &self.tables
    }

    pub fn variant(&self) -> &dyn SaftVariant {
        self.variant.as_ref()
    }

    pub fn options(&self) -> &SaftEosOptions {
        &self.options
    }

    pub fn mixing_rules(&self) -> &AssociationMixingRules {
        &self.mixing_rules
    }

    pub fn ideal_gas_method(&self) -> IdealGasMethod {
        self.ideal_gas_method
    }

    /// Molar masses of the components in kg/mol.
    pub fn masses(&self) -> &Array1<f64> {
        &self.masses
    }

    pub fn sitenames(&self) -> &[String] {
        &self.association.sites.sitenames
    }

    pub fn association_sites(&self) -> &AssociationSites {
        &self.association.sites
    }

    pub fn association_matrices(&self) -> &AssociationMatrices {
        &self.association.matrices
    }

    /// Whether the association contribution is evaluated.
    pub fn flag_assoc(&self) -> bool {
        self.association.flag_assoc
    }

    fn ensure_fresh(&self) -> EosResult<()> {
        let current = self.tables.generation();
        if current != self.refreshed {
            return Err(EosError::StaleParameters {
                current,
                refreshed: self.refreshed,
            });
        }
        Ok(())
    }

    fn validate<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        validate_molefracs(molefracs, self.components())?;
        let density = validate_density(density)?;
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(EosError::InvalidInput(format!(
                "Temperature has to be positive and finite, got {temperature}"
            )));
        }
        self.ensure_fresh()?;
        Ok(density)
    }

    /// Reduced residual Helmholtz energy $\frac{A^\mathrm{res}}{Nk_BT}$ for
    /// every density sample in mol/m³.
    pub fn residual_helmholtz_energy<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        let density = self.validate(density, temperature, molefracs)?;
        let mut a = Array1::zeros(density.len());
        for contribution in self.variant.residual_contributions() {
            a += &contribution.helmholtz_energy(&density, temperature, molefracs);
        }
        if self.association.flag_assoc {
            a += &self.assoc_energy(&density, temperature, molefracs)?;
        }
        Ok(a)
    }

    /// Reduced ideal gas Helmholtz energy for every density sample.
    pub fn ideal_helmholtz_energy<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        let density = self.validate(density, temperature, molefracs)?;
        Ok(self
            .ideal_gas_method
            .helmholtz_energy(&density, temperature, molefracs, &self.masses))
    }

    /// Reduced Helmholtz energy $\frac{A}{Nk_BT}$ including the ideal gas
    /// contribution for every density sample.
    pub fn helmholtz_energy<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        let density = self.validate(density, temperature, molefracs)?;
        let ideal = self
            .ideal_gas_method
            .helmholtz_energy(&density, temperature, molefracs, &self.masses);
        Ok(ideal + self.residual_helmholtz_energy(&density, temperature, molefracs)?)
    }

    /// Reduced association Helmholtz energy for every density sample.
    ///
    /// Without active association sites this is zero and no site fractions
    /// are calculated.
    pub fn association_helmholtz_energy<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        let density = self.validate(density, temperature, molefracs)?;
        if !self.association.flag_assoc {
            return Ok(Array1::zeros(density.len()));
        }
        self.assoc_energy(&density, temperature, molefracs)
    }

    /// Fractions of non-bonded sites for every density sample.
    pub fn site_fractions<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<SiteFractions> {
        let density = self.validate(density, temperature, molefracs)?;
        self.solve_site_fractions(&density, temperature, molefracs)
    }

    fn assoc_energy(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        let fractions = self.solve_site_fractions(density, temperature, molefracs)?;
        Ok(association_energy(
            &fractions,
            molefracs,
            &self.association.sites.nk,
            self.tables.molecular_composition(),
        ))
    }

    fn solve_site_fractions(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<SiteFractions> {
        let sites = &self.association.sites;
        let matrices = &self.association.matrices;
        let mc = self.tables.molecular_composition();
        let indices = assoc_site_indices(&sites.nk, mc, molefracs);
        let solve = |bonding: SiteBonding, gr: &Array3<f64>| {
            calc_xika(
                &indices,
                density,
                temperature,
                molefracs,
                &sites.nk,
                mc,
                &matrices.epsilon_hb,
                bonding,
                gr,
                &self.options.association,
            )
        };
        match &matrices.bonding {
            BondingModel::Volume(kklab) => {
                let gr = self.variant.calc_gr_assoc(
                    density,
                    temperature,
                    molefracs,
                    BondingKind::Klab,
                );
                solve(SiteBonding::Klab(kklab), &gr)
            }
            BondingModel::Radius { rc_klab, rd_klab } => {
                let reduction = match rd_klab {
                    Some(rd) => RadiusReduction::Explicit(rd),
                    None => RadiusReduction::Ratio(self.options.reduction_ratio),
                };
                let kijklab = self.variant.calc_kijklab(temperature, rc_klab, reduction)?;
                let gr = self.variant.calc_gr_assoc(
                    density,
                    temperature,
                    molefracs,
                    BondingKind::Ijklab,
                );
                solve(SiteBonding::Ijklab(&kijklab), &gr)
            }
        }
    }

    /// Pressure $p=RT\rho^2\frac{\partial a}{\partial\rho}$ in Pa for every
    /// density sample, from a central difference with step `step_size` in mol/m³.
    pub fn pressure<'a>(
        &self,
        density: impl AsArray<'a, f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
        step_size: f64,
    ) -> EosResult<Array1<f64>> {
        let density = self.validate(density, temperature, molefracs)?;
        if !(step_size > 0.0) {
            return Err(EosError::InvalidInput(format!(
                "The step size has to be positive, got {step_size}"
            )));
        }
        if density.iter().any(|&rho| rho <= step_size) {
            return Err(EosError::InvalidInput(format!(
                "Density values have to be larger than the step size {step_size}"
            )));
        }
        let da_drho = central_difference(
            &density,
            |rho| self.helmholtz_energy(rho, temperature, molefracs),
            step_size,
        )?;
        Ok(&density * &density * da_drho * (RGAS * temperature))
    }

    /// Fugacity coefficients of every component at the pressure `pressure`
    /// in Pa and the density `density` in mol/m³.
    ///
    /// $$\ln\varphi_i=\frac{A^\mathrm{res}}{Nk_BT}+\rho\frac{\partial}{\partial\rho_i}\frac{A^\mathrm{res}}{Nk_BT}-\ln Z$$
    ///
    /// The derivatives are obtained from finite differences with step `step_size`,
    /// which is relative in $\ln\rho_i$ if `log_method` is set.
    ///
    /// $\ln Z$ is undefined for a pressure that is not positive. The coefficients
    /// of such a state are `NaN` and a warning is emitted.
    pub fn fugacity_coefficient(
        &self,
        pressure: f64,
        density: f64,
        molefracs: &Array1<f64>,
        temperature: f64,
        step_size: f64,
        log_method: bool,
    ) -> EosResult<Array1<f64>> {
        let density_array = arr1(&[density]);
        self.validate(&density_array, temperature, molefracs)?;
        if !(density > 0.0 && pressure.is_finite() && step_size > 0.0) {
            return Err(EosError::InvalidInput(format!(
                "Density and step size have to be positive and pressure finite, got p={pressure}, rho={density}, step={step_size}"
            )));
        }
        if pressure <= 0.0 {
            warn!(
                pressure,
                density, temperature, "non-positive pressure, fugacity coefficients are undefined"
            );
            return Ok(Array1::from_elem(molefracs.len(), f64::NAN));
        }
        let a_res = self.residual_helmholtz_energy(&density_array, temperature, molefracs)?[0];
        let da_drhoi = partial_density_central_difference(
            molefracs,
            density,
            temperature,
            |rho, t, x| self.residual_helmholtz_energy(rho, t, x),
            step_size,
            log_method,
        )?;
        let z = pressure / (density * RGAS * temperature);
        Ok((da_drhoi * density + a_res - z.ln()).mapv(f64::exp))
    }

    /// Maximum molar density in mol/m³ at the packing fraction `maxpack`.
    pub fn density_max(
        &self,
        molefracs: &Array1<f64>,
        temperature: f64,
        maxpack: f64,
    ) -> EosResult<f64> {
        validate_molefracs(molefracs, self.components())?;
        self.ensure_fresh()?;
        Ok(self.variant.density_max(molefracs, temperature, maxpack))
    }

    /// Set a self (one bead name) or cross (two bead names) parameter.
    ///
    /// Site pair parameters are given as `<base>-<site1>-<site2>`. The
    /// equation of state cannot be evaluated until [SaftEos::parameter_refresh]
    /// is called.
    pub fn update_parameter(
        &mut self,
        name: &str,
        bead_names: &[&str],
        value: f64,
    ) -> EosResult<()> {
        self.check_parameter(name, bead_names)?;
        Ok(self.tables.update_parameter(name, bead_names, value)?)
    }

    /// Update several parameters of `fit_bead` and refresh.
    ///
    /// A name `<parameter>_<bead>` addresses the cross interaction of
    /// `fit_bead` with `bead`. If any name is invalid, no parameter is changed.
    pub fn update_parameters(
        &mut self,
        fit_bead: &str,
        names: &[&str],
        values: &[f64],
    ) -> EosResult<()> {
        if names.len() != values.len() {
            return Err(EosError::InvalidInput(format!(
                "{} parameter names were given for {} values",
                names.len(),
                values.len()
            )));
        }
        let mut updates = Vec::with_capacity(names.len());
        for name in names {
            let (parameter, bead_names) = match name.split('_').collect::<Vec<_>>()[..] {
                [parameter] => (parameter, vec![fit_bead]),
                [parameter, bead] => (parameter, vec![fit_bead, bead]),
                _ => {
                    return Err(ParameterError::IncompatibleParameters(format!(
                        "`{name}` has to be `<parameter>` or `<parameter>_<bead>`"
                    ))
                    .into())
                }
            };
            self.check_parameter(parameter, &bead_names)?;
            updates.push((parameter, bead_names));
        }
        for ((parameter, bead_names), &value) in updates.into_iter().zip(values) {
            self.tables.update_parameter(parameter, &bead_names, value)?;
        }
        self.parameter_refresh()
    }

    /// Check that `name` is a parameter of this variant on known sites and beads.
    fn check_parameter(&self, name: &str, bead_names: &[&str]) -> EosResult<()> {
        let parameter = ParameterName::parse(name);
        if !self.variant.parameter_types().contains(&parameter.base.as_str()) {
            return Err(ParameterError::UnknownParameter(name.to_string()).into());
        }
        match parameter.sites.len() {
            0 => (),
            2 => {
                if let Some(site) = parameter
                    .sites
                    .iter()
                    .find(|&s| !self.association.sites.sitenames.contains(s))
                {
                    return Err(ParameterError::IncompatibleParameters(format!(
                        "`{name}` refers to the unknown association site `{site}`, available: {}",
                        self.association.sites.sitenames.join(", ")
                    ))
                    .into());
                }
            }
            _ => {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "`{name}` has to be `{}` or name two association sites",
                    parameter.base
                ))
                .into())
            }
        }
        if let Some(bead) = bead_names
            .iter()
            .find(|&&b| !self.tables.beads().iter().any(|known| known == b))
        {
            return Err(ParameterError::ComponentsNotFound(bead.to_string()).into());
        }
        if !matches!(bead_names.len(), 1 | 2) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "parameter `{name}` has to be given for one or two beads, got {}",
                bead_names.len()
            ))
            .into());
        }
        Ok(())
    }

    /// Recalculate all quantities derived from the parameter tables.
    pub fn parameter_refresh(&mut self) -> EosResult<()> {
        self.variant.parameter_refresh(&self.tables)?;
        self.masses = self.tables.component_masses()?;
        self.association = AssociationState::new(&self.tables, &self.mixing_rules)?;
        self.refreshed = self.tables.generation();
        debug!(
            generation = self.refreshed,
            flag_assoc = self.association.flag_assoc,
            "refreshed parameters"
        );
        Ok(())
    }

    /// Initial guess of a parameter: its current value, or the center of its
    /// extreme bounds if it is not set.
    pub fn guess_parameters(&self, parameter: &str, bead_names: &[&str]) -> EosResult<f64> {
        if let Some(value) = self.tables.parameter(parameter, bead_names) {
            return Ok(value);
        }
        let [lower, upper] = self.extreme_bounds(parameter)?;
        Ok(0.5 * (lower + upper))
    }

    /// Restrict `bounds` to the extreme bounds of the parameter, or return
    /// the extreme bounds if none are given.
    pub fn check_bounds(&self, parameter: &str, bounds: Option<[f64; 2]>) -> EosResult<[f64; 2]> {
        let [lower, upper] = self.extreme_bounds(parameter)?;
        let Some([lo, hi]) = bounds else {
            return Ok([lower, upper]);
        };
        if lo > hi {
            return Err(EosError::InvalidInput(format!(
                "the lower bound {lo} of `{parameter}` exceeds the upper bound {hi}"
            )));
        }
        let clamped = [lo.clamp(lower, upper), hi.clamp(lower, upper)];
        if clamped != [lo, hi] {
            warn!(
                parameter,
                bounds = ?[lo, hi],
                clamped = ?clamped,
                "bounds exceed the extreme bounds of the parameter"
            );
        }
        Ok(clamped)
    }

    fn extreme_bounds(&self, parameter: &str) -> EosResult<[f64; 2]> {
        let base = ParameterName::parse(parameter).base;
        self.variant
            .parameter_bound_extreme(&base)
            .ok_or_else(|| ParameterError::UnknownParameter(parameter.to_string()).into())
    }
}

impl fmt::Display for SaftEos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaftEos({}", self.variant)?;
        write!(f, ", beads=[{}]", self.tables.beads().join(", "))?;
        write!(f, ", masses={}", self.masses)?;
        write!(f, ", sites=[{}])", self.association.sites.sitenames.join(", "))
    }
}
