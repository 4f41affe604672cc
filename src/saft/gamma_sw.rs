use super::{
    bead_pair_parameters, bead_parameters, bead_parameters_or, segment_weights, BondingKind,
    SaftVariant,
};
use crate::association::{calc_kijklab_from_radius, RadiusReduction};
use crate::hard_sphere::{HardChain, HardSphere, HardSphereProperties};
use ndarray::{Array1, Array2, Array3, Array4, Array6};
use num_dual::DualNum;
use saft_gamma_core::constants::{ANGSTROM3, NAV};
use saft_gamma_core::parameter::{ParameterError, ParameterTables};
use saft_gamma_core::{EosResult, HelmholtzContribution};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const PARAMETER_TYPES: [&str; 8] = [
    "sigma", "epsilon", "lambda", "Sk", "epsilonHB", "K", "rc", "rd",
];

/// Bead parameters of SAFT-γ SW.
///
/// Only the segment size enters the hard-sphere reference; the well depth
/// `epsilon` and range `lambda` are kept for dispersion contributions.
#[derive(Clone, Debug)]
pub struct GammaSwParameters {
    pub sigma: Array1<f64>,
    pub epsilon: Array1<f64>,
    pub lambda: Array1<f64>,
    pub sigma_kl: Array2<f64>,
    weights: Array2<f64>,
}

impl GammaSwParameters {
    pub fn new(tables: &ParameterTables) -> Result<Self, ParameterError> {
        let sigma = bead_parameters(tables, "sigma")?;
        let sigma_kl = bead_pair_parameters(tables, "sigma", &sigma, |s1, s2| 0.5 * (s1 + s2));
        Ok(Self {
            sigma,
            epsilon: bead_parameters_or(tables, "epsilon", 0.0),
            lambda: bead_parameters_or(tables, "lambda", 0.0),
            sigma_kl,
            weights: segment_weights(tables),
        })
    }
}

impl HardSphereProperties for GammaSwParameters {
    fn segment_weights(&self) -> &Array2<f64> {
        &self.weights
    }

    fn hs_diameter<D: DualNum<f64> + Copy>(&self, _: D) -> Array1<D> {
        self.sigma.mapv(D::from)
    }
}

/// SAFT-γ SW with hard-sphere and hard-chain contributions.
pub struct GammaSw {
    parameters: Arc<GammaSwParameters>,
    contributions: Vec<Box<dyn HelmholtzContribution>>,
}

impl GammaSw {
    pub fn new(tables: &ParameterTables) -> EosResult<Self> {
        let parameters = Arc::new(GammaSwParameters::new(tables)?);
        Ok(Self {
            contributions: vec![
                Box::new(HardSphere::new(&parameters)),
                Box::new(HardChain::new(&parameters)),
            ],
            parameters,
        })
    }

    pub fn parameters(&self) -> &GammaSwParameters {
        &self.parameters
    }
}

impl SaftVariant for GammaSw {
    fn name(&self) -> &str {
        "gamma_sw"
    }

    fn parameter_types(&self) -> &[&str] {
        &PARAMETER_TYPES
    }

    fn parameter_bound_extreme(&self, parameter: &str) -> Option<[f64; 2]> {
        match parameter {
            "sigma" => Some([2.0, 9.0]),
            "epsilon" => Some([10.0, 1000.0]),
            "lambda" => Some([1.1, 1.8]),
            "Sk" => Some([0.1, 1.0]),
            "epsilonHB" => Some([100.0, 5000.0]),
            "K" => Some([0.1 * ANGSTROM3 * NAV, 1e4 * ANGSTROM3 * NAV]),
            "rc" | "rd" => Some([0.1, 10.0]),
            _ => None,
        }
    }

    fn residual_contributions(&self) -> &[Box<dyn HelmholtzContribution>] {
        &self.contributions
    }

    fn calc_gr_assoc(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
        _bonding: BondingKind,
    ) -> Array3<f64> {
        self.parameters.contact_value(density, temperature, molefracs)
    }

    fn calc_kijklab(
        &self,
        temperature: f64,
        rc_klab: &Array4<f64>,
        reduction: RadiusReduction,
    ) -> EosResult<Array6<f64>> {
        let d = self.parameters.component_diameter(temperature);
        let d_ij = Array2::from_shape_fn((d.len(), d.len()), |(i, j)| 0.5 * (d[i] + d[j]));
        Ok(calc_kijklab_from_radius(
            &d_ij,
            &self.parameters.sigma_kl,
            rc_klab,
            reduction,
        ))
    }

    fn density_max(&self, molefracs: &Array1<f64>, temperature: f64, maxpack: f64) -> f64 {
        let [zeta3] = self.parameters.zeta(temperature, 1.0, molefracs, [3]);
        maxpack / zeta3
    }

    fn parameter_refresh(&mut self, tables: &ParameterTables) -> EosResult<()> {
        self.parameters = Arc::new(GammaSwParameters::new(tables)?);
        self.contributions = vec![
            Box::new(HardSphere::new(&self.parameters)),
            Box::new(HardChain::new(&self.parameters)),
        ];
        debug!(beads = tables.beads().len(), "refreshed gamma_sw parameters");
        Ok(())
    }
}

impl fmt::Display for GammaSw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SAFT-γ SW(Hard Sphere, Hard Chain)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use saft_gamma_core::parameter::{BeadLibrary, CrossLibrary};

    fn tables() -> ParameterTables {
        let library: BeadLibrary = serde_json::from_str(
            r#"{
                "CH3": {"sigma": 3.7, "epsilon": 250.0, "lambda": 1.5, "Sk": 0.6, "mass": 0.015035},
                "CH2": {"sigma": 4.0, "epsilon": 270.0, "lambda": 1.5, "Sk": 0.4, "mass": 0.014027}
            }"#,
        )
        .unwrap();
        ParameterTables::new(
            vec!["CH3".into(), "CH2".into()],
            arr2(&[[2.0, 1.0]]),
            library,
            CrossLibrary::default(),
        )
        .unwrap()
    }

    #[test]
    fn temperature_independent_diameter() {
        let eos = GammaSw::new(&tables()).unwrap();
        let p = eos.parameters();
        assert_eq!(p.hs_diameter(200.0), p.hs_diameter(500.0));
        assert_eq!(p.hs_diameter(300.0), arr1(&[3.7, 4.0]));
        assert_relative_eq!(p.chain_length()[0], 2.0 * 0.6 + 0.4, max_relative = 1e-14);
    }

    #[test]
    fn refresh_follows_tables() {
        let mut t = tables();
        let mut eos = GammaSw::new(&t).unwrap();
        let x = arr1(&[1.0]);
        let rho_max = eos.density_max(&x, 300.0, 0.5);
        t.update_parameter("sigma", &["CH2"], 4.5).unwrap();
        eos.parameter_refresh(&t).unwrap();
        assert_eq!(eos.parameters().sigma[1], 4.5);
        assert!(eos.density_max(&x, 300.0, 0.5) < rho_max);
        assert!(eos.calc_kijklab(300.0, &Array4::zeros((2, 2, 0, 0)), RadiusReduction::Ratio(0.25)).is_ok());
    }
}
