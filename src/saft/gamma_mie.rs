use super::{
    bead_pair_parameters, bead_parameters, segment_weights, BondingKind, SaftVariant,
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

/// 10-point Gauss-Legendre quadrature [position, weight]
const GLQ10: [[f64; 2]; 10] = [
    [-0.1488743389816312, 0.2955242247147529],
    [0.1488743389816312, 0.2955242247147529],
    [-0.4333953941292472, 0.2692667193099963],
    [0.4333953941292472, 0.2692667193099963],
    [-0.6794095682990244, 0.219086362515982],
    [0.6794095682990244, 0.219086362515982],
    [-0.8650633666889845, 0.1494513491505806],
    [0.8650633666889845, 0.1494513491505806],
    [-0.9739065285171717, 0.0666713443086881],
    [0.9739065285171717, 0.0666713443086881],
];

const PARAMETER_TYPES: [&str; 9] = [
    "sigma", "epsilon", "lambdar", "lambdaa", "Sk", "epsilonHB", "K", "rc", "rd",
];

/// Bead parameters of SAFT-γ Mie.
#[derive(Clone, Debug)]
pub struct GammaMieParameters {
    /// Segment size in Å
    pub sigma: Array1<f64>,
    /// Dispersion energy in K
    pub epsilon: Array1<f64>,
    /// Repulsive exponent
    pub lambda_r: Array1<f64>,
    /// Attractive exponent
    pub lambda_a: Array1<f64>,
    /// Prefactor of the Mie potential
    pub c: Array1<f64>,
    pub sigma_kl: Array2<f64>,
    weights: Array2<f64>,
}

impl GammaMieParameters {
    pub fn new(tables: &ParameterTables) -> Result<Self, ParameterError> {
        let sigma = bead_parameters(tables, "sigma")?;
        let epsilon = bead_parameters(tables, "epsilon")?;
        let lambda_r = bead_parameters(tables, "lambdar")?;
        let lambda_a = bead_parameters(tables, "lambdaa")?;
        for (k, (&lr, &la)) in lambda_r.iter().zip(lambda_a.iter()).enumerate() {
            if lr <= la || la <= 0.0 {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "bead `{}` needs 0 < lambdaa < lambdar, got lambdaa={la}, lambdar={lr}",
                    tables.beads()[k]
                )));
            }
        }
        let c = Array1::from_shape_fn(sigma.len(), |k| mie_prefactor(lambda_r[k], lambda_a[k]));
        let sigma_kl = bead_pair_parameters(tables, "sigma", &sigma, |s1, s2| 0.5 * (s1 + s2));
        Ok(Self {
            sigma,
            epsilon,
            lambda_r,
            lambda_a,
            c,
            sigma_kl,
            weights: segment_weights(tables),
        })
    }

    /// Barker-Henderson diameter of bead `k` in Å
    /// $$d_k=\int_0^{\sigma_k}\left(1-e^{-\beta u_k^\mathrm{Mie}(r)}\right)\mathrm{d}r$$
    pub fn hs_diameter_k<D: DualNum<f64> + Copy>(&self, k: usize, inverse_temperature: D) -> D {
        let lr = self.lambda_r[k];
        let la = self.lambda_a[k];
        let c_eps_t = inverse_temperature * self.c[k] * self.epsilon[k];

        // integration in reduced distances
        let r0 = lower_integration_limit(la, lr, c_eps_t);
        let width = (-r0 + 1.0) * 0.5;
        GLQ10.iter().fold(r0, |d, &[x, w]| {
            let r = width * x + width + r0;
            let u = beta_u_mie(r, la, lr, c_eps_t);
            let f_u = -(-u).exp_m1();
            d + width * f_u * w
        }) * self.sigma[k]
    }
}

/// Prefactor of the Mie potential $C=\frac{\lambda_r}{\lambda_r-\lambda_a}\left(\frac{\lambda_r}{\lambda_a}\right)^{\frac{\lambda_a}{\lambda_r-\lambda_a}}$.
pub fn mie_prefactor(lr: f64, la: f64) -> f64 {
    lr / (lr - la) * (lr / la).powf(la / (lr - la))
}

/// Lower limit of the integral, where the Boltzmann factor drops below machine precision.
fn lower_integration_limit<D: DualNum<f64> + Copy>(la: f64, lr: f64, c_eps_t: D) -> D {
    // initial value from the repulsive contribution
    let k = (-c_eps_t.recip() * f64::EPSILON.ln()).ln();
    let mut r = (-k / lr).exp();
    // Halley's method
    for _ in 1..5 {
        let [u, u_du, du_d2u] = mie_potential_halley(r, la, lr, c_eps_t);
        if u.re() < 0.0 {
            return r;
        }
        r -= u_du / (-u_du / du_d2u * 0.5 + 1.0);
    }
    r
}

/// `[f, f/f', f'/f'']` of $f=-\beta u^\mathrm{Mie}(r)-\ln\epsilon$.
fn mie_potential_halley<D: DualNum<f64> + Copy>(r: D, la: f64, lr: f64, c_eps_t: D) -> [D; 3] {
    let ri = r.recip();
    let plr = ri.powf(lr);
    let pla = ri.powf(la);
    let u = plr - pla;
    let dplr = plr * (-lr) * ri;
    let dpla = pla * (-la) * ri;
    let du_dr = dplr - dpla;
    let d2u_dr2 = (dplr * (-lr - 1.0) - dpla * (-la - 1.0)) * ri;

    let f = -c_eps_t * u - f64::EPSILON.ln();
    let df = -c_eps_t * du_dr;
    let d2f = -c_eps_t * d2u_dr2;
    [f, f / df, df / d2f]
}

/// Mie potential divided by kT at the reduced distance `r`.
fn beta_u_mie<D: DualNum<f64> + Copy>(r: D, la: f64, lr: f64, c_eps_t: D) -> D {
    let ri = r.recip();
    (ri.powf(lr) - ri.powf(la)) * c_eps_t
}

impl HardSphereProperties for GammaMieParameters {
    fn segment_weights(&self) -> &Array2<f64> {
        &self.weights
    }

    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        let t_inv = temperature.recip();
        Array1::from_shape_fn(self.sigma.len(), |k| self.hs_diameter_k(k, t_inv))
    }
}

/// SAFT-γ Mie with hard-sphere and hard-chain contributions.
pub struct GammaMie {
    parameters: Arc<GammaMieParameters>,
    contributions: Vec<Box<dyn HelmholtzContribution>>,
}

impl GammaMie {
    pub fn new(tables: &ParameterTables) -> EosResult<Self> {
        let parameters = Arc::new(GammaMieParameters::new(tables)?);
        Ok(Self {
            contributions: contributions(&parameters),
            parameters,
        })
    }

    pub fn parameters(&self) -> &GammaMieParameters {
        &self.parameters
    }
}

fn contributions(parameters: &Arc<GammaMieParameters>) -> Vec<Box<dyn HelmholtzContribution>> {
    vec![
        Box::new(HardSphere::new(parameters)),
        Box::new(HardChain::new(parameters)),
    ]
}

impl SaftVariant for GammaMie {
    fn name(&self) -> &str {
        "gamma_mie"
    }

    fn parameter_types(&self) -> &[&str] {
        &PARAMETER_TYPES
    }

    fn parameter_bound_extreme(&self, parameter: &str) -> Option<[f64; 2]> {
        match parameter {
            "sigma" => Some([2.0, 9.0]),
            "epsilon" => Some([100.0, 1000.0]),
            "lambdar" => Some([8.0, 100.0]),
            "lambdaa" => Some([5.9, 6.1]),
            "Sk" => Some([0.1, 1.0]),
            "epsilonHB" => Some([100.0, 5000.0]),
            "K" => Some([0.1 * ANGSTROM3 * NAV, 1e4 * ANGSTROM3 * NAV]),
            "rc" => Some([0.1, 10.0]),
            "rd" => Some([0.1, 10.0]),
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
        self.parameters = Arc::new(GammaMieParameters::new(tables)?);
        self.contributions = contributions(&self.parameters);
        debug!(beads = tables.beads().len(), "refreshed gamma_mie parameters");
        Ok(())
    }
}

impl fmt::Display for GammaMie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SAFT-γ Mie(")?;
        for (k, c) in self.contributions.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}
