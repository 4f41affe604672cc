//! Generic implementation of the hard-sphere and hard-chain contributions
//! of heterosegmented group contribution models.
use ndarray::*;
use num_dual::DualNum;
use saft_gamma_core::constants::NAV;
use saft_gamma_core::HelmholtzContribution;
use std::f64::consts::{FRAC_PI_6, PI};
use std::fmt;
use std::sync::Arc;

/// Conversion factor from Å to m.
const ANGSTROM: f64 = 1e-10;

/// Properties of fused hard-sphere chains built from beads.
///
/// Every bead type $k$ contributes $w_{ik}=\nu_{ik}V_kS_k$ segments to
/// component $i$, with the number of beads $\nu_{ik}$, the number of
/// identical segments per bead $V_k$ and the shape factor $S_k$.
pub trait HardSphereProperties {
    /// The segment weights $w_{ik}$ `[component, bead]`.
    fn segment_weights(&self) -> &Array2<f64>;

    /// The temperature dependent hard-sphere diameters of every bead in Å.
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D>;

    /// The packing fractions $\zeta_m=\frac{\pi}{6}N_A\rho\sum_ix_i\sum_kw_{ik}d_k^m$ in $\mathrm{m}^{m-3}$.
    fn zeta<const N: usize>(
        &self,
        temperature: f64,
        density: f64,
        molefracs: &Array1<f64>,
        m: [i32; N],
    ) -> [f64; N] {
        let w = self.segment_weights();
        let diameter = self.hs_diameter(temperature) * ANGSTROM;
        let mut zeta = [0.0; N];
        for (i, &x) in molefracs.iter().enumerate() {
            for (k, &d) in diameter.iter().enumerate() {
                for (z, &m) in zeta.iter_mut().zip(m.iter()) {
                    *z += x * w[[i, k]] * d.powi(m);
                }
            }
        }
        zeta.map(|z| z * FRAC_PI_6 * NAV * density)
    }

    /// The fraction $\frac{\zeta_2}{\zeta_3}$ in 1/m evaluated in a way to avoid a division by 0 when the density is 0.
    fn zeta_23(&self, temperature: f64, molefracs: &Array1<f64>) -> f64 {
        let [z2, z3] = self.zeta(temperature, 1.0, molefracs, [2, 3]);
        z2 / z3
    }

    /// Effective hard-sphere diameters of the components in Å from
    /// $$d_{ii}^3=\sum_k\sum_lz_{ki}z_{li}d_{kl}^3,~~~~z_{ki}=\frac{w_{ik}}{\sum_lw_{il}}$$
    /// with $d_{kl}=\frac{d_k+d_l}{2}$.
    fn component_diameter(&self, temperature: f64) -> Array1<f64> {
        let w = self.segment_weights();
        let d = self.hs_diameter(temperature);
        let d_kl3 = Array2::from_shape_fn((d.len(), d.len()), |(k, l)| (0.5 * (d[k] + d[l])).powi(3));
        Array1::from_shape_fn(w.nrows(), |i| {
            let z = &w.row(i) / w.row(i).sum();
            z.dot(&d_kl3.dot(&z)).cbrt()
        })
    }

    /// Number of segments $m_i=\sum_kw_{ik}$ of every component.
    fn chain_length(&self) -> Array1<f64> {
        self.segment_weights().sum_axis(Axis(1))
    }

    /// Contact values of the BMCSL pair correlation function
    /// $$g_{ij}=\frac{1}{1-\zeta_3}+3D_{ij}\frac{\zeta_2}{(1-\zeta_3)^2}+2D_{ij}^2\frac{\zeta_2^2}{(1-\zeta_3)^3},~~~~D_{ij}=\frac{d_{ii}d_{jj}}{d_{ii}+d_{jj}}$$
    /// for every density sample, with shape `[sample, component, component]`.
    fn contact_value(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> Array3<f64> {
        let d = self.component_diameter(temperature) * ANGSTROM;
        let n = d.len();
        let dij = Array2::from_shape_fn((n, n), |(i, j)| d[i] * d[j] / (d[i] + d[j]));
        let mut g = Array3::zeros((density.len(), n, n));
        for (mut g, &rho) in g.outer_iter_mut().zip(density.iter()) {
            let [zeta2, zeta3] = self.zeta(temperature, rho, molefracs, [2, 3]);
            let f = 1.0 / (1.0 - zeta3);
            g.assign(&dij.mapv(|dij| {
                f + 3.0 * dij * zeta2 * f * f + 2.0 * (dij * zeta2).powi(2) * f.powi(3)
            }));
        }
        g
    }
}

/// Implementation of the BMCSL equation of state for hard-sphere mixtures.
///
/// This structure provides an implementation of the Boublík-Mansoori-Carnahan-Starling-Leland (BMCSL) equation of state ([Boublík, 1970](https://doi.org/10.1063/1.1673824), [Mansoori et al., 1971](https://doi.org/10.1063/1.1675048)) generalized to fused-sphere chains of beads.
///
/// The reduced Helmholtz energy per molecule is calculated according to
/// $$\frac{A}{Nk_BT}=\frac{6}{\pi\rho N_A}\left(\frac{3\zeta_1\zeta_2}{1-\zeta_3}+\frac{\zeta_2^3}{\zeta_3\left(1-\zeta_3\right)^2}+\left(\frac{\zeta_2^3}{\zeta_3^2}-\zeta_0\right)\ln\left(1-\zeta_3\right)\right)$$
///
/// The segment weights and the bead diameters are specified via the [HardSphereProperties] trait.
pub struct HardSphere<P> {
    parameters: Arc<P>,
}

impl<P> HardSphere<P> {
    pub fn new(parameters: &Arc<P>) -> Self {
        Self {
            parameters: parameters.clone(),
        }
    }
}

impl<P: HardSphereProperties + Send + Sync> HelmholtzContribution for HardSphere<P> {
    fn helmholtz_energy(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> Array1<f64> {
        let p = &self.parameters;
        let zeta_23 = p.zeta_23(temperature, molefracs);
        density.mapv(|rho| {
            if rho == 0.0 {
                return 0.0;
            }
            let zeta = p.zeta(temperature, rho, molefracs, [0, 1, 2, 3]);
            let frac_1mz3 = 1.0 / (1.0 - zeta[3]);
            6.0 / (PI * rho * NAV)
                * (3.0 * zeta[1] * zeta[2] * frac_1mz3
                    + zeta[2].powi(2) * frac_1mz3.powi(2) * zeta_23
                    + (zeta[2] * zeta_23.powi(2) - zeta[0]) * (-zeta[3]).ln_1p())
        })
    }
}

impl<P> fmt::Display for HardSphere<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hard Sphere")
    }
}

/// Chain formation of tangent hard spheres
/// $$\frac{A}{Nk_BT}=-\sum_ix_i\left(m_i-1\right)\ln g_{ii}$$
/// with the contact values of the [HardSphere] reference fluid.
pub struct HardChain<P> {
    parameters: Arc<P>,
}

impl<P> HardChain<P> {
    pub fn new(parameters: &Arc<P>) -> Self {
        Self {
            parameters: parameters.clone(),
        }
    }
}

impl<P: HardSphereProperties + Send + Sync> HelmholtzContribution for HardChain<P> {
    fn helmholtz_energy(
        &self,
        density: &Array1<f64>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> Array1<f64> {
        let p = &self.parameters;
        let m = p.chain_length();
        let g = p.contact_value(density, temperature, molefracs);
        Array1::from_iter(g.outer_iter().map(|g| {
            molefracs
                .iter()
                .zip(m.iter())
                .enumerate()
                .map(|(i, (&x, &m))| -x * (m - 1.0) * g[[i, i]].ln())
                .sum::<f64>()
        }))
    }
}

impl<P> fmt::Display for HardChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hard Chain")
    }
}
