use ndarray::*;
use saft_gamma_core::{EosError, EosResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Settings of the site fraction iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationSolverOptions {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Absolute tolerance on the change of the site fractions.
    pub tol: f64,
    /// Relaxation factor in `(0, 1]`; 1 is plain successive substitution.
    pub damping: f64,
}

impl Default for AssociationSolverOptions {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tol: 1e-12,
            damping: 0.5,
        }
    }
}

/// A site `site` on a bead `bead` in component `component`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SiteIndex {
    pub component: usize,
    pub bead: usize,
    pub site: usize,
}

/// All (component, bead, site) triples that take part in association.
///
/// Triples are ordered by component, then bead, then site. Components with
/// vanishing mole fraction, beads that are absent from a component and sites
/// absent from a bead are skipped.
pub fn assoc_site_indices(
    nk: &Array2<f64>,
    molecular_composition: &Array2<f64>,
    molefracs: &Array1<f64>,
) -> Vec<SiteIndex> {
    let mut indices = Vec::new();
    for (component, &x) in molefracs.iter().enumerate() {
        if x <= 0.0 {
            continue;
        }
        for (bead, &nu) in molecular_composition.row(component).iter().enumerate() {
            if nu <= 0.0 {
                continue;
            }
            for (site, &n) in nk.row(bead).iter().enumerate() {
                if n > 0.0 {
                    indices.push(SiteIndex {
                        component,
                        bead,
                        site,
                    });
                }
            }
        }
    }
    indices
}

/// Bonding volumes entering the association strength.
#[derive(Clone, Copy, Debug)]
pub enum SiteBonding<'a> {
    /// `Kklab[bead_k, bead_l, site_a, site_b]` in m³/mol.
    Klab(&'a Array4<f64>),
    /// `Kijklab[comp_i, comp_j, bead_k, bead_l, site_a, site_b]` in m³/mol.
    Ijklab(&'a Array6<f64>),
}

impl SiteBonding<'_> {
    fn get(&self, p: &SiteIndex, q: &SiteIndex) -> f64 {
        match self {
            Self::Klab(k) => k[[p.bead, q.bead, p.site, q.site]],
            Self::Ijklab(k) => k[[p.component, q.component, p.bead, q.bead, p.site, q.site]],
        }
    }
}

/// Converged fractions of non-bonded sites.
#[derive(Clone, Debug)]
pub struct SiteFractions {
    /// The sites the columns of `xika` refer to.
    pub indices: Vec<SiteIndex>,
    /// `xika[sample, site]`
    pub xika: Array2<f64>,
    /// Number of iterations that were needed.
    pub iterations: usize,
}

/// Solve for the fraction of non-bonded sites with damped successive substitution.
///
/// For every density sample and every site $p=(i,k,a)$ the fixed point of
/// $$X_{p}=\frac{1}{1+\rho\sum_{q=(j,l,b)}x_j\nu_{jl}n_{lb}\Delta_{pq}X_q}$$
/// with $\Delta_{pq}=\left(e^{\varepsilon_{klab}/T}-1\right)K_{pq}g_{ij}$ is
/// determined. `gr` holds the contact values `gr[sample, comp_i, comp_j]`.
///
/// Samples with a non-finite association strength are reported with a warning
/// and their site fractions are `NaN`.
pub fn calc_xika(
    indices: &[SiteIndex],
    density: &Array1<f64>,
    temperature: f64,
    molefracs: &Array1<f64>,
    nk: &Array2<f64>,
    molecular_composition: &Array2<f64>,
    epsilon_hb: &Array4<f64>,
    bonding: SiteBonding,
    gr: &Array3<f64>,
    options: &AssociationSolverOptions,
) -> EosResult<SiteFractions> {
    let nrho = density.len();
    let nsites = indices.len();
    if gr.dim() != (nrho, molefracs.len(), molefracs.len()) {
        return Err(EosError::Configuration(format!(
            "contact values have shape {:?}, expected {:?}",
            gr.dim(),
            (nrho, molefracs.len(), molefracs.len())
        )));
    }
    if !(options.damping > 0.0 && options.damping <= 1.0) {
        return Err(EosError::Configuration(format!(
            "the damping of the site fraction iteration has to be in (0, 1], got {}",
            options.damping
        )));
    }

    // coupling[sample, p, q] = ρ x_j ν_jl n_lb Δ_pq
    let mut coupling = Array3::zeros((nrho, nsites, nsites));
    for (p, sp) in indices.iter().enumerate() {
        for (q, sq) in indices.iter().enumerate() {
            let mayer = (epsilon_hb[[sp.bead, sq.bead, sp.site, sq.site]] / temperature).exp_m1();
            let weight = molefracs[sq.component]
                * molecular_composition[[sq.component, sq.bead]]
                * nk[[sq.bead, sq.site]];
            let prefactor = mayer * bonding.get(sp, sq) * weight;
            if prefactor == 0.0 {
                continue;
            }
            coupling
                .slice_mut(s![.., p, q])
                .assign(&(density * &gr.slice(s![.., sp.component, sq.component]) * prefactor));
        }
    }

    let mut xika = Array2::ones((nrho, nsites));
    let mut valid = Array1::from_elem(nrho, true);
    for (r, c) in coupling.outer_iter().enumerate() {
        if c.iter().any(|v| !v.is_finite()) {
            warn!(
                density = density[r],
                temperature, "non-finite association strength, site fractions are undefined"
            );
            valid[r] = false;
            xika.row_mut(r).fill(f64::NAN);
        }
    }

    let mut residual = 0.0;
    for iteration in 1..=options.max_iter {
        let update = (&coupling * &xika.slice(s![.., NewAxis, ..]))
            .sum_axis(Axis(2))
            .mapv(|s| 1.0 / (1.0 + s));

        residual = Zip::from(update.rows())
            .and(xika.rows())
            .and(&valid)
            .fold(0.0f64, |acc, u, x, &v| {
                if !v {
                    return acc;
                }
                u.iter()
                    .zip(x.iter())
                    .fold(acc, |acc, (u, x)| acc.max((u - x).abs()))
            });

        xika = &update * options.damping + &xika * (1.0 - options.damping);

        if residual < options.tol {
            debug!(iterations = iteration, residual, sites = nsites, "site fractions converged");
            return Ok(SiteFractions {
                indices: indices.to_vec(),
                xika,
                iterations: iteration,
            });
        }
    }
    Err(EosError::NotConverged {
        context: "association site fractions".into(),
        iterations: options.max_iter,
        residual,
    })
}

/// Reduced association Helmholtz energy
/// $\sum_{ika}x_i\nu_{ik}n_{ka}\left(\ln X_{ika}+\frac{1-X_{ika}}{2}\right)$
/// for every density sample.
pub fn association_energy(
    fractions: &SiteFractions,
    molefracs: &Array1<f64>,
    nk: &Array2<f64>,
    molecular_composition: &Array2<f64>,
) -> Array1<f64> {
    let weights = Array1::from_iter(fractions.indices.iter().map(|p| {
        molefracs[p.component] * molecular_composition[[p.component, p.bead]] * nk[[p.bead, p.site]]
    }));
    fractions
        .xika
        .mapv(|x| x.ln() - x * 0.5 + 0.5)
        .dot(&weights)
}
