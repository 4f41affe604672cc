//! Finite difference approximations of derivatives of Helmholtz energy functions.
//!
//! Contributions are supplied by arbitrary SAFT variants and are not required to
//! provide analytic derivatives. Pressure and fugacity coefficients are
//! therefore obtained from central differences. The step size is chosen by the
//! caller; no adaptive step size search is performed.
use ndarray::{arr1, Array1};

/// Central difference approximation of $\frac{\mathrm{d}f}{\mathrm{d}x}$ at every element of `x`.
///
/// `f` is evaluated once at `x + step_size` and once at `x - step_size`, so it
/// has to be an element-wise function of `x`. The truncation error is of
/// order `step_size²`.
pub fn central_difference<E, F>(x: &Array1<f64>, f: F, step_size: f64) -> Result<Array1<f64>, E>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>, E>,
{
    let forward = f(&(x + step_size))?;
    let backward = f(&(x - step_size))?;
    Ok((forward - backward) / (2.0 * step_size))
}

/// Derivatives of a Helmholtz energy function with respect to the partial densities.
///
/// The function `f(density, temperature, molefracs)` returns the reduced
/// Helmholtz energy per molecule for every density sample. With the partial
/// densities $\rho_i=x_i\rho$, this returns
/// $\frac{\partial A}{\partial\rho_i}$ for every component.
///
/// With `log_method`, the partial density is perturbed in $\ln\rho_i$ using
/// a relative step of `step_size`, which keeps differences well conditioned
/// when the absolute value of the energy or the density is small. Components
/// with vanishing partial density are always differentiated with a forward
/// step, as are components whose partial density is smaller than `step_size`.
pub fn partial_density_central_difference<E, F>(
    molefracs: &Array1<f64>,
    density: f64,
    temperature: f64,
    f: F,
    step_size: f64,
    log_method: bool,
) -> Result<Array1<f64>, E>
where
    F: Fn(&Array1<f64>, f64, &Array1<f64>) -> Result<Array1<f64>, E>,
{
    let partial_density = molefracs * density;
    let evaluate = |rho_i: &Array1<f64>| -> Result<f64, E> {
        let rho = rho_i.sum();
        let x = rho_i / rho;
        Ok(f(&arr1(&[rho]), temperature, &x)?[0])
    };

    let mut derivative = Array1::zeros(molefracs.len());
    for (i, &rho_i) in partial_density.iter().enumerate() {
        let mut forward = partial_density.clone();
        let mut backward = partial_density.clone();
        derivative[i] = if log_method && rho_i > 0.0 {
            forward[i] = rho_i * step_size.exp();
            backward[i] = rho_i * (-step_size).exp();
            (evaluate(&forward)? - evaluate(&backward)?) / (2.0 * step_size * rho_i)
        } else if rho_i > step_size {
            forward[i] += step_size;
            backward[i] -= step_size;
            (evaluate(&forward)? - evaluate(&backward)?) / (2.0 * step_size)
        } else {
            forward[i] += step_size;
            (evaluate(&forward)? - evaluate(&partial_density)?) / step_size
        };
    }
    Ok(derivative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::convert::Infallible;

    #[test]
    fn central_difference_matches_analytic_derivative() {
        let x = arr1(&[0.1, 0.5, 1.0, 2.0]);
        for h in [1e-2, 1e-3] {
            let df = central_difference(&x, |x| Ok::<_, Infallible>(x.mapv(f64::sin)), h).unwrap();
            for (&xi, &dfi) in x.iter().zip(df.iter()) {
                // truncation error is h² f'''(x) / 6
                assert!((dfi - xi.cos()).abs() <= h * h / 6.0 * 1.01);
            }
        }
        let df = central_difference(&x, |x| Ok::<_, Infallible>(x.mapv(|x| x.powi(3))), 1e-4)
            .unwrap();
        assert_relative_eq!(df, x.mapv(|x| 3.0 * x * x), max_relative = 1e-6);
    }

    #[test]
    fn central_difference_propagates_errors() {
        let x = arr1(&[1.0]);
        let res = central_difference(&x, |_| Err::<Array1<f64>, _>("failed"), 1e-6);
        assert_eq!(res, Err("failed"));
    }

    /// A = Σ_i a_i ρ_i, written as a function of density and composition.
    fn linear(rho: &Array1<f64>, _: f64, x: &Array1<f64>) -> Result<Array1<f64>, Infallible> {
        let a = arr1(&[1.5, -0.5, 2.0]);
        Ok(rho * (&a * x).sum())
    }

    #[test]
    fn partial_density_derivative() {
        let x = arr1(&[0.2, 0.3, 0.5]);
        for log_method in [true, false] {
            let d = partial_density_central_difference(&x, 100.0, 300.0, linear, 1e-5, log_method)
                .unwrap();
            assert_relative_eq!(d, arr1(&[1.5, -0.5, 2.0]), max_relative = 1e-8);
        }
    }

    #[test]
    fn partial_density_derivative_absent_component() {
        let x = arr1(&[0.0, 0.4, 0.6]);
        let d = partial_density_central_difference(&x, 50.0, 300.0, linear, 1e-5, true).unwrap();
        assert_relative_eq!(d, arr1(&[1.5, -0.5, 2.0]), max_relative = 1e-8);
    }
}
