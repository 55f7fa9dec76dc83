//! Finite difference Jacobians.

use crate::error::SymbolicResult;
use nalgebra::{DMatrix, DVector};

/// Central differences: column j is `(f(x + dx e_j) - f(x - dx e_j)) / 2dx`.
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SymbolicResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SymbolicResult<DVector<f64>>,
{
    let n = x.len();
    let m = f(x)?.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let mut x_minus = x.clone();
        x_minus[j] -= dx;

        let df = (f(&x_plus)? - f(&x_minus)?) / (2.0 * dx);
        jac.set_column(j, &df);
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_difference_of_cross_terms() {
        // f = (x0 x1, x0 + 2 x1)
        let f = |x: &DVector<f64>| -> SymbolicResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![x[0] * x[1], x[0] + 2.0 * x[1]]))
        };
        let x = DVector::from_vec(vec![2.0, 5.0]);
        let jac = central_difference_jacobian(&x, f, 1e-6).unwrap();
        assert!((jac[(0, 0)] - 5.0).abs() < 1e-6);
        assert!((jac[(0, 1)] - 2.0).abs() < 1e-6);
        assert!((jac[(1, 0)] - 1.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 2.0).abs() < 1e-6);
    }
}
