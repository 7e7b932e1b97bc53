// ABOUTME: Matrix kernels - elementwise ops with broadcasting, GEMM, decompositions, norms

use crate::error::EvalError;
use crate::value::Matrix;

fn broadcast_dim(a: usize, b: usize, op: &str) -> Result<usize, EvalError> {
    if a == b || a == 1 || b == 1 {
        Ok(a.max(b))
    } else {
        Err(EvalError::DimensionMismatch(format!(
            "{op}: incompatible sizes ({a} vs {b})"
        )))
    }
}

/// Element-wise binary op with MATLAB's singleton-axis broadcasting rule.
pub fn elementwise(a: &Matrix, b: &Matrix, op: &str, f: impl Fn(f64, f64) -> f64) -> Result<Matrix, EvalError> {
    if a.is_empty() || b.is_empty() {
        return Ok(Matrix::empty());
    }
    let rows = broadcast_dim(a.rows, b.rows, op)?;
    let cols = broadcast_dim(a.cols, b.cols, op)?;
    let mut data = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let av = a.get(if a.rows == 1 { 0 } else { r }, if a.cols == 1 { 0 } else { c });
            let bv = b.get(if b.rows == 1 { 0 } else { r }, if b.cols == 1 { 0 } else { c });
            data.push(f(av, bv));
        }
    }
    Ok(Matrix::new(rows, cols, data))
}

pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix, EvalError> {
    if a.is_scalar() || b.is_scalar() {
        let s = a.to_scalar().or_else(|| b.to_scalar()).unwrap();
        let m = if a.is_scalar() { b } else { a };
        return Ok(m.map(|v| v * s));
    }
    if a.cols != b.rows {
        return Err(EvalError::DimensionMismatch(format!(
            "matrix multiplication: {}x{} * {}x{}",
            a.rows, a.cols, b.rows, b.cols
        )));
    }
    let mut out = Matrix::zeros(a.rows, b.cols);
    for i in 0..a.rows {
        for k in 0..a.cols {
            let aik = a.get(i, k);
            if aik == 0.0 {
                continue;
            }
            for j in 0..b.cols {
                let prev = out.get(i, j);
                out.set(i, j, prev + aik * b.get(k, j));
            }
        }
    }
    Ok(out)
}

pub fn horzcat(mats: &[&Matrix]) -> Result<Matrix, EvalError> {
    let nonempty: Vec<&&Matrix> = mats.iter().filter(|m| !m.is_empty()).collect();
    if nonempty.is_empty() {
        return Ok(Matrix::empty());
    }
    let rows = nonempty[0].rows;
    for m in &nonempty {
        if m.rows != rows {
            return Err(EvalError::DimensionMismatch("horzcat: row counts differ".into()));
        }
    }
    let cols: usize = nonempty.iter().map(|m| m.cols).sum();
    let mut data = vec![0.0; rows * cols];
    let mut col_off = 0;
    for m in &nonempty {
        for r in 0..rows {
            for c in 0..m.cols {
                data[r * cols + col_off + c] = m.get(r, c);
            }
        }
        col_off += m.cols;
    }
    Ok(Matrix::new(rows, cols, data))
}

pub fn vertcat(mats: &[&Matrix]) -> Result<Matrix, EvalError> {
    let nonempty: Vec<&&Matrix> = mats.iter().filter(|m| !m.is_empty()).collect();
    if nonempty.is_empty() {
        return Ok(Matrix::empty());
    }
    let cols = nonempty[0].cols;
    for m in &nonempty {
        if m.cols != cols {
            return Err(EvalError::DimensionMismatch("vertcat: column counts differ".into()));
        }
    }
    let rows: usize = nonempty.iter().map(|m| m.rows).sum();
    let mut data = Vec::with_capacity(rows * cols);
    for m in &nonempty {
        data.extend_from_slice(&m.data);
    }
    Ok(Matrix::new(rows, cols, data))
}

/// 1x1/2x2/3x3 special cases, general case by Gaussian elimination with
/// partial pivoting tracking sign swaps (spec.md §4.3).
pub fn det(a: &Matrix) -> Result<f64, EvalError> {
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("det: matrix must be square".into()));
    }
    match a.rows {
        0 => Ok(1.0),
        1 => Ok(a.get(0, 0)),
        2 => Ok(a.get(0, 0) * a.get(1, 1) - a.get(0, 1) * a.get(1, 0)),
        3 => {
            let m = a;
            Ok(m.get(0, 0) * (m.get(1, 1) * m.get(2, 2) - m.get(1, 2) * m.get(2, 1))
                - m.get(0, 1) * (m.get(1, 0) * m.get(2, 2) - m.get(1, 2) * m.get(2, 0))
                + m.get(0, 2) * (m.get(1, 0) * m.get(2, 1) - m.get(1, 1) * m.get(2, 0)))
        }
        n => {
            let mut mat = a.data.clone();
            let mut sign = 1.0;
            for col in 0..n {
                let mut pivot_row = col;
                let mut pivot_val = mat[col * n + col].abs();
                for r in (col + 1)..n {
                    let v = mat[r * n + col].abs();
                    if v > pivot_val {
                        pivot_val = v;
                        pivot_row = r;
                    }
                }
                if pivot_val < 1e-15 {
                    return Ok(0.0);
                }
                if pivot_row != col {
                    for c in 0..n {
                        mat.swap(col * n + c, pivot_row * n + c);
                    }
                    sign = -sign;
                }
                for r in (col + 1)..n {
                    let factor = mat[r * n + col] / mat[col * n + col];
                    for c in col..n {
                        mat[r * n + c] -= factor * mat[col * n + c];
                    }
                }
            }
            let mut d = sign;
            for i in 0..n {
                d *= mat[i * n + i];
            }
            Ok(d)
        }
    }
}

/// 1x1/2x2 closed form, general via Gauss-Jordan with partial pivoting on
/// the augmented [A|I]; pivot below 1e-15 fails (spec.md §4.3).
pub fn inv(a: &Matrix) -> Result<Matrix, EvalError> {
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("inv: matrix must be square".into()));
    }
    let n = a.rows;
    if n == 1 {
        let v = a.get(0, 0);
        if v.abs() < 1e-15 {
            return Err(EvalError::runtime_error("inv", "Matrix is singular"));
        }
        return Ok(Matrix::scalar(1.0 / v));
    }
    if n == 2 {
        let d = det(a)?;
        if d.abs() < 1e-15 {
            return Err(EvalError::runtime_error("inv", "Matrix is singular"));
        }
        return Ok(Matrix::new(
            2,
            2,
            vec![a.get(1, 1) / d, -a.get(0, 1) / d, -a.get(1, 0) / d, a.get(0, 0) / d],
        ));
    }
    // Augmented [A | I] Gauss-Jordan with partial pivoting.
    let mut aug = vec![0.0; n * 2 * n];
    for r in 0..n {
        for c in 0..n {
            aug[r * 2 * n + c] = a.get(r, c);
        }
        aug[r * 2 * n + n + r] = 1.0;
    }
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_val = aug[col * 2 * n + col].abs();
        for r in (col + 1)..n {
            let v = aug[r * 2 * n + col].abs();
            if v > pivot_val {
                pivot_val = v;
                pivot_row = r;
            }
        }
        if pivot_val < 1e-15 {
            return Err(EvalError::runtime_error("inv", "Matrix is singular"));
        }
        if pivot_row != col {
            for c in 0..2 * n {
                aug.swap(col * 2 * n + c, pivot_row * 2 * n + c);
            }
        }
        let pivot = aug[col * 2 * n + col];
        for c in 0..2 * n {
            aug[col * 2 * n + c] /= pivot;
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = aug[r * 2 * n + col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..2 * n {
                aug[r * 2 * n + c] -= factor * aug[col * 2 * n + c];
            }
        }
    }
    let mut data = vec![0.0; n * n];
    for r in 0..n {
        for c in 0..n {
            data[r * n + c] = aug[r * 2 * n + n + c];
        }
    }
    Ok(Matrix::new(n, n, data))
}

/// Row reduction with tolerance `max(rows,cols) * eps * ||A||_inf` (spec.md §4.3).
pub fn rank(a: &Matrix) -> usize {
    if a.is_empty() {
        return 0;
    }
    let (rows, cols) = (a.rows, a.cols);
    let norm_inf = (0..rows)
        .map(|r| (0..cols).map(|c| a.get(r, c).abs()).sum::<f64>())
        .fold(0.0_f64, f64::max);
    let tol = rows.max(cols) as f64 * f64::EPSILON * norm_inf.max(1.0);
    let mut mat = a.data.clone();
    let mut rank = 0usize;
    let mut row = 0usize;
    for col in 0..cols {
        if row >= rows {
            break;
        }
        let mut pivot_row = row;
        let mut pivot_val = mat[row * cols + col].abs();
        for r in (row + 1)..rows {
            let v = mat[r * cols + col].abs();
            if v > pivot_val {
                pivot_val = v;
                pivot_row = r;
            }
        }
        if pivot_val <= tol {
            continue;
        }
        if pivot_row != row {
            for c in 0..cols {
                mat.swap(row * cols + c, pivot_row * cols + c);
            }
        }
        for r in (row + 1)..rows {
            let factor = mat[r * cols + col] / mat[row * cols + col];
            for c in col..cols {
                mat[r * cols + c] -= factor * mat[row * cols + c];
            }
        }
        rank += 1;
        row += 1;
    }
    rank
}

/// LU without pivoting, returns (L, U).
pub fn lu(a: &Matrix) -> Result<(Matrix, Matrix), EvalError> {
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("lu: matrix must be square".into()));
    }
    let n = a.rows;
    let mut l = Matrix::zeros(n, n);
    let mut u = a.clone();
    for i in 0..n {
        l.set(i, i, 1.0);
    }
    for col in 0..n {
        let pivot = u.get(col, col);
        if pivot.abs() < 1e-15 {
            return Err(EvalError::runtime_error("lu", "zero pivot encountered"));
        }
        for r in (col + 1)..n {
            let factor = u.get(r, col) / pivot;
            l.set(r, col, factor);
            for c in col..n {
                let v = u.get(r, c) - factor * u.get(col, c);
                u.set(r, c, v);
            }
        }
    }
    Ok((l, u))
}

/// Modified Gram-Schmidt QR, returns (Q, R).
pub fn qr(a: &Matrix) -> (Matrix, Matrix) {
    let (m, n) = (a.rows, a.cols);
    let mut q = Matrix::zeros(m, n);
    let mut r = Matrix::zeros(n, n);
    let mut cols: Vec<Vec<f64>> = (0..n).map(|c| a.column(c)).collect();
    for k in 0..n {
        let mut v = cols[k].clone();
        for i in 0..k {
            let qi = q.column(i);
            let dot: f64 = qi.iter().zip(&cols[k]).map(|(a, b)| a * b).sum();
            r.set(i, k, dot);
            for (vj, qij) in v.iter_mut().zip(&qi) {
                *vj -= dot * qij;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        r.set(k, k, norm);
        let qk: Vec<f64> = if norm > 1e-15 { v.iter().map(|x| x / norm).collect() } else { v.clone() };
        for row in 0..m {
            q.set(row, k, qk[row]);
        }
        cols[k] = cols[k].clone();
    }
    (q, r)
}

/// Cholesky assuming SPD; lower-triangular factor.
pub fn chol(a: &Matrix) -> Result<Matrix, EvalError> {
    let n = a.rows;
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("chol: matrix must be square".into()));
    }
    let mut l = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a.get(i, j);
            for k in 0..j {
                sum -= l.get(i, k) * l.get(j, k);
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(EvalError::runtime_error("chol", "Matrix must be positive definite"));
                }
                l.set(i, j, sum.sqrt());
            } else {
                l.set(i, j, sum / l.get(j, j));
            }
        }
    }
    Ok(l)
}

/// Unshifted QR iteration, 100-200 cap, sufficient for well-conditioned
/// small matrices (spec.md §4.3). Returns eigenvalues only.
pub fn eigenvalues(a: &Matrix) -> Result<Vec<f64>, EvalError> {
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("eig: matrix must be square".into()));
    }
    let n = a.rows;
    let mut m = a.clone();
    for _ in 0..200 {
        let (q, r) = qr(&m);
        m = matmul(&r, &q)?;
    }
    let mut vals: Vec<f64> = (0..n).map(|i| m.get(i, i)).collect();
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
    Ok(vals)
}

/// Full eigendecomposition via simultaneous QR iteration accumulating the
/// rotation product as the eigenvector matrix V; D is diagonal of eigenvalues.
pub fn eig_full(a: &Matrix) -> Result<(Matrix, Matrix), EvalError> {
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("eig: matrix must be square".into()));
    }
    let n = a.rows;
    let mut m = a.clone();
    let mut v = identity(n);
    for _ in 0..200 {
        let (q, r) = qr(&m);
        m = matmul(&r, &q)?;
        v = matmul(&v, &q)?;
    }
    let mut d = Matrix::zeros(n, n);
    for i in 0..n {
        d.set(i, i, m.get(i, i));
    }
    Ok((v, d))
}

pub fn identity(n: usize) -> Matrix {
    let mut m = Matrix::zeros(n, n);
    for i in 0..n {
        m.set(i, i, 1.0);
    }
    m
}

/// SVD via eigendecomposition of A^T A (spec.md §4.3): returns singular
/// values sorted descending.
pub fn svd_values(a: &Matrix) -> Result<Vec<f64>, EvalError> {
    let at = a.transpose();
    let ata = matmul(&at, a)?;
    let mut vals = eigenvalues(&ata)?;
    vals.sort_by(|a, b| b.partial_cmp(a).unwrap());
    Ok(vals.into_iter().map(|v| v.max(0.0).sqrt()).collect())
}

pub fn trace(a: &Matrix) -> Result<f64, EvalError> {
    if a.rows != a.cols {
        return Err(EvalError::DimensionMismatch("trace: matrix must be square".into()));
    }
    Ok((0..a.rows).map(|i| a.get(i, i)).sum())
}

pub fn norm(a: &Matrix, p: Option<f64>) -> f64 {
    if a.is_vector() {
        match p {
            Some(p) if p.is_infinite() => a.data.iter().fold(0.0_f64, |m, v| m.max(v.abs())),
            Some(1.0) => a.data.iter().map(|v| v.abs()).sum(),
            Some(p) => a.data.iter().map(|v| v.abs().powf(p)).sum::<f64>().powf(1.0 / p),
            None => a.data.iter().map(|v| v * v).sum::<f64>().sqrt(),
        }
    } else {
        // Frobenius norm for matrices, the spec's default outside explicit dims.
        a.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Pseudoinverse via (A^T A)^-1 A^T for full column rank, else A^T (A A^T)^-1.
pub fn pinv(a: &Matrix) -> Result<Matrix, EvalError> {
    let at = a.transpose();
    if a.rows >= a.cols {
        let ata = matmul(&at, a)?;
        let inv_ata = inv(&ata)?;
        matmul(&inv_ata, &at)
    } else {
        let aat = matmul(a, &at)?;
        let inv_aat = inv(&aat)?;
        matmul(&at, &inv_aat)
    }
}

/// expm via scaling-and-squaring with a degree-6 Pade approximant.
pub fn expm(a: &Matrix) -> Result<Matrix, EvalError> {
    let n = a.rows;
    let norm1 = a.data.iter().map(|v| v.abs()).fold(0.0_f64, f64::max) * n as f64;
    let s = if norm1 > 0.0 { (norm1.log2().ceil().max(0.0)) as i32 } else { 0 };
    let scale = 2f64.powi(s);
    let an = a.map(|v| v / scale);

    // Degree-6 Pade coefficients.
    const C: [f64; 7] = [1.0, 0.5, 1.0 / 10.0, 1.0 / 120.0, 1.0 / 1680.0, 1.0 / 30240.0, 1.0 / 665280.0];
    let mut powers = vec![identity(n)];
    for i in 1..=6 {
        powers.push(matmul(&powers[i - 1], &an)?);
    }
    let mut num = Matrix::zeros(n, n);
    let mut den = Matrix::zeros(n, n);
    for (i, p) in powers.iter().enumerate() {
        let term = p.map(|v| v * C[i]);
        num = elementwise(&num, &term, "expm", |a, b| a + b)?;
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let dterm = p.map(|v| v * C[i] * sign);
        den = elementwise(&den, &dterm, "expm", |a, b| a + b)?;
    }
    let mut result = matmul(&inv(&den)?, &num)?;
    for _ in 0..s {
        result = matmul(&result, &result)?;
    }
    Ok(result)
}

/// logm via repeated matrix square roots and a truncated series.
pub fn logm(a: &Matrix) -> Result<Matrix, EvalError> {
    let n = a.rows;
    let mut b = a.clone();
    let mut k = 0;
    while (0..n).any(|i| (b.get(i, i) - 1.0).abs() > 0.5) && k < 20 {
        b = sqrtm(&b)?;
        k += 1;
    }
    let ident = identity(n);
    let x = elementwise(&b, &ident, "logm", |a, i| a - i)?;
    let mut term = x.clone();
    let mut sum = Matrix::zeros(n, n);
    for i in 1..=20 {
        let contrib = term.map(|v| v * if i % 2 == 1 { 1.0 } else { -1.0 } / i as f64);
        sum = elementwise(&sum, &contrib, "logm", |a, b| a + b)?;
        term = matmul(&term, &x)?;
    }
    Ok(sum.map(|v| v * 2f64.powi(k)))
}

/// sqrtm via Denman-Beavers iteration.
pub fn sqrtm(a: &Matrix) -> Result<Matrix, EvalError> {
    let n = a.rows;
    let mut y = a.clone();
    let mut z = identity(n);
    for _ in 0..50 {
        let y_inv = inv(&y)?;
        let z_inv = inv(&z)?;
        let y_next = elementwise(&y, &z_inv, "sqrtm", |a, b| (a + b) / 2.0)?;
        let z_next = elementwise(&z, &y_inv, "sqrtm", |a, b| (a + b) / 2.0)?;
        y = y_next;
        z = z_next;
    }
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn det_2x2() {
        let m = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(det(&m).unwrap(), -2.0);
    }

    #[test]
    fn inv_times_original_is_identity() {
        let m = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let i = inv(&m).unwrap();
        let prod = matmul(&m, &i).unwrap();
        assert!((prod.get(0, 0) - 1.0).abs() < 1e-10);
        assert!((prod.get(0, 1)).abs() < 1e-10);
        assert!((prod.get(1, 0)).abs() < 1e-10);
        assert!((prod.get(1, 1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn eig_symmetric_2x2() {
        let m = Matrix::new(2, 2, vec![2.0, 1.0, 1.0, 2.0]);
        let vals = eigenvalues(&m).unwrap();
        assert!((vals[0] - 1.0).abs() < 1e-8);
        assert!((vals[1] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn broadcasting_scalar() {
        let a = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::scalar(2.0);
        let out = elementwise(&a, &b, "test", |x, y| x + y).unwrap();
        assert_eq!(out.data, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn det_product_rule() {
        let a = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::new(2, 2, vec![5.0, 6.0, 7.0, 8.0]);
        let ab = matmul(&a, &b).unwrap();
        let lhs = det(&ab).unwrap();
        let rhs = det(&a).unwrap() * det(&b).unwrap();
        assert!((lhs - rhs).abs() < 1e-8);
    }
}
