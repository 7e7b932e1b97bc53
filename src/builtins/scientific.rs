// ABOUTME: Numeric analysis builtins - transforms, polynomials, calculus, root-finding, stats

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("fft", fft as BuiltinFn);
    table.insert("ifft", ifft as BuiltinFn);
    table.insert("conv", conv as BuiltinFn);
    table.insert("polyval", polyval as BuiltinFn);
    table.insert("polyfit", polyfit as BuiltinFn);
    table.insert("roots", roots as BuiltinFn);
    table.insert("poly", poly as BuiltinFn);
    table.insert("polyder", polyder as BuiltinFn);
    table.insert("polyint", polyint as BuiltinFn);
    table.insert("interp1", interp1 as BuiltinFn);
    table.insert("diff", diff as BuiltinFn);
    table.insert("gradient", gradient as BuiltinFn);
    table.insert("trapz", trapz as BuiltinFn);
    table.insert("cumtrapz", cumtrapz as BuiltinFn);
    table.insert("integral", integral as BuiltinFn);
    table.insert("ode45", ode45 as BuiltinFn);
    table.insert("fminsearch", fminsearch as BuiltinFn);
    table.insert("fzero", fzero as BuiltinFn);
    table.insert("gamma", gamma as BuiltinFn);
    table.insert("erf", erf as BuiltinFn);
    table.insert("erfc", erfc as BuiltinFn);
    table.insert("normpdf", normpdf as BuiltinFn);
    table.insert("normcdf", normcdf as BuiltinFn);
    table.insert("norminv", norminv as BuiltinFn);
}

/// Magnitude spectrum of the naive O(n^2) DFT. No complex value type exists
/// in this engine (spec Non-goal), so `fft`/`ifft` operate on magnitudes
/// rather than true complex coefficients.
fn fft(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("fft", args, 1)?;
    let m = super::matrix_arg("fft", args, 0)?;
    let n = m.data.len();
    let mut out = vec![0.0; n];
    for (k, slot) in out.iter_mut().enumerate() {
        let (mut re, mut im) = (0.0, 0.0);
        for (t, &x) in m.data.iter().enumerate() {
            let theta = -2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
            re += x * theta.cos();
            im += x * theta.sin();
        }
        *slot = (re * re + im * im).sqrt();
    }
    Ok(Value::Matrix(Matrix::new(m.rows, m.cols, out)))
}

fn ifft(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("ifft", args, 1)?;
    let m = super::matrix_arg("ifft", args, 0)?;
    let n = m.data.len();
    let mut out = vec![0.0; n];
    for (t, slot) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (k, &x) in m.data.iter().enumerate() {
            let theta = 2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
            sum += x * theta.cos();
        }
        *slot = sum / n as f64;
    }
    Ok(Value::Matrix(Matrix::new(m.rows, m.cols, out)))
}

fn conv(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("conv", args, 2)?;
    let a = super::matrix_arg("conv", args, 0)?;
    let b = super::matrix_arg("conv", args, 1)?;
    let n = a.data.len() + b.data.len() - 1;
    let mut out = vec![0.0; n];
    for (i, &av) in a.data.iter().enumerate() {
        for (j, &bv) in b.data.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    Ok(Value::Matrix(Matrix::row_vec(out)))
}

/// Evaluates a polynomial given in MATLAB's highest-degree-first order.
fn polyval(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("polyval", args, 2)?;
    let p = super::matrix_arg("polyval", args, 0)?;
    let x = super::matrix_arg("polyval", args, 1)?;
    let evaluated = x.map(|xv| p.data.iter().fold(0.0, |acc, &c| acc * xv + c));
    Ok(Value::Matrix(evaluated))
}

/// Least-squares polynomial fit via the normal equations on a Vandermonde
/// matrix, solved through the existing Gauss-Jordan `inv` kernel.
fn polyfit(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("polyfit", args, 3)?;
    let x = super::matrix_arg("polyfit", args, 0)?;
    let y = super::matrix_arg("polyfit", args, 1)?;
    let degree = super::scalar_arg("polyfit", args, 2)? as usize;
    let n = x.data.len();
    let cols = degree + 1;
    let mut vander = Matrix::zeros(n, cols);
    for (r, &xv) in x.data.iter().enumerate() {
        for c in 0..cols {
            vander.set(r, c, xv.powi((degree - c) as i32));
        }
    }
    let vt = vander.transpose();
    let vtv = crate::matrix::matmul(&vt, &vander)?;
    let vty = crate::matrix::matmul(&vt, &Matrix::col_vec(y.data.clone()))?;
    let coeffs = crate::matrix::matmul(&crate::matrix::inv(&vtv)?, &vty)?;
    Ok(Value::Matrix(Matrix::row_vec(coeffs.data)))
}

/// Roots via eigenvalues of the companion matrix.
fn roots(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("roots", args, 1)?;
    let p = super::matrix_arg("roots", args, 0)?;
    let coeffs: Vec<f64> = p.data.iter().copied().collect();
    let lead = coeffs.first().copied().unwrap_or(1.0);
    if coeffs.len() <= 1 || lead == 0.0 {
        return Ok(Value::Matrix(Matrix::empty()));
    }
    let n = coeffs.len() - 1;
    let mut companion = Matrix::zeros(n, n);
    for i in 1..n {
        companion.set(i, i - 1, 1.0);
    }
    for i in 0..n {
        companion.set(0, i, -coeffs[i + 1] / lead);
    }
    Ok(Value::Matrix(Matrix::col_vec(crate::matrix::eigenvalues(&companion)?)))
}

/// Builds the monic polynomial with the given roots.
fn poly(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("poly", args, 1)?;
    let r = super::matrix_arg("poly", args, 0)?;
    let mut coeffs = vec![1.0];
    for &root in &r.data {
        let mut next = vec![0.0; coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    Ok(Value::Matrix(Matrix::row_vec(coeffs)))
}

fn polyder(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("polyder", args, 1)?;
    let p = super::matrix_arg("polyder", args, 0)?;
    let n = p.data.len();
    if n <= 1 {
        return Ok(Value::Matrix(Matrix::scalar(0.0)));
    }
    let data: Vec<f64> = p.data[..n - 1]
        .iter()
        .enumerate()
        .map(|(i, &c)| c * (n - 1 - i) as f64)
        .collect();
    Ok(Value::Matrix(Matrix::row_vec(data)))
}

fn polyint(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("polyint", args, 1, 2)?;
    let p = super::matrix_arg("polyint", args, 0)?;
    let c0 = if args.len() == 2 { super::scalar_arg("polyint", args, 1)? } else { 0.0 };
    let n = p.data.len();
    let mut data: Vec<f64> = p.data.iter().enumerate().map(|(i, &c)| c / (n - i) as f64).collect();
    data.push(c0);
    Ok(Value::Matrix(Matrix::row_vec(data)))
}

fn interp1(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("interp1", args, 3)?;
    let x = super::matrix_arg("interp1", args, 0)?;
    let y = super::matrix_arg("interp1", args, 1)?;
    let xq = super::matrix_arg("interp1", args, 2)?;
    let interp_one = |q: f64| -> f64 {
        if x.data.is_empty() {
            return f64::NAN;
        }
        for i in 0..x.data.len() - 1 {
            let (x0, x1) = (x.data[i], x.data[i + 1]);
            if (q >= x0 && q <= x1) || (q <= x0 && q >= x1) {
                let t = (q - x0) / (x1 - x0);
                return y.data[i] + t * (y.data[i + 1] - y.data[i]);
            }
        }
        f64::NAN
    };
    Ok(Value::Matrix(xq.map(interp_one)))
}

fn diff(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("diff", args, 1)?;
    let m = super::matrix_arg("diff", args, 0)?;
    if m.data.len() < 2 {
        return Ok(Value::Matrix(Matrix::empty()));
    }
    let data: Vec<f64> = m.data.windows(2).map(|w| w[1] - w[0]).collect();
    Ok(Value::Matrix(if m.rows == 1 { Matrix::row_vec(data) } else { Matrix::col_vec(data) }))
}

fn gradient(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("gradient", args, 1)?;
    let m = super::matrix_arg("gradient", args, 0)?;
    let n = m.data.len();
    if n < 2 {
        return Ok(Value::Matrix(m.clone()));
    }
    let mut data = vec![0.0; n];
    data[0] = m.data[1] - m.data[0];
    data[n - 1] = m.data[n - 1] - m.data[n - 2];
    for i in 1..n - 1 {
        data[i] = (m.data[i + 1] - m.data[i - 1]) / 2.0;
    }
    Ok(Value::Matrix(if m.rows == 1 { Matrix::row_vec(data) } else { Matrix::col_vec(data) }))
}

fn trapz(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("trapz", args, 1, 2)?;
    let (x, y) = trapz_args(args)?;
    Ok(Value::scalar(trapz_area(&x, &y)))
}

fn cumtrapz(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("cumtrapz", args, 1, 2)?;
    let (x, y) = trapz_args(args)?;
    let mut acc = 0.0;
    let mut out = vec![0.0; y.len()];
    for i in 1..y.len() {
        acc += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
        out[i] = acc;
    }
    Ok(Value::Matrix(Matrix::row_vec(out)))
}

fn trapz_args(args: &[Value]) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
    if args.len() == 2 {
        let x = super::matrix_arg("trapz", args, 0)?;
        let y = super::matrix_arg("trapz", args, 1)?;
        Ok((x.data.clone(), y.data.clone()))
    } else {
        let y = super::matrix_arg("trapz", args, 0)?;
        Ok(((0..y.data.len()).map(|i| i as f64).collect(), y.data.clone()))
    }
}

fn trapz_area(x: &[f64], y: &[f64]) -> f64 {
    (1..y.len()).map(|i| (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0).sum()
}

/// Numeric quadrature over `[a, b]` via Simpson's rule with 1000 panels,
/// applied to a function handle (spec.md §4.5's `integral(f, a, b)`).
fn integral(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("integral", args, 3)?;
    let handle = match &args[0] {
        Value::FuncHandle(h) => h.clone(),
        other => return Err(EvalError::type_error("integral", "function handle", other, 1)),
    };
    let a = super::scalar_arg("integral", args, 1)?;
    let b = super::scalar_arg("integral", args, 2)?;
    const PANELS: usize = 1000;
    let h = (b - a) / PANELS as f64;
    let eval_at = |engine: &mut Engine, x: f64| -> Result<f64, EvalError> {
        let out = engine.call_handle(&handle, vec![Value::scalar(x)], 1)?;
        out.into_iter().next().and_then(|v| v.as_scalar()).ok_or_else(|| {
            EvalError::runtime_error("integral", "integrand must return a scalar")
        })
    };
    let mut sum = eval_at(engine, a)? + eval_at(engine, b)?;
    for i in 1..PANELS {
        let x = a + i as f64 * h;
        let weight = if i % 2 == 0 { 2.0 } else { 4.0 };
        sum += weight * eval_at(engine, x)?;
    }
    Ok(Value::scalar(sum * h / 3.0))
}

/// Fixed-step RK4 (spec.md's stand-in for `ode45`'s adaptive stepper,
/// matching the level of fidelity the rest of the numeric kernels target).
/// Returns a 2-element cell `{t, y}` where `y` has one solution row per
/// output variable and one column per time step.
fn ode45(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("ode45", args, 3)?;
    let handle = match &args[0] {
        Value::FuncHandle(h) => h.clone(),
        other => return Err(EvalError::type_error("ode45", "function handle", other, 1)),
    };
    let span = super::matrix_arg("ode45", args, 1)?;
    let (t0, t1) = (span.data[0], *span.data.last().unwrap_or(&span.data[0]));
    let y0 = super::matrix_arg("ode45", args, 2)?.data.clone();
    const STEPS: usize = 200;
    let h = (t1 - t0) / STEPS as f64;
    let deriv = |engine: &mut Engine, t: f64, y: &[f64]| -> Result<Vec<f64>, EvalError> {
        let out = engine.call_handle(&handle, vec![Value::scalar(t), Value::Matrix(Matrix::col_vec(y.to_vec()))], 1)?;
        match out.into_iter().next() {
            Some(Value::Matrix(m)) => Ok(m.data),
            _ => Err(EvalError::runtime_error("ode45", "derivative function must return a vector")),
        }
    };
    let n = y0.len();
    let mut t = t0;
    let mut y = y0;
    let mut ts = vec![t];
    let mut ys = vec![y.clone()];
    for _ in 0..STEPS {
        let k1 = deriv(engine, t, &y)?;
        let y2: Vec<f64> = (0..n).map(|i| y[i] + h / 2.0 * k1[i]).collect();
        let k2 = deriv(engine, t + h / 2.0, &y2)?;
        let y3: Vec<f64> = (0..n).map(|i| y[i] + h / 2.0 * k2[i]).collect();
        let k3 = deriv(engine, t + h / 2.0, &y3)?;
        let y4: Vec<f64> = (0..n).map(|i| y[i] + h * k3[i]).collect();
        let k4 = deriv(engine, t + h, &y4)?;
        y = (0..n).map(|i| y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i])).collect();
        t += h;
        ts.push(t);
        ys.push(y.clone());
    }
    let t_col = Matrix::col_vec(ts);
    let mut y_mat = Matrix::zeros(ys.len(), n);
    for (r, row) in ys.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            y_mat.set(r, c, v);
        }
    }
    Ok(Value::Cell(crate::value::Cell::new(1, 2, vec![Value::Matrix(t_col), Value::Matrix(y_mat)])))
}

/// Nelder-Mead simplex search for scalar-valued multivariate objectives.
fn fminsearch(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("fminsearch", args, 2)?;
    let handle = match &args[0] {
        Value::FuncHandle(h) => h.clone(),
        other => return Err(EvalError::type_error("fminsearch", "function handle", other, 1)),
    };
    let x0 = super::matrix_arg("fminsearch", args, 1)?.data.clone();
    let n = x0.len();
    let objective = |engine: &mut Engine, x: &[f64]| -> Result<f64, EvalError> {
        let out = engine.call_handle(&handle, vec![Value::Matrix(Matrix::row_vec(x.to_vec()))], 1)?;
        out.into_iter().next().and_then(|v| v.as_scalar()).ok_or_else(|| {
            EvalError::runtime_error("fminsearch", "objective must return a scalar")
        })
    };
    let mut simplex: Vec<Vec<f64>> = vec![x0.clone()];
    for i in 0..n {
        let mut v = x0.clone();
        v[i] += if v[i] != 0.0 { 0.05 * v[i] } else { 0.00025 };
        simplex.push(v);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| objective(engine, v)).collect::<Result<_, _>>()?;
    for _ in 0..400 {
        let mut order: Vec<usize> = (0..simplex.len()).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
        let simplex2: Vec<Vec<f64>> = order.iter().map(|&i| simplex[i].clone()).collect();
        let values2: Vec<f64> = order.iter().map(|&i| values[i]).collect();
        simplex = simplex2;
        values = values2;
        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = &simplex[n];
        let reflected: Vec<f64> = (0..n).map(|j| centroid[j] + (centroid[j] - worst[j])).collect();
        let f_reflected = objective(engine, &reflected)?;
        if f_reflected < values[0] {
            let expanded: Vec<f64> = (0..n).map(|j| centroid[j] + 2.0 * (centroid[j] - worst[j])).collect();
            let f_expanded = objective(engine, &expanded)?;
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
        } else if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
        } else {
            let contracted: Vec<f64> = (0..n).map(|j| centroid[j] + 0.5 * (worst[j] - centroid[j])).collect();
            let f_contracted = objective(engine, &contracted)?;
            if f_contracted < values[n] {
                simplex[n] = contracted;
                values[n] = f_contracted;
            } else {
                let best = simplex[0].clone();
                for v in simplex.iter_mut().skip(1) {
                    for j in 0..n {
                        v[j] = best[j] + 0.5 * (v[j] - best[j]);
                    }
                }
                values = simplex.iter().map(|v| objective(engine, v)).collect::<Result<_, _>>()?;
            }
        }
    }
    let mut order: Vec<usize> = (0..simplex.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
    Ok(Value::Matrix(Matrix::row_vec(simplex[order[0]].clone())))
}

/// Bisection after an expanding bracket search (robust, simple, matches
/// the rest of this engine's numeric methods in spirit).
fn fzero(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("fzero", args, 2)?;
    let handle = match &args[0] {
        Value::FuncHandle(h) => h.clone(),
        other => return Err(EvalError::type_error("fzero", "function handle", other, 1)),
    };
    let x0 = super::scalar_arg("fzero", args, 1)?;
    let eval_at = |engine: &mut Engine, x: f64| -> Result<f64, EvalError> {
        let out = engine.call_handle(&handle, vec![Value::scalar(x)], 1)?;
        out.into_iter().next().and_then(|v| v.as_scalar()).ok_or_else(|| {
            EvalError::runtime_error("fzero", "function must return a scalar")
        })
    };
    let mut a = x0 - 1.0;
    let mut b = x0 + 1.0;
    let mut fa = eval_at(engine, a)?;
    let mut fb = eval_at(engine, b)?;
    let mut expand = 0;
    while fa.signum() == fb.signum() && expand < 50 {
        a -= (b - a) * 0.5;
        b += (b - a) * 0.5;
        fa = eval_at(engine, a)?;
        fb = eval_at(engine, b)?;
        expand += 1;
    }
    if fa.signum() == fb.signum() {
        return Err(EvalError::runtime_error("fzero", "could not bracket a root"));
    }
    for _ in 0..200 {
        let mid = (a + b) / 2.0;
        let fmid = eval_at(engine, mid)?;
        if fmid.abs() < 1e-12 || (b - a).abs() < 1e-12 {
            return Ok(Value::scalar(mid));
        }
        if fmid.signum() == fa.signum() {
            a = mid;
            fa = fmid;
        } else {
            b = mid;
        }
    }
    Ok(Value::scalar((a + b) / 2.0))
}

/// Lanczos approximation (g=7, n=9), the usual stand-in for a true gamma
/// function implementation.
fn gamma_scalar(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    if x < 0.5 {
        std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma_scalar(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut a = COEFFS[0];
        let t = x + G + 0.5;
        for (i, &c) in COEFFS.iter().enumerate().skip(1) {
            a += c / (x + i as f64);
        }
        (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
    }
}

fn gamma(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("gamma", args, gamma_scalar)
}

/// Abramowitz-Stegun rational approximation, max error ~1.5e-7.
fn erf_scalar(x: f64) -> f64 {
    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t * (0.254829592 + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

fn erf(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("erf", args, erf_scalar)
}

fn erfc(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("erfc", args, |x| 1.0 - erf_scalar(x))
}

fn normpdf(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("normpdf", args, 1, 3)?;
    let mu = if args.len() >= 2 { super::scalar_arg("normpdf", args, 1)? } else { 0.0 };
    let sigma = if args.len() == 3 { super::scalar_arg("normpdf", args, 2)? } else { 1.0 };
    super::elementwise_unary("normpdf", &args[..1], move |x| {
        let z = (x - mu) / sigma;
        (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
    })
}

fn normcdf(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("normcdf", args, 1, 3)?;
    let mu = if args.len() >= 2 { super::scalar_arg("normcdf", args, 1)? } else { 0.0 };
    let sigma = if args.len() == 3 { super::scalar_arg("normcdf", args, 2)? } else { 1.0 };
    super::elementwise_unary("normcdf", &args[..1], move |x| {
        let z = (x - mu) / (sigma * std::f64::consts::SQRT_2);
        0.5 * (1.0 + erf_scalar(z))
    })
}

/// Inverse normal CDF via the Acklam rational approximation.
fn norminv_scalar(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) || p == 0.0 || p == 1.0 {
        return if p <= 0.0 { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    const A: [f64; 6] = [-3.969683028665376e+01, 2.209460984245205e+02, -2.759285104469687e+02, 1.383577518672690e+02, -3.066479806614716e+01, 2.506628277459239e+00];
    const B: [f64; 5] = [-5.447609879822406e+01, 1.615858368580409e+02, -1.556989798598866e+02, 6.680131188771972e+01, -1.328068155288572e+01];
    const C: [f64; 6] = [-7.784894002430293e-03, -3.223964580411365e-01, -2.400758277161838e+00, -2.549732539343734e+00, 4.374664141464968e+00, 2.938163982698783e+00];
    const D: [f64; 4] = [7.784695709041462e-03, 3.224671290700398e-01, 2.445134137142996e+00, 3.754408661907416e+00];
    let p_low = 0.02425;
    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - p_low {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

fn norminv(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("norminv", args, norminv_scalar)
}
