// ABOUTME: Plotting builtins - populate the engine's current Figure and publish it to the host

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::plot::{Series, SeriesKind};
use crate::value::Value;

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("plot", plot as BuiltinFn);
    table.insert("scatter", scatter as BuiltinFn);
    table.insert("bar", bar as BuiltinFn);
    table.insert("stem", stem as BuiltinFn);
    table.insert("stairs", stairs as BuiltinFn);
    table.insert("area", area as BuiltinFn);
    table.insert("hist", hist as BuiltinFn);
    table.insert("surf", surf as BuiltinFn);
    table.insert("mesh", surf as BuiltinFn);
    table.insert("contour", surf as BuiltinFn);
    table.insert("plot3", plot3 as BuiltinFn);
    table.insert("imagesc", imagesc as BuiltinFn);
    table.insert("title", title as BuiltinFn);
    table.insert("xlabel", xlabel as BuiltinFn);
    table.insert("ylabel", ylabel as BuiltinFn);
    table.insert("legend", legend as BuiltinFn);
    table.insert("grid", grid as BuiltinFn);
    table.insert("hold", hold as BuiltinFn);
    table.insert("figure", figure as BuiltinFn);
    table.insert("xlim", xlim as BuiltinFn);
    table.insert("ylim", ylim as BuiltinFn);
    table.insert("clf", clf as BuiltinFn);
    table.insert("close", close as BuiltinFn);
    table.insert("subplot", subplot as BuiltinFn);
}

/// `plot(y)` uses `1:numel(y)` as the x-axis; `plot(x, y)` uses both.
fn xy_args(name: &str, args: &[Value]) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
    super::check_arity_range(name, args, 1, 2)?;
    if args.len() == 1 {
        let y = super::matrix_arg(name, args, 0)?;
        let x: Vec<f64> = (1..=y.data.len()).map(|i| i as f64).collect();
        Ok((x, y.data.clone()))
    } else {
        let x = super::matrix_arg(name, args, 0)?;
        let y = super::matrix_arg(name, args, 1)?;
        Ok((x.data.clone(), y.data.clone()))
    }
}

fn push(engine: &mut Engine, kind: SeriesKind, args: &[Value], name: &str) -> Result<Value, EvalError> {
    let (x, y) = xy_args(name, args)?;
    engine.figure.push_series(Series::new(kind, x, y));
    engine.emit_plot();
    Ok(Value::Empty)
}

fn plot(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    push(engine, SeriesKind::Line, args, "plot")
}

fn scatter(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    push(engine, SeriesKind::Scatter, args, "scatter")
}

fn bar(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    push(engine, SeriesKind::Bar, args, "bar")
}

fn stem(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    push(engine, SeriesKind::Stem, args, "stem")
}

fn stairs(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    push(engine, SeriesKind::Stairs, args, "stairs")
}

fn area(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    push(engine, SeriesKind::Area, args, "area")
}

/// Bins data into `nbins` (default 10) equal-width buckets and plots bucket
/// centers against counts, the same shape `bar` consumes.
fn hist(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("hist", args, 1, 2)?;
    let data = super::matrix_arg("hist", args, 0)?;
    let nbins = if args.len() == 2 { super::scalar_arg("hist", args, 1)? as usize } else { 10 }.max(1);
    let lo = data.data.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = data.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = (hi - lo).max(1e-12) / nbins as f64;
    let mut counts = vec![0.0; nbins];
    for &v in &data.data {
        let idx = (((v - lo) / width) as usize).min(nbins - 1);
        counts[idx] += 1.0;
    }
    let centers: Vec<f64> = (0..nbins).map(|i| lo + width * (i as f64 + 0.5)).collect();
    engine.figure.push_series(Series::new(SeriesKind::Hist, centers, counts));
    engine.emit_plot();
    Ok(Value::Empty)
}

/// This engine's `Figure` model (spec.md §4.6) has no 3-D/grid series kind,
/// so `surf`/`mesh`/`contour` flatten their `Z` matrix column-by-column into
/// a `Line` series against a synthetic linear index — enough to publish a
/// figure the host can render, not a faithful 3-D surface.
fn surf(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("surf", args, 1, 3)?;
    let z = super::matrix_arg("surf", args, args.len() - 1)?;
    let x: Vec<f64> = (1..=z.data.len()).map(|i| i as f64).collect();
    engine.figure.push_series(Series::new(SeriesKind::Line, x, z.data.clone()));
    engine.emit_plot();
    Ok(Value::Empty)
}

fn plot3(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("plot3", args, 3)?;
    let x = super::matrix_arg("plot3", args, 0)?;
    let y = super::matrix_arg("plot3", args, 1)?;
    let _z = super::matrix_arg("plot3", args, 2)?;
    engine.figure.push_series(Series::new(SeriesKind::Line, x.data.clone(), y.data.clone()));
    engine.emit_plot();
    Ok(Value::Empty)
}

fn imagesc(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("imagesc", args, 1)?;
    let m = super::matrix_arg("imagesc", args, 0)?;
    let x: Vec<f64> = (1..=m.data.len()).map(|i| i as f64).collect();
    engine.figure.push_series(Series::new(SeriesKind::Line, x, m.data.clone()));
    engine.emit_plot();
    Ok(Value::Empty)
}

fn title(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("title", args, 1)?;
    engine.figure.title = Some(super::string_arg("title", args, 0)?.to_string());
    Ok(Value::Empty)
}

fn xlabel(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("xlabel", args, 1)?;
    engine.figure.xlabel = Some(super::string_arg("xlabel", args, 0)?.to_string());
    Ok(Value::Empty)
}

fn ylabel(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("ylabel", args, 1)?;
    engine.figure.ylabel = Some(super::string_arg("ylabel", args, 0)?.to_string());
    Ok(Value::Empty)
}

fn legend(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("legend", args, 0, usize::MAX)?;
    engine.figure.legend = true;
    for (series, arg) in engine.figure.series.iter_mut().zip(args) {
        if let Value::String(s) = arg {
            series.label = Some(s.clone());
        }
    }
    Ok(Value::Empty)
}

fn grid(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("grid", args, 0, 1)?;
    engine.figure.grid = match args.first() {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("on"),
        None => !engine.figure.grid,
        Some(other) => other.is_truthy(),
    };
    Ok(Value::Empty)
}

fn hold(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("hold", args, 0, 1)?;
    engine.figure.hold = match args.first() {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("on"),
        None => !engine.figure.hold,
        Some(other) => other.is_truthy(),
    };
    Ok(Value::Empty)
}

fn figure(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("figure", args, 0)?;
    let id = engine.new_figure_id();
    engine.figure = crate::plot::Figure::new(id);
    Ok(Value::scalar(id as f64))
}

fn xlim(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("xlim", args, 1)?;
    let m = super::matrix_arg("xlim", args, 0)?;
    if m.data.len() == 2 {
        engine.figure.xlim = Some((m.data[0], m.data[1]));
    }
    Ok(Value::Empty)
}

fn ylim(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("ylim", args, 1)?;
    let m = super::matrix_arg("ylim", args, 0)?;
    if m.data.len() == 2 {
        engine.figure.ylim = Some((m.data[0], m.data[1]));
    }
    Ok(Value::Empty)
}

fn clf(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("clf", args, 0)?;
    let id = engine.figure.id;
    engine.figure = crate::plot::Figure::new(id);
    Ok(Value::Empty)
}

fn close(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("close", args, 0, 1)?;
    let id = engine.figure.id;
    engine.figure = crate::plot::Figure::new(id);
    Ok(Value::Empty)
}

/// `subplot(rows, cols, index)` pre-populates the grid if needed and
/// selects which cell subsequent plotting calls route to, via
/// `Figure::active_series_mut`.
fn subplot(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("subplot", args, 3)?;
    let rows = super::scalar_arg("subplot", args, 0)? as usize;
    let cols = super::scalar_arg("subplot", args, 1)? as usize;
    let index = super::scalar_arg("subplot", args, 2)? as usize;
    let total = rows * cols;
    if engine.figure.subplots.len() != total {
        let id = engine.figure.id;
        engine.figure.subplots = (0..total).map(|_| crate::plot::Figure::new(id)).collect();
    }
    engine.figure.active_subplot = Some(index.saturating_sub(1).min(total.saturating_sub(1)));
    Ok(Value::Empty)
}
