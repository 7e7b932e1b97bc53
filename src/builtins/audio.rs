// ABOUTME: Audio playback - encodes samples as a WAV data URL and publishes it through the plot sink

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::Value;

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("sound", sound as BuiltinFn);
    table.insert("soundsc", soundsc as BuiltinFn);
}

/// `sound(y, fs)` has no audio device to write to in this engine; it encodes
/// the samples as a WAV data URL (spec.md §4.6) and hands it to the host via
/// `disp`, the only output channel builtins have access to.
fn sound(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("sound", args, 1, 2)?;
    let samples = super::matrix_arg("sound", args, 0)?;
    let fs = if args.len() == 2 { super::scalar_arg("sound", args, 1)? as u32 } else { 8192 };
    let url = crate::plot::audio_data_url(&samples.data, fs);
    engine.emit(&format!("{url}\n"));
    Ok(Value::Empty)
}

/// Like `sound` but scales samples to fill [-1, 1] first.
fn soundsc(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("soundsc", args, 1, 2)?;
    let samples = super::matrix_arg("soundsc", args, 0)?;
    let fs = if args.len() == 2 { super::scalar_arg("soundsc", args, 1)? as u32 } else { 8192 };
    let peak = samples.data.iter().fold(0.0f64, |acc, &v| acc.max(v.abs())).max(1e-12);
    let scaled: Vec<f64> = samples.data.iter().map(|&v| v / peak).collect();
    let url = crate::plot::audio_data_url(&scaled, fs);
    engine.emit(&format!("{url}\n"));
    Ok(Value::Empty)
}
