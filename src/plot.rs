// ABOUTME: Declarative figure and audio descriptors published to the host embedder

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SeriesKind {
    Line,
    Scatter,
    Bar,
    Stem,
    Stairs,
    Area,
    Hist,
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub kind: SeriesKind,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Option<String>,
    pub line_width: Option<f64>,
    pub line_style: Option<String>,
    pub marker: Option<String>,
    pub marker_size: Option<f64>,
    pub label: Option<String>,
    pub fill_alpha: Option<f64>,
}

impl Series {
    pub fn new(kind: SeriesKind, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            kind,
            x,
            y,
            color: None,
            line_width: None,
            line_style: None,
            marker: None,
            marker_size: None,
            label: None,
            fill_alpha: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub id: u32,
    pub series: Vec<Series>,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub grid: bool,
    pub legend: bool,
    pub hold: bool,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    /// Subplot grid, fully wired per DESIGN.md's Open Question resolution:
    /// active plotting calls route into `subplots[active_subplot]` when a
    /// subplot grid has been established by `subplot(...)`.
    pub subplots: Vec<Figure>,
    pub active_subplot: Option<usize>,
}

impl Figure {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            series: Vec::new(),
            title: None,
            xlabel: None,
            ylabel: None,
            grid: false,
            legend: false,
            hold: false,
            xlim: None,
            ylim: None,
            subplots: Vec::new(),
            active_subplot: None,
        }
    }

    /// Route to the active subplot's series list if one is selected,
    /// otherwise to the top-level series list.
    pub fn active_series_mut(&mut self) -> &mut Vec<Series> {
        if let Some(idx) = self.active_subplot {
            if let Some(sub) = self.subplots.get_mut(idx) {
                return &mut sub.series;
            }
        }
        &mut self.series
    }

    pub fn push_series(&mut self, series: Series) {
        let hold = self.hold;
        let target = self.active_series_mut();
        if !hold {
            target.clear();
        }
        target.push(series);
    }
}

/// 16-bit little-endian mono WAV encoding for `sound(y, fs)` (spec.md §4.6).
pub fn encode_wav(samples: &[f64], sample_rate: u32) -> Vec<u8> {
    let num_samples = samples.len() as u32;
    let byte_rate = sample_rate * 2;
    let data_size = num_samples * 2;
    let mut out = Vec::with_capacity(44 + data_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let v = (clamped * i16::MAX as f64) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn audio_data_url(samples: &[f64], sample_rate: u32) -> String {
    use base64::Engine as _;
    let wav = encode_wav(samples, sample_rate);
    let encoded = base64::engine::general_purpose::STANDARD.encode(wav);
    format!("data:audio/wav;base64,{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_has_riff_wave_markers() {
        let wav = encode_wav(&[0.0, 0.5, -0.5], 8000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 6);
    }

    #[test]
    fn hold_off_clears_previous_series() {
        let mut fig = Figure::new(1);
        fig.push_series(Series::new(SeriesKind::Line, vec![1.0], vec![2.0]));
        fig.push_series(Series::new(SeriesKind::Line, vec![3.0], vec![4.0]));
        assert_eq!(fig.series.len(), 1);
    }

    #[test]
    fn hold_on_appends_series() {
        let mut fig = Figure::new(1);
        fig.hold = true;
        fig.push_series(Series::new(SeriesKind::Line, vec![1.0], vec![2.0]));
        fig.push_series(Series::new(SeriesKind::Line, vec![3.0], vec![4.0]));
        assert_eq!(fig.series.len(), 2);
    }
}
