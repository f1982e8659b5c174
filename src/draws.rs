//! Chart of the cumulative profit/loss of a trade list.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::WHITE;

use crate::engine::TradeRecord;
use crate::errors::{Error, Result};
use crate::metrics::{Stats, equity_curve};

/// Aspect ratio for the generated charts.
const ASPECT_RATIO: f64 = 0.5625;
/// Size of the X-axis labels.
const X_LABEL_SIZE: i32 = 20;
/// Size of the Y-axis labels.
const Y_LABEL_SIZE: i32 = 20;

/// Output format of the chart with its file path.
#[derive(Debug, Clone)]
pub enum DrawOutput {
    Svg(PathBuf),
    Png(PathBuf),
}

impl DrawOutput {
    /// Picks the format from the file extension; anything but `.png` renders SVG.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => Self::Png(path.to_path_buf()),
            _ => Self::Svg(path.to_path_buf()),
        }
    }
}

impl Default for DrawOutput {
    fn default() -> Self {
        Self::Svg(PathBuf::from("equity.svg"))
    }
}

/// Configuration options for chart generation.
#[derive(Debug, Default)]
pub struct DrawOptions {
    title: Option<String>,
    output: DrawOutput,
    /// Whether to print the summary line under the curve.
    show_stats: bool,
}

impl DrawOptions {
    pub fn title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn draw_output(mut self, output: DrawOutput) -> Self {
        self.output = output;
        self
    }

    pub fn show_stats(mut self, show: bool) -> Self {
        self.show_stats = show;
        self
    }
}

/// Renders the equity curve of a trade list.
#[derive(Default)]
pub struct Draw<'d> {
    trades: &'d [TradeRecord],
    options: DrawOptions,
}

impl<'d> Draw<'d> {
    pub fn with_trades(trades: &'d [TradeRecord]) -> Self {
        Self {
            trades,
            options: DrawOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DrawOptions) -> Self {
        self.options = options;
        self
    }

    /// Generates and saves the chart.
    pub fn plot(&self) -> Result<()> {
        let curve = equity_curve(self.trades);
        if curve.is_empty() {
            return Err(Error::Msg("no trades to draw".to_string()));
        }

        let title = self.options.title.as_deref().unwrap_or("Cumulative P/L");
        let height_factor = if self.options.show_stats { 1.2 } else { 1.0 };
        let width = 1280.max(4 * curve.len() as u32);
        let height = ((width as f64 * ASPECT_RATIO * height_factor) as u32).min(900);

        match &self.options.output {
            DrawOutput::Svg(path) => {
                let root = SVGBackend::new(path, (width, height)).into_drawing_area();
                root.fill(&WHITE).map_err(|e| Error::Plotters(e.to_string()))?;
                self.draw_chart(&root, &curve, title)
            }
            DrawOutput::Png(path) => {
                let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
                root.fill(&WHITE).map_err(|e| Error::Plotters(e.to_string()))?;
                self.draw_chart(&root, &curve, title)
            }
        }?;

        tracing::info!(trades = self.trades.len(), "chart written");
        Ok(())
    }

    fn draw_chart<DB: DrawingBackend>(
        &self,
        drawing_area: &DrawingArea<DB, Shift>,
        curve: &[(NaiveDate, f64)],
        title: &str,
    ) -> Result<()> {
        let (curve_area, stats_area) = if self.options.show_stats {
            let total_height = drawing_area.dim_in_pixel().1 as f64;
            drawing_area.split_vertically((total_height * 0.85) as u32)
        } else {
            (drawing_area.clone(), drawing_area.clone())
        };

        self.draw_curve(&curve_area, curve, title)?;
        if self.options.show_stats {
            self.draw_stats(&stats_area)?;
        }

        drawing_area.present().map_err(|e| Error::Plotters(e.to_string()))
    }

    fn draw_curve<DB: DrawingBackend>(
        &self,
        drawing_area: &DrawingArea<DB, Shift>,
        curve: &[(NaiveDate, f64)],
        title: &str,
    ) -> Result<()> {
        let (dates, values) = bounds(curve);
        let drawing_area = drawing_area.margin(10, 10, 70, 70);

        let mut chart = ChartBuilder::on(&drawing_area)
            .caption(title, ("sans-serif", 30).into_font())
            .x_label_area_size(X_LABEL_SIZE)
            .y_label_area_size(Y_LABEL_SIZE)
            .build_cartesian_2d(dates, values)
            .map_err(|e| Error::Plotters(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("P/L")
            .x_label_style(("sans-serif", X_LABEL_SIZE))
            .y_label_style(("sans-serif", Y_LABEL_SIZE))
            .y_labels(5)
            .draw()
            .map_err(|e| Error::Plotters(e.to_string()))?;

        // zero line
        if let (Some((first, _)), Some((last, _))) = (curve.first(), curve.last()) {
            chart
                .draw_series(LineSeries::new([(*first, 0.0), (*last, 0.0)], BLACK.mix(0.3)))
                .map_err(|e| Error::Plotters(e.to_string()))?;
        }

        chart
            .draw_series(LineSeries::new(curve.iter().copied(), BLUE))
            .map_err(|e| Error::Plotters(e.to_string()))?;
        chart
            .draw_series(curve.iter().map(|&(date, value)| {
                let color = if value >= 0.0 { GREEN } else { RED };
                Circle::new((date, value), 2, color.filled())
            }))
            .map(|_| ())
            .map_err(|e| Error::Plotters(e.to_string()))
    }

    fn draw_stats<DB: DrawingBackend>(&self, drawing_area: &DrawingArea<DB, Shift>) -> Result<()> {
        let stats = Stats::from(self.trades);
        let text = format!(
            "Trades: {} | Total: ${:.2} | Win Rate: {:.2}% | Profit Factor: {:.2} | Max Drawdown: ${:.2}",
            stats.total_trades(),
            stats.total_profit(),
            stats.win_rate(),
            stats.profit_factor(),
            stats.max_drawdown()
        );
        drawing_area
            .margin(10, 0, 70, 70)
            .draw(&Text::new(text, (0, 10), ("sans-serif", 24).into_font()))
            .map_err(|e| Error::Plotters(e.to_string()))
    }
}

/// Axis ranges with a 10% padding on the values; a single date gets a one day span.
fn bounds(curve: &[(NaiveDate, f64)]) -> (std::ops::Range<NaiveDate>, std::ops::Range<f64>) {
    let first = curve.first().map(|(d, _)| *d).unwrap_or_default();
    let mut last = curve.last().map(|(d, _)| *d).unwrap_or_default();
    if last <= first {
        last = first + Duration::days(1);
    }

    let min = curve.iter().map(|(_, v)| *v).fold(0.0_f64, f64::min);
    let max = curve.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let padding = ((max - min) * 0.1).max(1.0);
    (first..last, min - padding..max + padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn empty_trades_cannot_be_drawn() {
        let trades: Vec<TradeRecord> = Vec::new();
        assert!(matches!(Draw::with_trades(&trades).plot(), Err(Error::Msg(_))));
    }

    #[test]
    fn output_format_from_extension() {
        assert!(matches!(DrawOutput::from_path("out/chart.PNG"), DrawOutput::Png(_)));
        assert!(matches!(DrawOutput::from_path("chart.svg"), DrawOutput::Svg(_)));
        assert!(matches!(DrawOutput::from_path("chart"), DrawOutput::Svg(_)));
    }

    #[test]
    fn bounds_include_zero_and_pad_values() {
        let (dates, values) = bounds(&[(day(2), 50.0), (day(6), 150.0)]);
        assert_eq!(dates, day(2)..day(6));
        assert_eq!(values, -15.0..165.0);
    }

    #[test]
    fn bounds_widen_single_date() {
        let (dates, _) = bounds(&[(day(2), -20.0)]);
        assert_eq!(dates, day(2)..day(3));
    }
}
