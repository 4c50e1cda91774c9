use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::fs;
use std::path::Path;

use crate::error::{plot_error, Result};
use utils::AsHistory;

const PANEL_SIZE: (u32, u32) = (600, 300);

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub series: Vec<Series>,
}

impl Panel {
    fn from_columns(source: &utils::MetricHistory, metric: &str, include_validation: bool) -> Self {
        let mut columns = vec![metric.to_string()];
        if include_validation {
            columns.push(format!("val_{}", metric));
        }

        Self {
            title: metric.to_string(),
            series: source
                .select(&columns)
                .into_iter()
                .map(|(name, values)| Series {
                    name: name.to_string(),
                    values: values.to_vec(),
                })
                .collect(),
        }
    }

    fn epochs(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    fn value_range(&self) -> (f64, f64) {
        let finite = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite());

        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

        if min > max {
            (0.0, 1.0)
        } else if min == max {
            (min - 0.5, max + 0.5)
        } else {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
    }

    fn draw(&self, area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
        let (min, max) = self.value_range();
        let last_epoch = self.epochs().saturating_sub(1).max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(
                &self.title,
                ("sans-serif", 20).into_font().style(FontStyle::Bold),
            )
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..last_epoch, min..max)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("epoch")
            .draw()
            .map_err(plot_error)?;

        for (i, series) in self.series.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            let points = series
                .values
                .iter()
                .enumerate()
                .map(|(epoch, value)| (epoch as f64, *value));

            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(plot_error)?
                .label(series.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        if !self.series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(plot_error)?;
        }

        Ok(())
    }
}

/// Loss curve, and optionally one more metric, per epoch.
///
/// Requested columns missing from the history are left out of the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningCurve {
    panels: Vec<Panel>,
}

impl LearningCurve {
    pub fn new<H: AsHistory + ?Sized>(
        source: &H,
        extra_metric: Option<&str>,
        include_validation: bool,
    ) -> Self {
        let history = source.to_history();

        let mut panels = vec![Panel::from_columns(&history, "loss", include_validation)];
        if let Some(metric) = extra_metric {
            panels.push(Panel::from_columns(&history, metric, include_validation));
        }

        Self { panels }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn to_svg_string(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let size = (PANEL_SIZE.0 * self.panels.len() as u32, PANEL_SIZE.1);
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            root.fill(&WHITE).map_err(plot_error)?;

            let areas = root.split_evenly((1, self.panels.len()));
            for (panel, area) in self.panels.iter().zip(areas.iter()) {
                panel.draw(area)?;
            }
            root.present().map_err(plot_error)?;
        }
        Ok(svg)
    }

    pub fn render_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let svg = self.to_svg_string()?;
        fs::write(path.as_ref(), svg)?;
        log::info!("Saved learning curve to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use utils::MetricHistory;

    fn history() -> MetricHistory {
        let mut history = MetricHistory::new();
        history.insert("loss", vec![1.0, 0.6, 0.4]);
        history.insert("val_loss", vec![1.1, 0.8, 0.7]);
        history.insert("accuracy", vec![0.5, 0.7, 0.8]);
        history
    }

    fn names(panel: &Panel) -> Vec<&str> {
        panel.series.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_loss_panel_only_by_default() {
        let curve = LearningCurve::new(&history(), None, true);
        assert_eq!(curve.panels().len(), 1);
        assert_eq!(curve.panels()[0].title, "loss");
        assert_eq!(names(&curve.panels()[0]), vec!["loss", "val_loss"]);
    }

    #[test]
    fn test_missing_columns_are_skipped() {
        let curve = LearningCurve::new(&history(), Some("accuracy"), true);
        assert_eq!(curve.panels().len(), 2);
        // No val_accuracy recorded.
        assert_eq!(names(&curve.panels()[1]), vec!["accuracy"]);

        let curve = LearningCurve::new(&history(), Some("auc"), true);
        assert!(curve.panels()[1].series.is_empty());
    }

    #[test]
    fn test_validation_can_be_excluded() {
        let curve = LearningCurve::new(&history(), Some("accuracy"), false);
        assert_eq!(names(&curve.panels()[0]), vec!["loss"]);
    }

    #[test]
    fn test_accepts_raw_mapping() {
        let mut raw = HashMap::new();
        raw.insert("loss".to_string(), vec![0.3, 0.2]);
        let curve = LearningCurve::new(&raw, None, true);
        assert_eq!(curve.panels()[0].series[0].values, vec![0.3, 0.2]);
    }

    #[test]
    fn test_value_range_pads_flat_series() {
        let mut history = MetricHistory::new();
        history.insert("loss", vec![2.0, 2.0]);
        let curve = LearningCurve::new(&history, None, true);
        assert_eq!(curve.panels()[0].value_range(), (1.5, 2.5));
    }

    #[test]
    fn test_renders_svg() -> Result<()> {
        let curve = LearningCurve::new(&history(), Some("accuracy"), true);
        let svg = curve.to_svg_string()?;
        assert!(svg.contains("<svg"));
        assert!(svg.contains("val_loss"));

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("curve.svg");
        curve.render_svg(&path)?;
        assert!(path.is_file());
        Ok(())
    }
}
