use plotters::prelude::*;
use std::fs;
use std::path::Path;

use crate::error::{plot_error, Result, VisualizeError};
use evaluation::{Metric, MetricValue};

const CHART_SIZE: (u32, u32) = (800, 400);
const GROUP_WIDTH: f64 = 0.8;

fn distinct<T: PartialEq + Clone>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// Draws `(metric, model, value)` rows as bars grouped by metric, one colour
/// per model.
pub fn render_metric_comparison(rows: &[MetricValue]) -> Result<String> {
    if rows.is_empty() {
        return Err(VisualizeError::Empty);
    }

    let metrics: Vec<Metric> = distinct(rows.iter().map(|row| row.metric));
    let models: Vec<&str> = distinct(rows.iter().map(|row| row.model.as_str()));
    let top = rows
        .iter()
        .map(|row| row.value)
        .filter(|v| v.is_finite())
        .fold(1.0f64, f64::max)
        * 1.05;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(10)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..metrics.len() as f64, -0.08 * top..top)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_x_axis()
            .y_desc("value")
            .draw()
            .map_err(plot_error)?;

        let bar_width = GROUP_WIDTH / models.len() as f64;
        for (j, model) in models.iter().enumerate() {
            let color = Palette99::pick(j).to_rgba();
            let bars = rows
                .iter()
                .filter(|row| row.model == *model)
                .filter_map(|row| {
                    let group = metrics.iter().position(|m| *m == row.metric)? as f64;
                    let left = group + (1.0 - GROUP_WIDTH) / 2.0 + j as f64 * bar_width;
                    Some(Rectangle::new(
                        [(left, 0.0), (left + bar_width, row.value)],
                        color.filled(),
                    ))
                });

            chart
                .draw_series(bars)
                .map_err(plot_error)?
                .label(model.to_string())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        chart
            .draw_series(metrics.iter().enumerate().map(|(i, metric)| {
                Text::new(
                    metric.to_string(),
                    (i as f64 + 0.4, -0.04 * top),
                    ("sans-serif", 14),
                )
            }))
            .map_err(plot_error)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }

    Ok(svg)
}

/// Renders the comparison bar chart to an SVG file.
pub fn plot_metric_comparison(rows: &[MetricValue], path: impl AsRef<Path>) -> Result<()> {
    let svg = render_metric_comparison(rows)?;
    fs::write(path.as_ref(), svg)?;
    log::info!("Saved metric comparison to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(metric: Metric, model: &str, value: f64) -> MetricValue {
        MetricValue {
            metric,
            model: model.to_string(),
            value,
        }
    }

    #[test]
    fn test_renders_all_models_and_metrics() -> Result<()> {
        let rows = vec![
            row(Metric::Precision, "cnn", 0.9),
            row(Metric::Accuracy, "cnn", 0.85),
            row(Metric::Precision, "mlp", 0.7),
            row(Metric::Accuracy, "mlp", 0.75),
        ];

        let svg = render_metric_comparison(&rows)?;
        assert!(svg.contains("<svg"));
        assert!(svg.contains("cnn"));
        assert!(svg.contains("mlp"));
        assert!(svg.contains("precision"));
        assert!(svg.contains("accuracy"));
        Ok(())
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            render_metric_comparison(&[]),
            Err(VisualizeError::Empty)
        ));
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        assert_eq!(distinct([3, 1, 3, 2, 1].into_iter()), vec![3, 1, 2]);
    }
}
