use super::figure::{self, Figure};
use super::spec::{PlotSpec, PlotType};
use super::transform::{self, PATHWAY_TOP, VOLCANO_ANNOTATE_TOP};
use crate::cache::ResultCache;
use crate::error::{Result, RnaseqlError};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

const DEFAULT_HISTOGRAM_BINS: usize = 30;

/// A rendered chart on disk plus a one-line description of what it shows.
#[derive(Debug, Clone)]
pub struct PlotArtifact {
    pub path: PathBuf,
    pub plot_type: PlotType,
    pub summary: String,
}

/// Turns the cached query result into an interactive HTML chart, applying
/// the plot-type-specific reshaping first. Rendering never touches the
/// database; everything it needs must already be in the cache.
pub struct PlotSynthesizer {
    output_dir: PathBuf,
}

impl PlotSynthesizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub fn render(&self, spec: &PlotSpec, cache: &ResultCache) -> Result<PlotArtifact> {
        let result = cache.current().ok_or(RnaseqlError::NoDataAvailable)?;

        let (figure, summary) = match spec.plot_type {
            PlotType::Volcano => {
                let annotate = spec.param_usize("annotate").unwrap_or(VOLCANO_ANNOTATE_TOP);
                let data = transform::volcano(result, annotate)?;
                let summary = format!(
                    "volcano plot with {} upregulated and {} downregulated genes (padj < {}, |log2FC| > {})",
                    data.count(transform::Significance::Upregulated),
                    data.count(transform::Significance::Downregulated),
                    transform::PADJ_THRESHOLD,
                    transform::LOG2FC_THRESHOLD,
                );
                let title = spec.param("title").unwrap_or("Volcano Plot - Differential Expression");
                (figure::volcano_figure(&data, title), summary)
            }
            PlotType::Ma => {
                let data = transform::ma(result)?;
                let summary = format!("MA plot of {} genes", data.points.len());
                let title = spec.param("title").unwrap_or("MA Plot");
                (figure::ma_figure(&data, title), summary)
            }
            PlotType::Heatmap => {
                let matrix = transform::correlation_matrix(result)?;
                let summary = format!(
                    "correlation heatmap across {} samples",
                    matrix.sample_labels.len()
                );
                let title = spec.param("title").unwrap_or("Sample Correlation Heatmap");
                (figure::heatmap_figure(&matrix, title), summary)
            }
            PlotType::Scatter => {
                let data =
                    transform::scatter(result, spec.param("x_column"), spec.param("y_column"))?;
                let mut summary = format!(
                    "scatter of {} vs {} over {} rows",
                    data.y_label,
                    data.x_label,
                    data.points.len()
                );
                if let Some(trend) = &data.trend {
                    summary.push_str(&format!(" with trend line (r = {:.2})", trend.r));
                }
                let title = spec
                    .param("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{} vs {}", data.y_label, data.x_label));
                (figure::scatter_figure(&data, &title), summary)
            }
            PlotType::Histogram => {
                let series = transform::numeric_series(result, spec.param("column"), "histogram")?;
                let bins = spec.param_usize("bins").unwrap_or(DEFAULT_HISTOGRAM_BINS);
                let summary = format!(
                    "histogram of {} ({} values)",
                    series.label,
                    series.values.len()
                );
                let title = spec
                    .param("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Distribution of {}", series.label));
                (figure::histogram_figure(&series, bins, &title), summary)
            }
            PlotType::Boxplot => {
                let series = transform::numeric_series(result, spec.param("column"), "boxplot")?;
                let summary = format!("box plot of {}", series.label);
                let title = spec
                    .param("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Distribution of {}", series.label));
                (figure::box_figure(&series, &title), summary)
            }
            PlotType::Bar => {
                let data = transform::bar(result, spec.param("x_column"), spec.param("y_column"))?;
                let summary = match &data.y_label {
                    Some(y) => format!("bar plot of {} by {}", y, data.x_label),
                    None => format!("count plot of {}", data.x_label),
                };
                let title = spec
                    .param("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Bar Plot: {}", data.x_label));
                (figure::bar_figure(&data, &title), summary)
            }
            PlotType::PathwayEnrichment => {
                let top = spec.param_usize("top_n").unwrap_or(PATHWAY_TOP);
                let data = transform::pathway_enrichment(result, top)?;
                let summary = format!(
                    "top {} enriched pathways by {}",
                    data.rows.len(),
                    data.score_label
                );
                let title = spec.param("title").unwrap_or("Pathway Enrichment");
                (figure::pathway_figure(&data, title), summary)
            }
        };

        let path = self.write_html(spec.plot_type, &figure)?;
        info!(plot_type = %spec.plot_type, path = %path.display(), "plot rendered");

        Ok(PlotArtifact {
            path,
            plot_type: spec.plot_type,
            summary,
        })
    }

    fn write_html(&self, plot_type: PlotType, figure: &Figure) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let short_id = Uuid::new_v4().simple().to_string();
        let filename = format!(
            "{}_{}_{}.html",
            plot_type,
            Utc::now().format("%Y%m%d_%H%M%S"),
            &short_id[..8],
        );
        let path = self.output_dir.join(filename);

        // "</" must not appear verbatim inside the inline <script> block.
        let figure_json = figure.to_json().to_string().replace("</", "<\\/");
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>rnaseql plot</title>
<script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
</head>
<body>
<div id="chart"></div>
<script>
const figure = {figure_json};
Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
</script>
</body>
</html>
"#
        );

        std::fs::write(&path, html)?;
        Ok(path)
    }
}
