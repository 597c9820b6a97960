use super::transform::{
    BarData, CorrelationMatrix, MaData, NumericSeries, PathwayData, ScatterData, Significance,
    VolcanoData, LOG2FC_THRESHOLD, PADJ_THRESHOLD,
};
use serde_json::{json, Value as Json};

// Fixed visual convention, shared by every plot in a session: warm for
// upregulated, cool for downregulated, neutral gray otherwise. Threshold
// guide lines sit at the same cutoffs the classifier uses.
pub const COLOR_UP: &str = "#d62728";
pub const COLOR_DOWN: &str = "#1f77b4";
pub const COLOR_NEUTRAL: &str = "#7f7f7f";

const GUIDE_LINE: &str = "#444444";

#[derive(Debug, Clone)]
pub struct Figure {
    pub data: Vec<Json>,
    pub layout: Json,
}

impl Figure {
    pub fn to_json(&self) -> Json {
        json!({ "data": self.data, "layout": self.layout })
    }
}

fn base_layout(title: &str, x_title: &str, y_title: &str) -> Json {
    json!({
        "title": { "text": title },
        "template": "plotly_white",
        "xaxis": { "title": { "text": x_title } },
        "yaxis": { "title": { "text": y_title } },
    })
}

fn vline(x: f64) -> Json {
    json!({
        "type": "line",
        "x0": x, "x1": x,
        "yref": "paper", "y0": 0, "y1": 1,
        "line": { "color": GUIDE_LINE, "width": 1, "dash": "dash" },
    })
}

fn hline(y: f64) -> Json {
    json!({
        "type": "line",
        "y0": y, "y1": y,
        "xref": "paper", "x0": 0, "x1": 1,
        "line": { "color": GUIDE_LINE, "width": 1, "dash": "dash" },
    })
}

fn class_color(class: Significance) -> &'static str {
    match class {
        Significance::Upregulated => COLOR_UP,
        Significance::Downregulated => COLOR_DOWN,
        Significance::NotSignificant => COLOR_NEUTRAL,
    }
}

pub fn volcano_figure(data: &VolcanoData, title: &str) -> Figure {
    let classes = [
        Significance::Upregulated,
        Significance::Downregulated,
        Significance::NotSignificant,
    ];

    let traces: Vec<Json> = classes
        .into_iter()
        .map(|class| {
            let points: Vec<_> = data
                .points
                .iter()
                .filter(|p| p.significance == class)
                .collect();
            json!({
                "type": "scatter",
                "mode": "markers",
                "name": class.to_string(),
                "x": points.iter().map(|p| p.log2fc).collect::<Vec<_>>(),
                "y": points.iter().map(|p| p.neg_log10_padj).collect::<Vec<_>>(),
                "text": points.iter().map(|p| p.gene.as_str()).collect::<Vec<_>>(),
                "hovertemplate": "%{text}<br>log2FC=%{x:.2f}<br>-log10(padj)=%{y:.2f}<extra></extra>",
                "marker": { "color": class_color(class), "size": 6, "opacity": 0.75 },
            })
        })
        .collect();

    let annotations: Vec<Json> = data
        .annotated
        .iter()
        .map(|&i| {
            let p = &data.points[i];
            json!({
                "x": p.log2fc,
                "y": p.neg_log10_padj,
                "text": p.gene,
                "showarrow": false,
                "yshift": 9,
                "font": { "size": 10 },
            })
        })
        .collect();

    let mut layout = base_layout(title, "log2 Fold Change", "-log10(adjusted p-value)");
    layout["shapes"] = json!([
        vline(LOG2FC_THRESHOLD),
        vline(-LOG2FC_THRESHOLD),
        hline(-PADJ_THRESHOLD.log10()),
    ]);
    layout["annotations"] = Json::Array(annotations);

    Figure {
        data: traces,
        layout,
    }
}

pub fn heatmap_figure(matrix: &CorrelationMatrix, title: &str) -> Figure {
    let trace = json!({
        "type": "heatmap",
        "z": matrix.values,
        "x": matrix.sample_labels,
        "y": matrix.row_labels,
        "zmin": -1.0,
        "zmax": 1.0,
        "colorscale": "RdBu",
        "reversescale": true,
        "colorbar": { "title": { "text": "r" } },
    });

    Figure {
        data: vec![trace],
        layout: base_layout(title, "sample", "sample"),
    }
}

pub fn scatter_figure(data: &ScatterData, title: &str) -> Figure {
    let mut traces = vec![json!({
        "type": "scatter",
        "mode": "markers",
        "name": "values",
        "x": data.points.iter().map(|(x, _)| x).collect::<Vec<_>>(),
        "y": data.points.iter().map(|(_, y)| y).collect::<Vec<_>>(),
        "marker": { "color": COLOR_DOWN, "size": 6, "opacity": 0.75 },
    })];

    if let Some(trend) = &data.trend {
        let (x_min, x_max) = data
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| {
                (lo.min(*x), hi.max(*x))
            });
        traces.push(json!({
            "type": "scatter",
            "mode": "lines",
            "name": format!("trend (r={:.2})", trend.r),
            "x": [x_min, x_max],
            "y": [
                trend.intercept + trend.slope * x_min,
                trend.intercept + trend.slope * x_max,
            ],
            "line": { "color": COLOR_NEUTRAL, "dash": "dot" },
        }));
    }

    Figure {
        data: traces,
        layout: base_layout(title, &data.x_label, &data.y_label),
    }
}

pub fn ma_figure(data: &MaData, title: &str) -> Figure {
    let trace = json!({
        "type": "scatter",
        "mode": "markers",
        "name": "genes",
        "x": data.points.iter().map(|(x, _)| x).collect::<Vec<_>>(),
        "y": data.points.iter().map(|(_, y)| y).collect::<Vec<_>>(),
        "marker": { "color": COLOR_DOWN, "size": 5, "opacity": 0.6 },
    });

    let mut layout = base_layout(
        title,
        &format!("log10({} + 1)", data.mean_label),
        &data.fc_label,
    );
    layout["shapes"] = json!([hline(0.0)]);

    Figure {
        data: vec![trace],
        layout,
    }
}

pub fn histogram_figure(series: &NumericSeries, bins: usize, title: &str) -> Figure {
    let trace = json!({
        "type": "histogram",
        "x": series.values,
        "nbinsx": bins,
        "marker": { "color": COLOR_DOWN },
    });

    Figure {
        data: vec![trace],
        layout: base_layout(title, &series.label, "count"),
    }
}

pub fn box_figure(series: &NumericSeries, title: &str) -> Figure {
    let trace = json!({
        "type": "box",
        "y": series.values,
        "name": series.label,
        "marker": { "color": COLOR_DOWN },
    });

    Figure {
        data: vec![trace],
        layout: base_layout(title, "", &series.label),
    }
}

pub fn bar_figure(data: &BarData, title: &str) -> Figure {
    let trace = json!({
        "type": "bar",
        "x": data.categories,
        "y": data.values,
        "marker": { "color": COLOR_DOWN },
    });

    let y_title = data.y_label.as_deref().unwrap_or("count");
    Figure {
        data: vec![trace],
        layout: base_layout(title, &data.x_label, y_title),
    }
}

/// Horizontal ranked bar; rows arrive best-first and are reversed so the
/// top-ranked pathway renders at the top of the axis.
pub fn pathway_figure(data: &PathwayData, title: &str) -> Figure {
    let rows: Vec<_> = data.rows.iter().rev().collect();
    let trace = json!({
        "type": "bar",
        "orientation": "h",
        "x": rows.iter().map(|r| r.score).collect::<Vec<_>>(),
        "y": rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
        "marker": {
            "color": rows
                .iter()
                .map(|r| r.padj.unwrap_or(f64::NAN))
                .collect::<Vec<_>>(),
            "colorscale": "Viridis",
            "reversescale": true,
            "colorbar": { "title": { "text": "padj" } },
        },
    });

    let mut layout = base_layout(title, &data.score_label, "");
    layout["height"] = json!(std::cmp::max(400, 25 * data.rows.len() + 120));
    layout["margin"] = json!({ "l": 240 });

    Figure {
        data: vec![trace],
        layout,
    }
}
