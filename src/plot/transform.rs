use crate::db::QueryResult;
use crate::error::{Result, RnaseqlError};
use std::fmt;

pub const PADJ_THRESHOLD: f64 = 0.05;
pub const LOG2FC_THRESHOLD: f64 = 1.0;
pub const VOLCANO_ANNOTATE_TOP: usize = 10;
pub const PATHWAY_TOP: usize = 15;
/// Minimum |Pearson r| before a scatter gets a trend line.
pub const SCATTER_TREND_MIN_CORR: f64 = 0.7;

const GENE_COLUMNS: &[&str] = &["gene_name", "gene", "symbol", "gene_id"];
const LOG2FC_COLUMNS: &[&str] = &["log2foldchange", "log2fc", "logfc"];
const PADJ_COLUMNS: &[&str] = &["padj", "p.adjust", "p_adj", "qvalue", "q_value"];
const MEAN_COLUMNS: &[&str] = &["basemean", "base_mean", "mean_expression", "avg_expr"];
const PATHWAY_LABEL_COLUMNS: &[&str] = &["description", "pathway", "term", "id"];
const ENRICHMENT_COLUMNS: &[&str] = &[
    "richfactor",
    "foldenrichment",
    "fold_enrichment",
    "enrichmentscore",
    "enrichment_score",
    "zscore",
    "nes",
];

/// Significance class for one differential-expression row. A pure function
/// of the effect size and adjusted p-value; every row lands in exactly one
/// class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Upregulated,
    Downregulated,
    NotSignificant,
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::Upregulated => write!(f, "Upregulated"),
            Significance::Downregulated => write!(f, "Downregulated"),
            Significance::NotSignificant => write!(f, "Not significant"),
        }
    }
}

pub fn classify(log2fc: f64, padj: f64) -> Significance {
    if padj < PADJ_THRESHOLD && log2fc > LOG2FC_THRESHOLD {
        Significance::Upregulated
    } else if padj < PADJ_THRESHOLD && log2fc < -LOG2FC_THRESHOLD {
        Significance::Downregulated
    } else {
        Significance::NotSignificant
    }
}

/// Case-insensitive column lookup against a candidate list, first candidate
/// wins. Natural-language-driven SQL rarely controls column casing.
pub fn find_column(result: &QueryResult, candidates: &[&str]) -> Option<usize> {
    for candidate in candidates {
        if let Some(idx) = result
            .columns
            .iter()
            .position(|c| c.to_lowercase() == *candidate)
        {
            return Some(idx);
        }
    }
    None
}

/// Exact column requested by the caller, matched case-insensitively.
fn resolve_named_column(result: &QueryResult, name: &str) -> Result<usize> {
    result
        .column_index(name)
        .or_else(|| {
            let lower = name.to_lowercase();
            result.columns.iter().position(|c| c.to_lowercase() == lower)
        })
        .ok_or_else(|| RnaseqlError::ColumnNotFound(name.to_string()))
}

fn numeric_column_indices(result: &QueryResult) -> Vec<usize> {
    (0..result.columns.len())
        .filter(|&i| {
            result
                .rows
                .iter()
                .any(|row| row[i].as_f64().map(f64::is_finite).unwrap_or(false))
        })
        .collect()
}

fn categorical_column_index(result: &QueryResult) -> Option<usize> {
    (0..result.columns.len()).find(|&i| {
        result
            .rows
            .iter()
            .any(|row| row[i].as_str().is_some() && row[i].as_f64().is_none())
    })
}

// ---------------------------------------------------------------------------
// Volcano
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VolcanoPoint {
    pub gene: String,
    pub log2fc: f64,
    pub padj: f64,
    pub neg_log10_padj: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone)]
pub struct VolcanoData {
    pub points: Vec<VolcanoPoint>,
    /// Indices into `points` of the annotated genes: the lowest-padj
    /// significant rows.
    pub annotated: Vec<usize>,
}

impl VolcanoData {
    pub fn count(&self, class: Significance) -> usize {
        self.points
            .iter()
            .filter(|p| p.significance == class)
            .count()
    }
}

pub fn volcano(result: &QueryResult, annotate_top: usize) -> Result<VolcanoData> {
    let gene_col = find_column(result, GENE_COLUMNS);
    let fc_col = find_column(result, LOG2FC_COLUMNS);
    let padj_col = find_column(result, PADJ_COLUMNS);

    let (Some(gene_col), Some(fc_col), Some(padj_col)) = (gene_col, fc_col, padj_col) else {
        return Err(RnaseqlError::SchemaMismatch(format!(
            "volcano needs gene_name, log2FoldChange and padj; result has [{}]",
            result.columns.join(", ")
        )));
    };

    // Rows with a null effect size or p-value carry no position on either
    // axis and are dropped up front.
    let mut raw: Vec<(String, f64, f64)> = Vec::new();
    for row in &result.rows {
        let (Some(fc), Some(padj)) = (row[fc_col].as_f64(), row[padj_col].as_f64()) else {
            continue;
        };
        if !fc.is_finite() || !padj.is_finite() {
            continue;
        }
        raw.push((row[gene_col].to_string(), fc, padj));
    }

    if raw.is_empty() {
        return Err(RnaseqlError::EmptyAfterFiltering(
            "every row had a null log2FoldChange or padj".to_string(),
        ));
    }

    // padj of exactly zero has no log; substitute the smallest positive
    // padj in this result so -log10 stays finite.
    let min_positive = raw
        .iter()
        .map(|(_, _, p)| *p)
        .filter(|p| *p > 0.0)
        .fold(f64::INFINITY, f64::min);
    let floor = if min_positive.is_finite() {
        min_positive
    } else {
        f64::MIN_POSITIVE
    };

    let points: Vec<VolcanoPoint> = raw
        .into_iter()
        .map(|(gene, log2fc, padj)| {
            let padj = if padj <= 0.0 { floor } else { padj };
            VolcanoPoint {
                gene,
                log2fc,
                padj,
                neg_log10_padj: -padj.log10(),
                significance: classify(log2fc, padj),
            }
        })
        .collect();

    let mut significant: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.significance != Significance::NotSignificant)
        .map(|(i, _)| i)
        .collect();
    significant.sort_by(|&a, &b| {
        points[a]
            .padj
            .partial_cmp(&points[b].padj)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    significant.truncate(annotate_top);

    Ok(VolcanoData {
        points,
        annotated: significant,
    })
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub row_labels: Vec<String>,
    pub sample_labels: Vec<String>,
    /// Row-major, `row_labels.len()` x `sample_labels.len()`; square by
    /// construction or this value does not exist.
    pub values: Vec<Vec<f64>>,
}

/// Pivot of a correlation result: first column is the row label
/// (`pearson_cor` by convention), remaining columns are sample identifiers.
/// A non-square input means the row ceiling clipped the matrix, and the
/// caller must re-query unbounded; plotting a partial matrix would be
/// silently wrong.
pub fn correlation_matrix(result: &QueryResult) -> Result<CorrelationMatrix> {
    if result.columns.len() < 2 {
        return Err(RnaseqlError::SchemaMismatch(
            "heatmap needs a label column followed by one column per sample".to_string(),
        ));
    }

    let sample_labels: Vec<String> = result.columns[1..].to_vec();
    if result.rows.len() != sample_labels.len() {
        return Err(RnaseqlError::IncompleteMatrix {
            rows: result.rows.len(),
            cols: sample_labels.len(),
        });
    }

    let mut row_labels = Vec::with_capacity(result.rows.len());
    let mut values = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        row_labels.push(row[0].to_string());
        values.push(
            row[1..]
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect::<Vec<f64>>(),
        );
    }

    Ok(CorrelationMatrix {
        row_labels,
        sample_labels,
        values,
    })
}

// ---------------------------------------------------------------------------
// Scatter / MA
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

#[derive(Debug, Clone)]
pub struct ScatterData {
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
    pub trend: Option<TrendLine>,
}

pub fn scatter(
    result: &QueryResult,
    x_param: Option<&str>,
    y_param: Option<&str>,
) -> Result<ScatterData> {
    let numeric = numeric_column_indices(result);

    let x_col = match x_param {
        Some(name) => resolve_named_column(result, name)?,
        None => *numeric.first().ok_or_else(|| {
            RnaseqlError::SchemaMismatch("no numeric column available for scatter".to_string())
        })?,
    };
    let y_col = match y_param {
        Some(name) => resolve_named_column(result, name)?,
        None => numeric
            .iter()
            .copied()
            .find(|&i| i != x_col)
            .unwrap_or(x_col),
    };

    let points: Vec<(f64, f64)> = result
        .rows
        .iter()
        .filter_map(|row| {
            let x = row[x_col].as_f64()?;
            let y = row[y_col].as_f64()?;
            (x.is_finite() && y.is_finite()).then_some((x, y))
        })
        .collect();

    if points.is_empty() {
        return Err(RnaseqlError::EmptyAfterFiltering(
            "no row had numeric values in both scatter columns".to_string(),
        ));
    }

    let trend = pearson(&points)
        .filter(|r| r.abs() >= SCATTER_TREND_MIN_CORR)
        .and_then(|r| least_squares(&points).map(|(slope, intercept)| TrendLine { slope, intercept, r }));

    Ok(ScatterData {
        x_label: result.columns[x_col].clone(),
        y_label: result.columns[y_col].clone(),
        points,
        trend,
    })
}

#[derive(Debug, Clone)]
pub struct MaData {
    pub mean_label: String,
    pub fc_label: String,
    /// (log10(mean + 1), log2 fold change)
    pub points: Vec<(f64, f64)>,
}

pub fn ma(result: &QueryResult) -> Result<MaData> {
    let (Some(mean_col), Some(fc_col)) = (
        find_column(result, MEAN_COLUMNS),
        find_column(result, LOG2FC_COLUMNS),
    ) else {
        return Err(RnaseqlError::SchemaMismatch(format!(
            "ma needs a mean expression column and log2FoldChange; result has [{}]",
            result.columns.join(", ")
        )));
    };

    let points: Vec<(f64, f64)> = result
        .rows
        .iter()
        .filter_map(|row| {
            let mean = row[mean_col].as_f64()?;
            let fc = row[fc_col].as_f64()?;
            let log_mean = (mean + 1.0).log10();
            (log_mean.is_finite() && fc.is_finite()).then_some((log_mean, fc))
        })
        .collect();

    if points.is_empty() {
        return Err(RnaseqlError::EmptyAfterFiltering(
            "no row had numeric mean expression and fold change".to_string(),
        ));
    }

    Ok(MaData {
        mean_label: result.columns[mean_col].clone(),
        fc_label: result.columns[fc_col].clone(),
        points,
    })
}

pub fn pearson(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in points {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in points {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x).powi(2);
    }
    if den == 0.0 {
        return None;
    }
    let slope = num / den;
    Some((slope, mean_y - slope * mean_x))
}

// ---------------------------------------------------------------------------
// Histogram / Boxplot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NumericSeries {
    pub label: String,
    pub values: Vec<f64>,
}

pub fn numeric_series(
    result: &QueryResult,
    column_param: Option<&str>,
    context: &str,
) -> Result<NumericSeries> {
    let col = match column_param {
        Some(name) => resolve_named_column(result, name)?,
        None => *numeric_column_indices(result).first().ok_or_else(|| {
            RnaseqlError::SchemaMismatch(format!("no numeric column available for {context}"))
        })?,
    };

    let values: Vec<f64> = result
        .rows
        .iter()
        .filter_map(|row| row[col].as_f64())
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Err(RnaseqlError::EmptyAfterFiltering(format!(
            "column '{}' has no numeric values",
            result.columns[col]
        )));
    }

    Ok(NumericSeries {
        label: result.columns[col].clone(),
        values,
    })
}

// ---------------------------------------------------------------------------
// Bar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BarData {
    pub x_label: String,
    /// None means the bars are category counts.
    pub y_label: Option<String>,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

pub fn bar(
    result: &QueryResult,
    x_param: Option<&str>,
    y_param: Option<&str>,
) -> Result<BarData> {
    if result.rows.is_empty() {
        return Err(RnaseqlError::EmptyAfterFiltering(
            "cached result has no rows to draw bars from".to_string(),
        ));
    }

    let x_col = match x_param {
        Some(name) => resolve_named_column(result, name)?,
        None => categorical_column_index(result).unwrap_or(0),
    };

    let y_col = match y_param {
        Some(name) => Some(resolve_named_column(result, name)?),
        None => numeric_column_indices(result)
            .into_iter()
            .find(|&i| i != x_col),
    };

    match y_col {
        Some(y_col) => {
            let mut categories = Vec::new();
            let mut values = Vec::new();
            for row in &result.rows {
                if let Some(v) = row[y_col].as_f64() {
                    categories.push(row[x_col].to_string());
                    values.push(v);
                }
            }
            Ok(BarData {
                x_label: result.columns[x_col].clone(),
                y_label: Some(result.columns[y_col].clone()),
                categories,
                values,
            })
        }
        None => {
            // Count plot: one bar per distinct category, most frequent first.
            let mut counts: Vec<(String, usize)> = Vec::new();
            for row in &result.rows {
                let key = row[x_col].to_string();
                match counts.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((key, 1)),
                }
            }
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            Ok(BarData {
                x_label: result.columns[x_col].clone(),
                y_label: None,
                categories: counts.iter().map(|(k, _)| k.clone()).collect(),
                values: counts.iter().map(|(_, n)| *n as f64).collect(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Pathway enrichment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PathwayRow {
    pub label: String,
    pub score: f64,
    pub padj: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PathwayData {
    pub score_label: String,
    pub rows: Vec<PathwayRow>,
}

/// Top-K pathways for the ranked horizontal bar: by adjusted p-value when
/// one is present, by descending score otherwise.
pub fn pathway_enrichment(result: &QueryResult, top: usize) -> Result<PathwayData> {
    let (Some(label_col), Some(score_col)) = (
        find_column(result, PATHWAY_LABEL_COLUMNS),
        find_column(result, ENRICHMENT_COLUMNS),
    ) else {
        return Err(RnaseqlError::SchemaMismatch(format!(
            "pathway_enrichment needs a pathway label and an enrichment score; result has [{}]",
            result.columns.join(", ")
        )));
    };
    let padj_col = find_column(result, PADJ_COLUMNS);

    let mut rows: Vec<PathwayRow> = result
        .rows
        .iter()
        .filter_map(|row| {
            let score = row[score_col].as_f64()?;
            score.is_finite().then(|| PathwayRow {
                label: row[label_col].to_string(),
                score,
                padj: padj_col.and_then(|c| row[c].as_f64()),
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(RnaseqlError::EmptyAfterFiltering(
            "no pathway row had a numeric enrichment score".to_string(),
        ));
    }

    if padj_col.is_some() {
        rows.sort_by(|a, b| {
            let pa = a.padj.unwrap_or(f64::INFINITY);
            let pb = b.padj.unwrap_or(f64::INFINITY);
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    }
    rows.truncate(top);

    Ok(PathwayData {
        score_label: result.columns[score_col].clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;

    fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            total_rows: rows.len(),
            rows,
            sql: "SELECT ...".to_string(),
            tables: vec![],
        }
    }

    fn de_result() -> QueryResult {
        result(
            &["gene_name", "log2FoldChange", "padj"],
            vec![
                vec![
                    Value::Text("ACTB".into()),
                    Value::Real(2.4),
                    Value::Real(1e-7),
                ],
                vec![
                    Value::Text("GAPDH".into()),
                    Value::Real(-1.8),
                    Value::Real(1e-4),
                ],
                vec![
                    Value::Text("TP53".into()),
                    Value::Real(0.4),
                    Value::Real(0.4),
                ],
                vec![Value::Text("MYC".into()), Value::Real(3.1), Value::Real(0.0)],
                vec![Value::Text("EGFR".into()), Value::Null, Value::Real(0.7)],
                vec![Value::Text("BRCA1".into()), Value::Real(1.5), Value::Null],
            ],
        )
    }

    #[test]
    fn test_classification_partitions_rows() {
        assert_eq!(classify(2.0, 0.01), Significance::Upregulated);
        assert_eq!(classify(-2.0, 0.01), Significance::Downregulated);
        assert_eq!(classify(0.5, 0.01), Significance::NotSignificant);
        assert_eq!(classify(2.0, 0.2), Significance::NotSignificant);
        // Thresholds are exclusive.
        assert_eq!(classify(1.0, 0.01), Significance::NotSignificant);
        assert_eq!(classify(2.0, 0.05), Significance::NotSignificant);
    }

    #[test]
    fn test_volcano_drops_null_rows_and_floors_zero_padj() {
        let data = volcano(&de_result(), VOLCANO_ANNOTATE_TOP).unwrap();

        // EGFR and BRCA1 had nulls and are gone.
        assert_eq!(data.points.len(), 4);
        assert!(!data.points.iter().any(|p| p.gene == "EGFR"));

        // MYC's padj of 0 was replaced by the smallest positive padj (1e-7),
        // so its transform is finite.
        let myc = data.points.iter().find(|p| p.gene == "MYC").unwrap();
        assert_eq!(myc.padj, 1e-7);
        assert!(myc.neg_log10_padj.is_finite());

        for p in &data.points {
            assert!(p.neg_log10_padj.is_finite());
        }
    }

    #[test]
    fn test_volcano_counts_and_annotations() {
        let data = volcano(&de_result(), 2).unwrap();
        assert_eq!(data.count(Significance::Upregulated), 2); // ACTB, MYC
        assert_eq!(data.count(Significance::Downregulated), 1); // GAPDH
        assert_eq!(data.count(Significance::NotSignificant), 1); // TP53

        // Two lowest-padj significant genes; ACTB and MYC tie at 1e-7 and
        // keep their row order.
        assert_eq!(data.annotated.len(), 2);
        let names: Vec<&str> = data
            .annotated
            .iter()
            .map(|&i| data.points[i].gene.as_str())
            .collect();
        assert_eq!(names, vec!["ACTB", "MYC"]);
    }

    #[test]
    fn test_volcano_missing_columns_is_schema_mismatch() {
        let r = result(
            &["pathway", "score"],
            vec![vec![Value::Text("x".into()), Value::Real(1.0)]],
        );
        let err = volcano(&r, 10).unwrap_err();
        assert!(matches!(err, RnaseqlError::SchemaMismatch(_)));
    }

    #[test]
    fn test_volcano_all_null_is_empty_after_filtering() {
        let r = result(
            &["gene_name", "log2FoldChange", "padj"],
            vec![
                vec![Value::Text("A".into()), Value::Null, Value::Real(0.1)],
                vec![Value::Text("B".into()), Value::Real(1.0), Value::Null],
            ],
        );
        let err = volcano(&r, 10).unwrap_err();
        assert!(matches!(err, RnaseqlError::EmptyAfterFiltering(_)));
    }

    fn corr_result(n_rows: usize) -> QueryResult {
        let columns = ["pearson_cor", "s1", "s2", "s3"];
        let rows = (0..n_rows)
            .map(|i| {
                vec![
                    Value::Text(format!("s{}", i + 1)),
                    Value::Real(if i == 0 { 1.0 } else { 0.8 }),
                    Value::Real(if i == 1 { 1.0 } else { 0.8 }),
                    Value::Real(if i == 2 { 1.0 } else { 0.8 }),
                ]
            })
            .collect();
        result(&columns, rows)
    }

    #[test]
    fn test_correlation_matrix_square_input_pivots() {
        let matrix = correlation_matrix(&corr_result(3)).unwrap();
        assert_eq!(matrix.row_labels, vec!["s1", "s2", "s3"]);
        assert_eq!(matrix.sample_labels, vec!["s1", "s2", "s3"]);
        assert_eq!(matrix.values.len(), 3);
        assert_eq!(matrix.values[0].len(), 3);
        assert_eq!(matrix.values[1][1], 1.0);
    }

    #[test]
    fn test_correlation_matrix_clipped_input_is_incomplete() {
        let err = correlation_matrix(&corr_result(2)).unwrap_err();
        match err {
            RnaseqlError::IncompleteMatrix { rows, cols } => {
                assert_eq!(rows, 2);
                assert_eq!(cols, 3);
            }
            other => panic!("expected IncompleteMatrix, got {other:?}"),
        }
    }

    #[test]
    fn test_scatter_auto_selects_numeric_columns() {
        let r = result(
            &["gene_name", "baseMean", "log2FoldChange"],
            vec![
                vec![Value::Text("A".into()), Value::Real(10.0), Value::Real(1.0)],
                vec![Value::Text("B".into()), Value::Real(20.0), Value::Real(2.0)],
                vec![Value::Text("C".into()), Value::Real(30.0), Value::Real(3.0)],
            ],
        );
        let data = scatter(&r, None, None).unwrap();
        assert_eq!(data.x_label, "baseMean");
        assert_eq!(data.y_label, "log2FoldChange");
        assert_eq!(data.points.len(), 3);
        // Perfectly linear: trend line present with r = 1.
        let trend = data.trend.unwrap();
        assert!((trend.r - 1.0).abs() < 1e-12);
        assert!((trend.slope - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_scatter_missing_requested_column() {
        let r = result(&["a"], vec![vec![Value::Real(1.0)]]);
        let err = scatter(&r, Some("missing"), None).unwrap_err();
        assert!(matches!(err, RnaseqlError::ColumnNotFound(c) if c == "missing"));
    }

    #[test]
    fn test_scatter_uncorrelated_has_no_trend() {
        let r = result(
            &["x", "y"],
            vec![
                vec![Value::Real(0.0), Value::Real(1.0)],
                vec![Value::Real(1.0), Value::Real(-1.0)],
                vec![Value::Real(2.0), Value::Real(1.0)],
                vec![Value::Real(3.0), Value::Real(-1.0)],
            ],
        );
        let data = scatter(&r, None, None).unwrap();
        assert!(data.trend.is_none());
    }

    #[test]
    fn test_ma_transforms_mean_to_log_scale() {
        let r = result(
            &["gene_name", "baseMean", "log2FoldChange"],
            vec![vec![
                Value::Text("A".into()),
                Value::Real(99.0),
                Value::Real(1.5),
            ]],
        );
        let data = ma(&r).unwrap();
        assert_eq!(data.points.len(), 1);
        assert!((data.points[0].0 - 2.0).abs() < 1e-12); // log10(100)
        assert_eq!(data.points[0].1, 1.5);
    }

    #[test]
    fn test_numeric_series_reads_numbers_stored_as_text() {
        let r = result(
            &["batch", "count"],
            vec![
                vec![Value::Text("b1".into()), Value::Text("10".into())],
                vec![Value::Text("b2".into()), Value::Text("20".into())],
            ],
        );
        let series = numeric_series(&r, None, "histogram").unwrap();
        assert_eq!(series.label, "count");
        assert_eq!(series.values, vec![10.0, 20.0]);
    }

    #[test]
    fn test_bar_count_plot_orders_by_frequency() {
        let r = result(
            &["batch"],
            vec![
                vec![Value::Text("b2".into())],
                vec![Value::Text("b1".into())],
                vec![Value::Text("b2".into())],
            ],
        );
        let data = bar(&r, None, None).unwrap();
        assert_eq!(data.y_label, None);
        assert_eq!(data.categories, vec!["b2", "b1"]);
        assert_eq!(data.values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_pathway_ranks_by_padj_and_truncates() {
        let rows = (0..20)
            .map(|i| {
                vec![
                    Value::Text(format!("pathway {i}")),
                    Value::Real(1.0 + i as f64),
                    Value::Real(0.001 * (20 - i) as f64),
                ]
            })
            .collect();
        let r = result(&["Description", "FoldEnrichment", "p.adjust"], rows);
        let data = pathway_enrichment(&r, PATHWAY_TOP).unwrap();
        assert_eq!(data.rows.len(), PATHWAY_TOP);
        // Lowest padj first: the last inserted row has the smallest padj.
        assert_eq!(data.rows[0].label, "pathway 19");
        assert_eq!(data.score_label, "FoldEnrichment");
    }

    #[test]
    fn test_pathway_without_padj_ranks_by_score() {
        let r = result(
            &["pathway", "zScore"],
            vec![
                vec![Value::Text("low".into()), Value::Real(1.0)],
                vec![Value::Text("high".into()), Value::Real(5.0)],
            ],
        );
        let data = pathway_enrichment(&r, 10).unwrap();
        assert_eq!(data.rows[0].label, "high");
    }

    #[test]
    fn test_pearson_degenerate_inputs() {
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        assert_eq!(pearson(&[(1.0, 1.0), (1.0, 2.0)]), None);
    }
}
