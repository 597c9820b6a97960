use crate::error::{Result, RnaseqlError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed set of supported plots. The string tag from the tool boundary is
/// resolved here, before any data is touched; dispatch on the variant is
/// exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotType {
    Volcano,
    Ma,
    Heatmap,
    Scatter,
    Histogram,
    Boxplot,
    Bar,
    PathwayEnrichment,
}

impl PlotType {
    pub const ALL: [PlotType; 8] = [
        PlotType::Volcano,
        PlotType::Ma,
        PlotType::Heatmap,
        PlotType::Scatter,
        PlotType::Histogram,
        PlotType::Boxplot,
        PlotType::Bar,
        PlotType::PathwayEnrichment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlotType::Volcano => "volcano",
            PlotType::Ma => "ma",
            PlotType::Heatmap => "heatmap",
            PlotType::Scatter => "scatter",
            PlotType::Histogram => "histogram",
            PlotType::Boxplot => "boxplot",
            PlotType::Bar => "bar",
            PlotType::PathwayEnrichment => "pathway_enrichment",
        }
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotType {
    type Err = RnaseqlError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_lowercase();
        PlotType::ALL
            .into_iter()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| RnaseqlError::UnknownPlotType(s.trim().to_string()))
    }
}

/// Parsed plot request: `type` or `type|key=value|key=value...`.
///
/// Parameter parsing is permissive (segments without `=` are dropped,
/// unknown keys are carried but ignored by renderers); the type tag is
/// strict.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub plot_type: PlotType,
    params: BTreeMap<String, String>,
}

impl PlotSpec {
    pub fn new(plot_type: PlotType) -> Self {
        Self {
            plot_type,
            params: BTreeMap::new(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut segments = input.split('|');
        let tag = segments.next().unwrap_or("");
        let plot_type: PlotType = tag.parse()?;

        let mut params = BTreeMap::new();
        for segment in segments {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() {
                params.insert(key.to_string(), value.to_string());
            }
        }

        Ok(Self { plot_type, params })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn param_usize(&self, key: &str) -> Option<usize> {
        self.param(key).and_then(|v| v.parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_type_parses_with_no_params() {
        let spec = PlotSpec::parse("volcano").unwrap();
        assert_eq!(spec.plot_type, PlotType::Volcano);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_params_parse() {
        let spec = PlotSpec::parse("scatter|x_column=baseMean|y_column=log2FoldChange").unwrap();
        assert_eq!(spec.plot_type, PlotType::Scatter);
        assert_eq!(spec.param("x_column"), Some("baseMean"));
        assert_eq!(spec.param("y_column"), Some("log2FoldChange"));
    }

    #[test]
    fn test_malformed_segment_is_ignored() {
        let spec = PlotSpec::parse("heatmap|cluster_by=pathway|oops").unwrap();
        assert_eq!(spec.plot_type, PlotType::Heatmap);
        assert_eq!(spec.param("cluster_by"), Some("pathway"));
        assert_eq!(spec.param("oops"), None);
    }

    #[test]
    fn test_unknown_type_fails_fast() {
        let err = PlotSpec::parse("piechart|column=padj").unwrap_err();
        assert!(matches!(err, RnaseqlError::UnknownPlotType(t) if t == "piechart"));
    }

    #[test]
    fn test_type_tag_is_case_insensitive() {
        let spec = PlotSpec::parse("Pathway_Enrichment").unwrap();
        assert_eq!(spec.plot_type, PlotType::PathwayEnrichment);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let spec = PlotSpec::parse(" histogram | bins = 40 ").unwrap();
        assert_eq!(spec.plot_type, PlotType::Histogram);
        assert_eq!(spec.param_usize("bins"), Some(40));
    }
}
