mod figure;
mod render;
mod spec;
mod transform;

pub use figure::{Figure, COLOR_DOWN, COLOR_NEUTRAL, COLOR_UP};
pub use render::{PlotArtifact, PlotSynthesizer};
pub use spec::{PlotSpec, PlotType};
pub use transform::{
    classify, correlation_matrix, find_column, pearson, volcano, CorrelationMatrix, Significance,
    VolcanoData, LOG2FC_THRESHOLD, PADJ_THRESHOLD, PATHWAY_TOP, SCATTER_TREND_MIN_CORR,
    VOLCANO_ANNOTATE_TOP,
};
