use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::dataset::Dataset;
use crate::models::{AggFunc, AggregationRow, AggregationTable, ChartData, ChartKind};

/// Keywords that signal a chart request
const CHART_KEYWORDS: &[&str] = &["plot", "chart", "graph", "histogram"];

/// Number of equal-width bins for histograms
const HISTOGRAM_BINS: usize = 10;

static OF_COLUMN_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"of\s+(\w+)").expect("of-column regex is valid")
});
static GROUP_BY_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"group by\s+(\w+)\s+and\s+(\w+)\s+(\w+)").expect("group-by regex is valid")
});

/// Best-effort chart intent detection over the lowercased question. The
/// grammar is deliberately rigid: a chart keyword plus an "of <column>"
/// phrase, where the column resolves against the current dataset. Anything
/// that does not match yields None.
pub fn detect_chart(question: &str, dataset: &Dataset) -> Option<ChartData> {
    let lowered = question.to_lowercase();
    if !CHART_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return None;
    }

    let captures = OF_COLUMN_RE.captures(&lowered)?;
    let idx = dataset.resolve_column(&captures[1])?;
    let column = dataset.column_names()[idx].clone();

    if lowered.contains("histogram") {
        histogram(dataset, idx, column)
    } else {
        Some(bar_counts(dataset, idx, column))
    }
}

/// Best-effort "group by <col> and <col> <func>" detection. Both columns
/// must resolve and the function must be supported; otherwise None.
pub fn detect_group_by(question: &str, dataset: &Dataset) -> Option<AggregationTable> {
    let lowered = question.to_lowercase();
    let captures = GROUP_BY_RE.captures(&lowered)?;

    let group_idx = dataset.resolve_column(&captures[1])?;
    let value_idx = dataset.resolve_column(&captures[2])?;
    let function = AggFunc::parse(&captures[3])?;

    Some(aggregate(dataset, group_idx, value_idx, function))
}

/// Distinct-value counts for a bar chart, ordered by value
fn bar_counts(dataset: &Dataset, idx: usize, column: String) -> ChartData {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for cell in dataset.column_values(idx) {
        *counts.entry(cell.to_string()).or_insert(0) += 1;
    }

    let (labels, values): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    ChartData {
        kind: ChartKind::Bar,
        column,
        labels,
        counts: values,
    }
}

/// Equal-width numeric bins; None when the column has no numeric values
fn histogram(dataset: &Dataset, idx: usize, column: String) -> Option<ChartData> {
    let values = dataset.numeric_values(idx);
    if values.is_empty() {
        return None;
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / HISTOGRAM_BINS as f64
    } else {
        1.0
    };

    let mut counts = vec![0usize; HISTOGRAM_BINS];
    for value in &values {
        let bin = (((value - min) / width) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }

    let labels = (0..HISTOGRAM_BINS)
        .map(|bin| {
            let lo = min + width * bin as f64;
            let hi = lo + width;
            format!("{lo:.2}..{hi:.2}")
        })
        .collect();

    Some(ChartData {
        kind: ChartKind::Histogram,
        column,
        labels,
        counts,
    })
}

fn aggregate(
    dataset: &Dataset,
    group_idx: usize,
    value_idx: usize,
    function: AggFunc,
) -> AggregationTable {
    // Group values in first-seen order, numeric cells only for the value side
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let cells: Vec<(&str, &str)> = dataset
        .column_values(group_idx)
        .zip(dataset.column_values(value_idx))
        .collect();
    for (group, value) in cells {
        if !groups.contains_key(group) {
            order.push(group.to_string());
        }
        let entry = groups.entry(group.to_string()).or_default();
        if let Ok(parsed) = value.trim().parse::<f64>() {
            entry.push(parsed);
        }
    }

    let rows = order
        .into_iter()
        .map(|group| {
            let values = &groups[&group];
            let value = if values.is_empty() {
                // Group had no numeric cells
                0.0
            } else {
                match function {
                    AggFunc::Sum => values.iter().sum(),
                    AggFunc::Mean => values.iter().sum::<f64>() / values.len() as f64,
                    AggFunc::Count => values.len() as f64,
                    AggFunc::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
                    AggFunc::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                }
            };
            AggregationRow { group, value }
        })
        .collect();

    AggregationTable {
        group_column: dataset.column_names()[group_idx].clone(),
        value_column: dataset.column_names()[value_idx].clone(),
        function,
        rows,
    }
}
