//! Per-chromosome plot model handed to the renderer.
use super::{
    cluster::{cluster_segments, Cluster},
    layout::{layout, LayoutParams, LayoutSlot},
    reads::{group_reads, GroupOptions, ReadInfoMap},
    segment::RawSegment,
};
use crate::utils::Result;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlotOptions {
    pub group: GroupOptions,
    pub layout: LayoutParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct Window {
    pub cluster: Cluster,
    pub slot: LayoutSlot,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedSegment {
    pub segment: RawSegment,
    /// Index into the plot's windows
    pub window: usize,
    pub y_start: i64,
    pub y_end: i64,
    pub is_read_start: bool,
    pub is_read_end: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChromPlot {
    pub chrom: String,
    pub segments: Vec<PlacedSegment>,
    pub reads: ReadInfoMap,
    pub windows: Vec<Window>,
    /// Smallest and largest read-space coordinate over all placed segments
    pub read_extent: (i64, i64),
    /// Canvas the windows were laid out on
    pub layout: LayoutParams,
}

/// Builds one plot per chromosome, in the order chromosomes first appear.
/// Chromosomes left without segments after filtering are skipped.
pub fn build_plots(segments: &[RawSegment], opts: &PlotOptions) -> Result<Vec<ChromPlot>> {
    let mut by_chrom: IndexMap<&str, Vec<RawSegment>> = IndexMap::new();
    for seg in segments {
        by_chrom.entry(seg.chrom.as_str()).or_default().push(seg.clone());
    }
    let by_chrom: Vec<(&str, Vec<RawSegment>)> = by_chrom.into_iter().collect();

    let plots = by_chrom
        .into_par_iter()
        .map(|(chrom, segs)| build_chrom_plot(chrom, segs, opts).map_err(|e| format!("{}: {}", chrom, e)))
        .collect::<Result<Vec<_>>>()?;
    Ok(plots.into_iter().flatten().collect())
}

fn build_chrom_plot(chrom: &str, segments: Vec<RawSegment>, opts: &PlotOptions) -> Result<Option<ChromPlot>> {
    let reads = group_reads(&segments, &opts.group);
    let segments: Vec<RawSegment> = segments
        .into_iter()
        .filter(|s| !s.is_degenerate() && reads.contains_key(&s.read_id))
        .collect();
    if segments.is_empty() {
        log::debug!("Skipping {}: no segments left after filtering", chrom);
        return Ok(None);
    }

    let clusters = cluster_segments(&segments);
    let spans: Vec<i64> = clusters.iter().map(|c| c.span()).collect();
    let slots = layout(&spans, &opts.layout)?;
    log::debug!("{}: {} segments in {} windows", chrom, segments.len(), clusters.len());

    let mut window_of = vec![0; segments.len()];
    for (w, cluster) in clusters.iter().enumerate() {
        for &i in &cluster.members {
            window_of[i] = w;
        }
    }

    let mut read_extent = (i64::MAX, i64::MIN);
    let placed: Vec<PlacedSegment> = segments
        .into_iter()
        .zip(window_of)
        .filter_map(|(segment, window)| {
            let info = reads.get(&segment.read_id)?;
            let (y_start, y_end) = info.query_endpoints(&segment);
            read_extent.0 = read_extent.0.min(y_start.min(y_end));
            read_extent.1 = read_extent.1.max(y_start.max(y_end));
            Some(PlacedSegment {
                is_read_start: info.is_read_start(&segment),
                is_read_end: info.is_read_end(&segment),
                segment,
                window,
                y_start,
                y_end,
            })
        })
        .collect();

    let windows = clusters
        .into_iter()
        .zip(slots)
        .map(|(cluster, slot)| Window { cluster, slot })
        .collect();

    Ok(Some(ChromPlot {
        chrom: chrom.to_string(),
        segments: placed,
        reads,
        windows,
        read_extent,
        layout: opts.layout,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{segment::Strand, test_utils::make_segment};

    fn on_chrom(chrom: &str, mut seg: RawSegment) -> RawSegment {
        seg.chrom = chrom.to_string();
        seg
    }

    fn example_segments() -> Vec<RawSegment> {
        vec![
            make_segment("a", 1000, 40, 0, 40),
            make_segment("a", 1100, 40, 40, 40),
            make_segment("b", 1050, 40, 0, 40),
            make_segment("b", 20_000, 40, 40, 40),
            make_segment("solo", 50_000, 40, 0, 40),
            on_chrom("chr2", make_segment("lonely", 300, 40, 0, 40)),
        ]
    }

    #[test]
    fn end_to_end_plot() {
        let plots = build_plots(&example_segments(), &PlotOptions::default()).unwrap();
        assert_eq!(plots.len(), 1);

        let plot = &plots[0];
        assert_eq!(plot.chrom, "chr1");
        assert_eq!(plot.reads.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(plot.segments.len(), 4);
        assert!(plot.segments.iter().all(|s| s.segment.read_id != "solo"));

        assert_eq!(plot.windows.len(), 2);
        assert_eq!(plot.windows[0].cluster.members, vec![0, 1, 2]);
        assert_eq!((plot.windows[0].cluster.min, plot.windows[0].cluster.max), (1000, 1140));
        assert_eq!(plot.windows[1].cluster.members, vec![3]);
        let windows: Vec<usize> = plot.segments.iter().map(|s| s.window).collect();
        assert_eq!(windows, vec![0, 0, 0, 1]);

        let ratio_sum: f64 = plot.windows.iter().map(|w| w.slot.ratio).sum();
        approx::assert_abs_diff_eq!(ratio_sum, 1.0, epsilon = 1e-9);
        assert_eq!(plot.read_extent, (0, 80));
        assert!(plot.segments[0].is_read_start);
        assert!(plot.segments[1].is_read_end);
    }

    #[test]
    fn singletons_kept_when_requested() {
        let mut opts = PlotOptions::default();
        opts.group.include_singletons = true;
        let plots = build_plots(&example_segments(), &opts).unwrap();
        let chroms: Vec<&str> = plots.iter().map(|p| p.chrom.as_str()).collect();
        assert_eq!(chroms, vec!["chr1", "chr2"]);
        assert_eq!(plots[0].segments.len(), 5);
        assert_eq!(plots[0].windows.len(), 3);
    }

    #[test]
    fn flipped_read_extent() {
        let mut first = make_segment("r", 5000, 50, 0, 50);
        first.strand = Strand::Reverse;
        let segments = vec![make_segment("r", 1000, 30, 60, 30), first];
        let plots = build_plots(&segments, &PlotOptions::default()).unwrap();
        let plot = &plots[0];
        assert!(plot.reads["r"].flip);
        // length 90: (60, 90) -> (30, 0), reverse (50, 0) -> (40, 90)
        assert_eq!((plot.segments[0].y_start, plot.segments[0].y_end), (30, 0));
        assert_eq!((plot.segments[1].y_start, plot.segments[1].y_end), (40, 90));
        assert_eq!(plot.read_extent, (0, 90));
    }

    #[test]
    fn chromosomes_keep_first_seen_order() {
        let segments = vec![
            on_chrom("chr2", make_segment("x", 10, 20, 0, 20)),
            make_segment("y", 10, 20, 0, 20),
            on_chrom("chr2", make_segment("x", 900, 20, 20, 20)),
            make_segment("y", 900, 20, 20, 20),
        ];
        let plots = build_plots(&segments, &PlotOptions::default()).unwrap();
        let chroms: Vec<&str> = plots.iter().map(|p| p.chrom.as_str()).collect();
        assert_eq!(chroms, vec!["chr2", "chr1"]);
    }

    #[test]
    fn infeasible_layout_is_an_error() {
        let mut opts = PlotOptions::default();
        opts.layout.width = 100.0;
        let err = build_plots(&example_segments(), &opts).unwrap_err();
        assert!(err.starts_with("chr1: Layout infeasible"));
    }

    #[test]
    fn nothing_to_plot() {
        assert!(build_plots(&[], &PlotOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn canvas_parameters_are_serialized() {
        let mut opts = PlotOptions::default();
        opts.layout.height = 5000.0;
        opts.layout.margin_top = 12.0;
        let plots = build_plots(&example_segments(), &opts).unwrap();
        let json = serde_json::to_value(&plots[0]).unwrap();
        assert_eq!(json["layout"]["height"], 5000.0);
        assert_eq!(json["layout"]["margin_top"], 12.0);
        assert_eq!(json["layout"]["margin_bottom"], 80.0);

        opts.layout.height = 10.0;
        let short = serde_json::to_value(&build_plots(&example_segments(), &opts).unwrap()[0]).unwrap();
        assert_ne!(json, short);
    }
}
