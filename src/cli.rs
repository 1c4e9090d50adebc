use crate::{
    commands::sv::{DEFAULT_MAX_SEGMENTS, DEFAULT_SV_BORDER},
    plot::{GroupOptions, LayoutParams, PlotOptions, ScanOptions, DEFAULT_MAX_READS},
    preflight_fields,
    utils::{InputSource, Locus, Result},
};
use clap::{ArgAction, ArgGroup, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter};
use owo_colors::{
    colors::{Blue, Green, Magenta, Red, Yellow},
    OwoColorize, Stream, Style,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub const FULL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "lrsplot",
          version = FULL_VERSION,
          about = "Segments, clusters and layouts of split long-read alignments",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Enable or disable color output in logging
    #[arg(long, value_enum, default_value_t = Color::Auto, global = true, help_heading = "Advanced")]
    color: Color,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Extract the segments of split reads at loci")]
    Scan(ScanArgs),
    #[clap(about = "Cluster segments and lay out per-chromosome plots")]
    Plot(PlotArgs),
    #[clap(about = "Extract the segments of split reads at every variant of an SV VCF")]
    Sv(SvArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Scan(_) => "scan",
            Command::Plot(_) => "plot",
            Command::Sv(_) => "sv",
        }
    }
}

/// Options controlling how records are turned into segments.
#[derive(clap::Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Max number of records examined per locus (0 for no limit)
    #[arg(
        long = "max-reads",
        value_name = "MAX_READS",
        default_value_t = DEFAULT_MAX_READS,
        help_heading = "Extraction"
    )]
    pub max_reads: usize,

    /// Split alignments at insertions or deletions of at least this length
    #[arg(
        long = "split-indels",
        value_name = "LENGTH",
        value_parser = positive_length,
        help_heading = "Extraction"
    )]
    pub split_indels: Option<u32>,

    /// Only scan this many bases around each end of a locus
    #[arg(long = "border", value_name = "BORDER", help_heading = "Extraction")]
    pub border: Option<u64>,

    /// Fetch the record behind every SA entry instead of trusting the SA CIGAR
    #[arg(long = "deep", help_heading = "Extraction")]
    pub deep: bool,

    /// Number of BAM decompression threads
    #[arg(
        short = 't',
        long = "threads",
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,
}

impl ExtractArgs {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_reads: self.max_reads,
            split_indels: self.split_indels,
            border: self.border,
            deep: self.deep,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct ScanArgs {
    /// Indexed BAM/CRAM file with aligned long reads
    #[arg(short = 'r', long = "reads", value_name = "READS", required = true)]
    pub reads_src: InputSource,

    /// Loci to scan (e.g., chr1:1,000,000-1,000,500)
    #[arg(value_name = "LOCUS", required = true, value_parser = parse_locus)]
    pub loci: Vec<Locus>,

    #[command(flatten)]
    pub extract: ExtractArgs,

    /// Output JSON path (default: standard output)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "JSON",
        value_parser = check_prefix_path
    )]
    pub output_path: Option<PathBuf>,
}

impl ScanArgs {
    pub fn preflight(&self) -> Result<()> {
        preflight_fields!(self, reads_src)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct SvArgs {
    /// Indexed BAM/CRAM file with aligned long reads
    #[arg(short = 'r', long = "reads", value_name = "READS", required = true)]
    pub reads_src: InputSource,

    /// VCF with structural variant calls (SVTYPE required in INFO)
    #[arg(short = 'f', long = "vcf", value_name = "SV_VCF", required = true)]
    pub vcf_src: InputSource,

    #[command(flatten)]
    pub extract: ExtractArgs,

    /// Drop variants with more segments than this
    #[arg(
        long = "max-segments",
        value_name = "SEGMENTS",
        default_value_t = DEFAULT_MAX_SEGMENTS,
        help_heading = "Extraction"
    )]
    pub max_segments: usize,

    /// Output JSON path (default: standard output)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "JSON",
        value_parser = check_prefix_path
    )]
    pub output_path: Option<PathBuf>,
}

impl SvArgs {
    pub fn preflight(&self) -> Result<()> {
        preflight_fields!(self, reads_src, vcf_src)
    }

    /// Scan options with the breakpoint border defaulting to
    /// [`DEFAULT_SV_BORDER`] bases.
    pub fn scan_options(&self) -> ScanOptions {
        let mut opts = self.extract.scan_options();
        opts.border.get_or_insert(DEFAULT_SV_BORDER);
        opts
    }
}

#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("input").required(true).args(["reads_src", "segments_path"])))]
#[command(arg_required_else_help(true))]
pub struct PlotArgs {
    /// Indexed BAM/CRAM file with aligned long reads
    #[arg(
        short = 'r',
        long = "reads",
        value_name = "READS",
        requires = "loci",
        conflicts_with = "segments_path"
    )]
    pub reads_src: Option<InputSource>,

    /// Segment file written by the scan command
    #[arg(
        short = 's',
        long = "segments",
        value_name = "JSON",
        value_parser = check_file_exists
    )]
    pub segments_path: Option<PathBuf>,

    /// Loci to scan when reading from a BAM file
    #[arg(value_name = "LOCUS", value_parser = parse_locus)]
    pub loci: Vec<Locus>,

    #[command(flatten)]
    pub extract: ExtractArgs,

    /// Output JSON path (default: standard output)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "JSON",
        value_parser = check_prefix_path
    )]
    pub output_path: Option<PathBuf>,

    /// Keep reads that align as a single segment
    #[arg(long = "include-singletons", help_heading = "Reads")]
    pub include_singletons: bool,

    /// Do not flip reads whose first segment is not their leftmost one
    #[arg(long = "no-flipping", help_heading = "Reads")]
    pub no_flipping: bool,

    /// Derive read colors from read names instead of read order
    #[arg(long = "randomize-colors", help_heading = "Reads")]
    pub randomize_colors: bool,

    /// Canvas width
    #[arg(long = "width", value_name = "WIDTH", default_value_t = 800.0, help_heading = "Layout")]
    pub width: f64,

    /// Canvas height
    #[arg(long = "height", value_name = "HEIGHT", default_value_t = 600.0, help_heading = "Layout")]
    pub height: f64,

    /// Margins as TOP,RIGHT,BOTTOM,LEFT
    #[arg(
        long = "margins",
        value_name = "MARGINS",
        default_value = "50,50,80,80",
        value_parser = margins_from_string,
        help_heading = "Layout"
    )]
    pub margins: [f64; 4],

    /// Space between consecutive windows
    #[arg(long = "gap", value_name = "GAP", default_value_t = 30.0, help_heading = "Layout")]
    pub gap: f64,

    /// Number of axis ticks shared out over the windows
    #[arg(long = "num-ticks", value_name = "TICKS", default_value_t = 10, help_heading = "Layout")]
    pub num_ticks: u32,
}

impl PlotArgs {
    pub fn preflight(&self) -> Result<()> {
        preflight_fields!(self, reads_src)
    }

    pub fn plot_options(&self) -> PlotOptions {
        let [margin_top, margin_right, margin_bottom, margin_left] = self.margins;
        PlotOptions {
            group: GroupOptions {
                include_singletons: self.include_singletons,
                enable_flipping: !self.no_flipping,
                randomize_colors: self.randomize_colors,
            },
            layout: LayoutParams {
                width: self.width,
                height: self.height,
                margin_top,
                margin_right,
                margin_bottom,
                margin_left,
                gap: self.gap,
                num_ticks: self.num_ticks,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Color {
    Always,
    Auto,
    Never,
}

impl Color {
    fn apply(self) {
        match self {
            Color::Always => owo_colors::set_override(true),
            Color::Auto => {}
            Color::Never => owo_colors::set_override(false),
        }
    }
}

pub fn init_verbose(args: &Cli) {
    args.color.apply();

    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(format_log)
        .filter_level(filter_level)
        .init();
}

#[inline(always)]
fn level_style(level: Level) -> (&'static str, Style) {
    match level {
        Level::Error => ("ERROR", Style::new().fg::<Red>().bold()),
        Level::Warn => ("WARN", Style::new().fg::<Yellow>()),
        Level::Info => ("INFO", Style::new().fg::<Green>()),
        Level::Debug => ("DEBUG", Style::new().fg::<Blue>()),
        Level::Trace => ("TRACE", Style::new().fg::<Magenta>()),
    }
}

fn format_log(buf: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    let (label, style) = level_style(record.level());
    let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let painted_label = label.if_supports_color(Stream::Stderr, |t| style.style(t));
    writeln!(buf, "{ts} [{}] - {}", painted_label, record.args())
}

fn parse_locus(s: &str) -> Result<Locus> {
    Locus::from_string(s)
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(PathBuf::from(s))
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn positive_length(s: &str) -> Result<u32> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid length", s))?;
    if value == 0 {
        return Err("Length must be at least 1".into());
    }
    Ok(value)
}

fn margins_from_string(s: &str) -> Result<[f64; 4]> {
    const NUM_EXPECTED_VALUES: usize = 4;
    let values: Vec<f64> = s
        .split(',')
        .map(|x| x.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("Could not parse margins '{}': {}", s, e))?;
    if values.len() != NUM_EXPECTED_VALUES {
        return Err(format!(
            "Expected {} comma-separated values in margins. Got {} -> {}",
            NUM_EXPECTED_VALUES,
            values.len(),
            s
        ));
    }
    if values.iter().any(|v| *v < 0.0) {
        return Err(format!("Margins must be non-negative: {}", s));
    }
    Ok([values[0], values[1], values[2], values[3]])
}
