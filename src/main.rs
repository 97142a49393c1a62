//! tabstat command line

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabstat::analysis::AnalysisMethod;
use tabstat::hypothesis::{PostHoc, PostHocSelection, StatTest, TestFamily, TestSelection};
use tabstat::io::{self as tio, DelimitedOptions, ReportOptions};
use tabstat::pipeline::{
    config::DEFAULT_SETTINGS_FILE, AnalysisSession, SessionConfig, SettingsStore,
    TracingEventHandler,
};
use tabstat::preprocess::{
    Encoding, MissingValues, Normalization, OutlierMethod, PreprocessingConfig, Transform,
};
use tabstat::viz::{GraphCustomization, GraphSelection, GraphType};
use tabstat::Dataset;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exploratory statistics for tabular data
#[derive(Parser, Debug)]
#[command(name = "tabstat", version, about, long_about = None)]
struct Cli {
    /// Settings file holding the saved selections
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import, preprocess, test, graph and export in one pass
    Run(RunArgs),
    /// List the available tests, post-hoc procedures, graphs and analyses
    Tests,
    /// Inspect or reset the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum SettingsAction {
    Show,
    Clear,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Data file (.csv, .tsv, .txt, .json, .xlsx, .db/.sqlite); `-` reads pasted text from stdin
    #[arg(long, short, conflicts_with = "url")]
    input: Option<PathBuf>,

    /// HTTP endpoint returning JSON records
    #[arg(long)]
    url: Option<String>,

    /// Table to read from a SQLite file
    #[arg(long)]
    table: Option<String>,

    /// Sheet to read from a spreadsheet; the first sheet by default
    #[arg(long)]
    sheet: Option<String>,

    /// Field delimiter for delimited text
    #[arg(long)]
    delimiter: Option<char>,

    /// The delimited file has no header row
    #[arg(long)]
    no_header: bool,
}

#[derive(Args, Debug)]
struct PreprocessArgs {
    #[arg(long, default_value = "none")]
    outliers: OutlierMethod,

    /// Outlier threshold (default 3.0)
    #[arg(long)]
    threshold: Option<f64>,

    #[arg(long, default_value = "none")]
    normalize: Normalization,

    #[arg(long, default_value = "none")]
    missing: MissingValues,

    #[arg(long, default_value = "none")]
    encoding: Encoding,

    #[arg(long, default_value = "none")]
    transform: Transform,
}

impl PreprocessArgs {
    fn config(&self) -> PreprocessingConfig {
        let config = PreprocessingConfig::new()
            .with_outliers(self.outliers)
            .with_normalization(self.normalize)
            .with_missing(self.missing)
            .with_encoding(self.encoding)
            .with_transform(self.transform);
        match self.threshold {
            Some(t) => config.with_threshold(t),
            None => config,
        }
    }
}

#[derive(Args, Debug)]
struct GraphArgs {
    /// Graph type label or slug
    #[arg(long)]
    graph: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    x_label: Option<String>,

    #[arg(long)]
    y_label: Option<String>,

    #[arg(long)]
    x_max: Option<String>,

    #[arg(long)]
    x_tick: Option<String>,

    #[arg(long)]
    y_max: Option<String>,

    #[arg(long)]
    y_tick: Option<String>,

    #[arg(long)]
    font: Option<String>,
}

impl GraphArgs {
    /// Overlay the given flags on `base`
    fn customization(&self, base: &GraphCustomization) -> GraphCustomization {
        let mut custom = base.clone();
        let fields = [
            (&self.font, &mut custom.font),
            (&self.title, &mut custom.graph_name),
            (&self.x_label, &mut custom.x_axis_name),
            (&self.y_label, &mut custom.y_axis_name),
            (&self.x_max, &mut custom.x_max),
            (&self.x_tick, &mut custom.x_tick),
            (&self.y_max, &mut custom.y_max),
            (&self.y_tick, &mut custom.y_tick),
        ];
        for (flag, field) in fields {
            if let Some(value) = flag {
                field.clone_from(value);
            }
        }
        custom
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    preprocess: PreprocessArgs,

    /// Test label or slug
    #[arg(long)]
    test: Option<String>,

    /// Post-hoc procedure label or slug, run after the test
    #[arg(long)]
    post_hoc: Option<String>,

    #[command(flatten)]
    graph: GraphArgs,

    /// Advanced analysis label or slug
    #[arg(long)]
    analysis: Option<String>,

    /// Write the result table as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Write the result table as an XLSX workbook
    #[arg(long)]
    export_xlsx: Option<PathBuf>,

    /// Write the graph; .svg or .png
    #[arg(long)]
    export_image: Option<PathBuf>,

    /// Write an HTML report
    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long)]
    report_title: Option<String>,

    #[arg(long)]
    report_description: Option<String>,

    /// Restore saved selections before running
    #[arg(long)]
    load_settings: bool,

    /// Save the selections after running
    #[arg(long)]
    save_settings: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(&cli.settings, &args),
        Commands::Tests => {
            list_catalogue();
            Ok(())
        }
        Commands::Settings { action } => settings(&cli.settings, action),
    }
}

fn load_source(source: &SourceArgs) -> Result<Dataset> {
    if let Some(url) = &source.url {
        return Ok(tio::fetch_json(url)?);
    }
    let path = source
        .input
        .as_ref()
        .ok_or_else(|| anyhow!("either --input or --url is required"))?;

    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(tio::read_clipboard_text(&text)?);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let data = match extension.as_str() {
        "json" => tio::read_json(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => tio::read_xlsx(path, source.sheet.as_deref())?,
        "db" | "sqlite" | "sqlite3" => {
            let table = source
                .table
                .as_deref()
                .ok_or_else(|| anyhow!("--table is required for SQLite input"))?;
            tio::read_sqlite(path, table)?
        }
        _ => {
            let default = if extension == "tsv" { '\t' } else { ',' };
            let delimiter = source.delimiter.unwrap_or(default);
            let delimiter = u8::try_from(delimiter)
                .map_err(|_| anyhow!("delimiter must be a single-byte character"))?;
            let options = DelimitedOptions::default()
                .with_delimiter(delimiter)
                .with_header(!source.no_header);
            tio::read_delimited(path, options)?
        }
    };
    Ok(data)
}

fn run(settings_path: &Path, args: &RunArgs) -> Result<()> {
    let config = SessionConfig::new().with_settings_path(settings_path);
    let mut session = AnalysisSession::new(config)?;
    session.events().register(TracingEventHandler)?;

    if args.load_settings && !session.load_settings() {
        tracing::warn!("No saved settings in {}", settings_path.display());
    }
    if let Some(graph) = &args.graph.graph {
        session.select_graph(GraphSelection::from(graph.clone()));
    }
    let custom = args.graph.customization(session.state().customization());
    session.set_customization(custom);

    let data = load_source(&args.source)?;
    println!("{}", data.preview(5));
    // Settings may already hold a test, in which case loading runs it
    let mut result = session.load_data(data)?;

    let preprocessing = args.preprocess.config();
    if !preprocessing.is_noop() {
        result = session.preprocess(&preprocessing)?;
        if let Some(data) = session.state().data() {
            tracing::info!(rows = data.n_rows(), "Data preprocessed");
        }
    }

    if let Some(test) = &args.test {
        result = session.select_test(TestSelection::from(test.clone()))?;
    }
    if let Some(result) = &result {
        println!("{}", result.summary);
        println!(
            "{}",
            if result.significant {
                "有意差あり (p < 0.05)"
            } else {
                "有意差なし"
            }
        );
    }

    if let Some(post_hoc) = &args.post_hoc {
        let summary = session.run_post_hoc(&PostHocSelection::from(post_hoc.clone()))?;
        println!("{summary}");
    }

    if let Some(name) = &args.analysis {
        let method = AnalysisMethod::from_identifier(name)
            .ok_or_else(|| anyhow!(tabstat::analysis::ANALYSIS_NOT_IMPLEMENTED))?;
        session.submit_analysis(method)?;
        while session.pending_analyses() > 0 {
            if let Some(output) = session.wait_analysis(Duration::from_secs(1)) {
                println!("{}", output?.summary);
            }
        }
    }

    if let Some(path) = &args.export_csv {
        session.export_csv(path)?;
    }
    if let Some(path) = &args.export_xlsx {
        session.export_xlsx(path)?;
    }
    if let Some(path) = &args.export_image {
        session.export_image(path)?;
    }
    if let Some(path) = &args.report {
        let mut options = ReportOptions::default();
        if let Some(title) = &args.report_title {
            options = options.with_title(title.clone());
        }
        if let Some(description) = &args.report_description {
            options = options.with_description(description.clone());
        }
        session.generate_report(path, &options)?;
    }

    if args.save_settings {
        session.save_settings()?;
    }
    Ok(())
}

fn list_catalogue() {
    for family in [TestFamily::Parametric, TestFamily::NonParametric] {
        println!("{}:", family.label());
        for test in StatTest::ALL.iter().filter(|t| t.family() == family) {
            let marker = if test.supports_post_hoc() { " [post-hoc]" } else { "" };
            println!("  {:<24} {}{marker}", test.slug(), test.label());
        }
    }
    println!("Post Hoc:");
    for procedure in PostHoc::ALL {
        println!("  {:<24} {}", procedure.slug(), procedure.label());
    }
    println!("グラフ:");
    for graph in GraphType::ALL {
        println!("  {:<24} {}", graph.slug(), graph.label());
    }
    println!("高度な分析:");
    for method in AnalysisMethod::ALL {
        println!("  {:<24} {}", method.slug(), method.label());
    }
}

fn settings(path: &Path, action: SettingsAction) -> Result<()> {
    let mut store = SettingsStore::open(path);
    match action {
        SettingsAction::Show => {
            if !path.exists() {
                bail!("no settings file at {}", path.display());
            }
            println!("{}", store.to_json_string()?);
        }
        SettingsAction::Clear => {
            store.clear()?;
            println!("ユーザー設定がクリアされました。");
        }
    }
    Ok(())
}
