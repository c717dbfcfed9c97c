use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use serde::Serialize;
use simplelog::{Config, LevelFilter, WriteLogger};

use mediaview::config::resolve_config;
use mediaview::headless::HeadlessCanvas;
use mediaview::plugins::DownloadOptions;
use mediaview::readers::FixedProbe;
use mediaview::{
    Command, CommandOutput, ContainerStyle, Dimension, Direction, PluginSpec, Rect,
    ReaderRegistry, RenderOptions, Renderable, Size, Viewer, ViewerHost,
};

const PAGE_GAP: f64 = 8.0;

#[derive(Parser)]
#[command(name = "mediaview")]
#[command(version)]
#[command(about = "Inspect and download paginated media the way the viewer lays it out")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Where log output goes
    #[arg(long, global = true, default_value = "mediaview.log")]
    log_file: PathBuf,

    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load sources, lay them out on a virtual canvas and report page geometry
    Inspect {
        /// Files or URLs; several are shown as one strip
        #[arg(required = true)]
        sources: Vec<String>,

        /// YAML config (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Canvas size as WIDTHxHEIGHT
        #[arg(long, default_value = "1024x768", value_parser = parse_size)]
        viewport: Size,

        /// Size reported for media whose dimensions need a decoder (video, YouTube)
        #[arg(long, default_value = "640x360", value_parser = parse_size)]
        media_size: Size,

        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,

        #[arg(long, value_enum)]
        normalize: Option<DimensionArg>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Save a source through the download plugin
    Download {
        url: String,

        /// File name to save under (defaults to the URL's last segment)
        #[arg(long)]
        name: Option<String>,

        /// Target directory (defaults to the user download directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Vertical,
    Horizontal,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Vertical => Direction::Vertical,
            DirectionArg::Horizontal => Direction::Horizontal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DimensionArg {
    Width,
    Height,
}

impl From<DimensionArg> for Dimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::Width => Dimension::Width,
            DimensionArg::Height => Dimension::Height,
        }
    }
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid dimension '{part}'"))
    };
    Ok(Size::new(parse(width)?, parse(height)?))
}

#[derive(Serialize)]
struct PageReport {
    index: usize,
    width: f64,
    height: f64,
    container: ContainerStyle,
    renderable: Renderable,
}

#[derive(Serialize)]
struct InspectReport {
    viewport: Size,
    direction: Direction,
    zoom: Option<f64>,
    page: Option<usize>,
    pages: Vec<PageReport>,
}

struct InspectArgs {
    sources: Vec<String>,
    config: Option<PathBuf>,
    viewport: Size,
    media_size: Size,
    direction: Option<DirectionArg>,
    normalize: Option<DimensionArg>,
    json: bool,
}

fn inspect(args: InspectArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(direction) = args.direction {
        config.direction = direction.into();
    }
    if let Some(normalize) = args.normalize {
        config.normalize = Some(normalize.into());
    }
    let options = config.host_options();

    let registry = ReaderRegistry::new(FixedProbe(args.media_size));
    let reader = registry.open_all(&args.sources)?;

    let mut host = ViewerHost::new(reader, config.into_specs(), options);
    let canvas = HeadlessCanvas::new(Rect::new(0.0, 0.0, args.viewport.width, args.viewport.height));
    host.viewer_mut().attach_canvas(canvas.boxed());

    host.load();
    host.wait();
    if let Some(e) = host.error() {
        bail!("Failed to load pages: {e}");
    }

    let containers: Vec<ContainerStyle> = (0..host.pages().len())
        .filter_map(|index| host.container_props(index))
        .map(|props| props.style)
        .collect();
    let sizes: Vec<Size> = containers
        .iter()
        .zip(host.pages())
        .map(|(style, page)| {
            Size::new(
                style.width.unwrap_or(page.width),
                style.height.unwrap_or(page.height),
            )
        })
        .collect();

    let viewer = host.viewer_mut();
    for (index, element) in canvas
        .stack(&sizes, options.direction, PAGE_GAP)
        .iter()
        .enumerate()
    {
        viewer.attach_page_element(index, element.boxed());
    }
    viewer.run_animation_frame();

    let render_options = RenderOptions {
        scale: viewer.zoom().unwrap_or(1.0),
        ..RenderOptions::default()
    };
    let report = InspectReport {
        viewport: args.viewport,
        direction: options.direction,
        zoom: viewer.zoom(),
        page: viewer.page(),
        pages: viewer
            .pages()
            .iter()
            .zip(containers)
            .enumerate()
            .map(|(index, (page, container))| PageReport {
                index,
                width: page.width,
                height: page.height,
                container,
                renderable: page.render(&render_options),
            })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &InspectReport) {
    println!(
        "{} page(s), viewport {}x{}",
        report.pages.len(),
        report.viewport.width,
        report.viewport.height
    );
    if let Some(zoom) = report.zoom {
        println!("zoom: {zoom:.3}");
    }
    if let Some(page) = report.page {
        println!("current page: {page}");
    }
    for page in &report.pages {
        let shown = match (page.container.width, page.container.height) {
            (Some(w), Some(h)) => format!("{w:.1}x{h:.1}"),
            _ => "-".to_string(),
        };
        println!(
            "  #{:<3} {:>8.1}x{:<8.1} shown {shown:<16} {}",
            page.index,
            page.width,
            page.height,
            renderable_label(&page.renderable)
        );
    }
}

fn renderable_label(renderable: &Renderable) -> String {
    match renderable {
        Renderable::Image { src } => format!("image {src}"),
        Renderable::PdfPage { src, index, .. } => format!("pdf {src} p{}", index + 1),
        Renderable::Video { src, .. } => format!("video {src}"),
        Renderable::Audio { src, .. } => format!("audio {src}"),
        Renderable::Embed { src } => format!("embed {src}"),
    }
}

fn download(url: String, name: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let options = DownloadOptions {
        url: Some(url.clone()),
        file_name: None,
        target_dir: out,
    };
    let mut viewer = Viewer::new(vec![PluginSpec::Download(options)], Direction::default());
    let output = viewer
        .execute(Command::Download { file_name: name })
        .with_context(|| format!("Failed to download {url}"))?;

    if let CommandOutput::Downloaded(path) = output {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level.into(),
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?,
    )?;
    info!("Starting mediaview");

    let result = match cli.command {
        Commands::Inspect {
            sources,
            config,
            viewport,
            media_size,
            direction,
            normalize,
            json,
        } => inspect(InspectArgs {
            sources,
            config,
            viewport,
            media_size,
            direction,
            normalize,
            json,
        }),
        Commands::Download { url, name, out } => download(url, name, out),
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    info!("Shutting down mediaview");
    result
}
