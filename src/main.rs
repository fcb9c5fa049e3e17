// ABOUTME: Main entry point for the deckview program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::info;

use deckview::{
    html, server, slides, ChromeRasterizer, Collaborators, Config, Deck, DeckError,
    DirectorySink, DownloadSink, HtmlOptions, RevealTimer, SlideDeck, SystemClipboard,
    ViewHandle,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the slides in presentation order
    List,

    /// Write the deck as a standalone HTML document
    Html(HtmlArgs),

    /// Export slides as PNG images through a headless browser
    Export(ExportArgs),

    /// Present the deck in a browser, driven by this process
    Present(PresentArgs),
}

#[derive(Args)]
struct HtmlArgs {
    /// Path to output HTML file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct ExportArgs {
    /// 1-based slide to export
    #[arg(long, conflicts_with = "all")]
    slide: Option<usize>,

    /// Export every slide
    #[arg(long)]
    all: bool,

    /// Output directory for slide images (defaults to DECK_OUTPUT_DIR or .)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 1-based slide that is active when the export starts
    #[arg(long)]
    start: Option<usize>,
}

#[derive(Args)]
struct PresentArgs {
    /// HTTP port; the websocket listens on the next port up
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => match &cli.command {
            Some(Commands::List) => {
                list_slides(&slides::builtin());
                Ok(())
            }
            Some(Commands::Html(args)) => {
                println!("Executing html command...");
                write_html(&config, args)
            }
            Some(Commands::Export(args)) => {
                println!("Executing export command...");
                export(&config, args)
            }
            Some(Commands::Present(args)) => {
                println!("Executing present command...");
                present(&config, args)
            }
            None => {
                println!("No command specified. Use --help for usage information.");
                Ok(())
            }
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn list_slides(deck: &SlideDeck) {
    println!("{}", deck.title);
    for (index, slide) in deck.slides().iter().enumerate() {
        println!("{:>3}. {}", index + 1, slide.label);
    }
}

fn html_options(config: &Config, socket_url: Option<String>) -> HtmlOptions {
    HtmlOptions {
        socket_url,
        initial_index: 0,
        reveal: RevealTimer::new(config.reveal_unit()),
    }
}

fn write_html(config: &Config, args: &HtmlArgs) -> deckview::Result<()> {
    let deck = slides::builtin();
    let document = html::generate_html(&deck, &html_options(config, None));
    html::write_html_to_file(&document, &args.output)
        .map_err(|e| anyhow::anyhow!("Failed to write output file: {}", e))?;
    println!("HTML generated successfully: {:?}", args.output);
    Ok(())
}

/// Convert a 1-based slide number from the command line to an index
fn slide_index(number: usize, len: usize, flag: &str) -> deckview::Result<usize> {
    if number == 0 || number > len {
        return Err(DeckError::ValidationError(format!(
            "{} must be between 1 and {}, got {}",
            flag, len, number
        )));
    }
    Ok(number - 1)
}

/// Write a standalone copy of the deck for the headless browser to load
fn write_capture_document(config: &Config, deck: &SlideDeck) -> deckview::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("deckview-{}.html", uuid::Uuid::new_v4()));
    let document = html::generate_html(deck, &html_options(config, None));
    html::write_html_to_file(&document, &path)?;
    Ok(path)
}

fn launch_rasterizer(
    config: &Config,
    deck: &SlideDeck,
) -> deckview::Result<(PathBuf, Option<Arc<dyn deckview::Rasterizer>>)> {
    let document = write_capture_document(config, deck)?;
    let rasterizer = ChromeRasterizer::try_launch(&document, deck.len(), &config.get_render_config());
    Ok((document, rasterizer))
}

fn runtime() -> deckview::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(DeckError::from)
}

fn export(config: &Config, args: &ExportArgs) -> deckview::Result<()> {
    let deck = slides::builtin();
    let output_dir = args.output.clone().unwrap_or_else(|| config.output_dir.clone());
    let sink = Arc::new(DirectorySink::new(&output_dir)?);

    let start = match args.start {
        Some(number) => slide_index(number, deck.len(), "--start")?,
        None => 0,
    };
    let slide = args
        .slide
        .map(|number| slide_index(number, deck.len(), "--slide"))
        .transpose()?;

    let (document, rasterizer) = launch_rasterizer(config, &deck)?;
    let controller = Deck::new(
        deck,
        config,
        Collaborators {
            clipboard: Arc::new(SystemClipboard::new()),
            rasterizer,
            sink,
        },
        ViewHandle::new(),
    )?;
    controller.navigate(start as i64);

    let report = runtime()?.block_on(async {
        match (args.all, slide) {
            (true, _) => controller.export_all().await,
            (false, Some(index)) => controller.export_slide(index).await,
            (false, None) => controller.export_one().await,
        }
    });
    remove_capture_document(&document);
    let report = report?;

    for file_name in &report.exported {
        println!("Wrote {}", output_dir.join(file_name).display());
    }
    match report.failure {
        Some(failure) => Err(anyhow::anyhow!(
            "Export stopped at slide {}: {}",
            failure.slide + 1,
            failure.message
        )
        .into()),
        None => {
            println!(
                "Exported {} slide(s) to {}",
                report.exported.len(),
                output_dir.display()
            );
            Ok(())
        }
    }
}

fn present(config: &Config, args: &PresentArgs) -> deckview::Result<()> {
    let deck = slides::builtin();
    let present_config = config.get_present_config(args.port)?;
    let view = ViewHandle::new();

    let (document, rasterizer) = launch_rasterizer(config, &deck)?;
    let page = html::generate_html(
        &deck,
        &html_options(config, Some(server::socket_url(&present_config))),
    );
    let controller = Arc::new(Deck::new(
        deck,
        config,
        Collaborators {
            clipboard: Arc::new(SystemClipboard::new()),
            rasterizer,
            sink: Arc::new(DownloadSink::new(view.clone())),
        },
        view,
    )?);

    info!("Starting presenter on port {}", present_config.port);
    let result = runtime()?.block_on(server::run_presenter(controller, page, present_config));
    remove_capture_document(&document);
    result
}

fn remove_capture_document(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::debug!("Could not remove {:?}: {}", path, e);
    }
}
