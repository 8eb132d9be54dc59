//! CLI binary for pdf2slides.
//!
//! A thin shim over the library crate: `serve` runs the web form, `convert`
//! does a single run from the terminal.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2slides::web::{self, DEFAULT_MAX_UPLOAD_BYTES};
use pdf2slides::{
    convert_file, AssetRetention, ConversionConfig, ConversionController,
    ConversionProgressCallback, GoogleConverter, SlideGeometry,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner until the page count is known, then a bar
/// that advances once per uploaded page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF and checking credentials…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    /// Stop the spinner before an error is printed.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages into slides…"))
        ));
    }

    fn on_page_rendered(&self, page_num: usize, _total: usize, png_len: usize) {
        self.bar
            .set_message(format!("uploading page {page_num} ({} KiB)", png_len / 1024));
    }

    fn on_page_complete(&self, page_num: usize, total: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim("uploaded, slide queued"),
        ));
        self.bar.inc(1);
    }

    fn on_commit(&self, request_count: usize) {
        self.bar
            .set_message(format!("committing {request_count} requests"));
    }

    fn on_conversion_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages placed on slides",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Web form on http://127.0.0.1:8501
  pdf2slides serve

  # One-shot conversion, also writing talk_images.zip
  pdf2slides convert talk.pdf --save-images --out-dir exports/

  # Remove the public links once the deck exists
  pdf2slides --retention revoke-public convert talk.pdf

SETUP:
  1. Create an OAuth client ("Desktop app") in Google Cloud, enable the
     Drive and Slides APIs, and save the client JSON as credentials.json.
  2. Run any command. The first run opens the consent page in a browser and
     stores the granted token in token.json; later runs reuse or refresh it.

ENVIRONMENT VARIABLES:
  PDF2SLIDES_TOKEN_FILE       Token file (default token.json)
  PDF2SLIDES_CLIENT_SECRETS   OAuth client file (default credentials.json)
  PDFIUM_LIB_PATH             Path to an existing libpdfium
  RUST_LOG                    Overrides the log filter
"#;

/// Turn PDFs into Google Slides decks of full-page images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2slides",
    version,
    about = "Turn PDFs into Google Slides decks of full-page images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the upload form.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "PDF2SLIDES_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        /// Largest accepted upload, in MiB.
        #[arg(long, env = "PDF2SLIDES_MAX_UPLOAD_MB",
              default_value_t = DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024))]
        max_upload_mb: usize,
    },

    /// Convert one PDF and print the presentation URL.
    Convert {
        /// Local PDF file.
        input: PathBuf,

        /// Also write the page images as <stem>_images.zip.
        #[arg(long, env = "PDF2SLIDES_SAVE_IMAGES")]
        save_images: bool,

        /// Where to write the image archive.
        #[arg(long, env = "PDF2SLIDES_OUT_DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Presentation title (defaults to the file stem).
        #[arg(long, env = "PDF2SLIDES_TITLE")]
        title: Option<String>,

        /// Print the full ConversionOutput as JSON.
        #[arg(long, env = "PDF2SLIDES_JSON")]
        json: bool,

        /// Disable progress bar.
        #[arg(long, env = "PDF2SLIDES_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Stored OAuth token (read, refreshed and rewritten).
    #[arg(long, global = true, env = "PDF2SLIDES_TOKEN_FILE", default_value = "token.json")]
    token_file: PathBuf,

    /// OAuth client registration (installed or web app JSON).
    #[arg(long, global = true, env = "PDF2SLIDES_CLIENT_SECRETS",
          default_value = "credentials.json")]
    client_secrets: PathBuf,

    /// Render scale relative to 72 DPI (0.25–8.0).
    #[arg(long, global = true, env = "PDF2SLIDES_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Slide image width in points.
    #[arg(long, global = true, env = "PDF2SLIDES_SLIDE_WIDTH", default_value_t = 720.0)]
    slide_width: f64,

    /// Slide image height in points.
    #[arg(long, global = true, env = "PDF2SLIDES_SLIDE_HEIGHT", default_value_t = 405.0)]
    slide_height: f64,

    /// What to do with uploaded images after the deck is built.
    #[arg(long, global = true, env = "PDF2SLIDES_RETENTION", value_enum, default_value = "keep")]
    retention: RetentionArg,

    /// Path to libpdfium (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the consent URL instead of opening a browser.
    #[arg(long, global = true, env = "PDF2SLIDES_NO_BROWSER")]
    no_browser: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2SLIDES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2SLIDES_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RetentionArg {
    Keep,
    RevokePublic,
    Delete,
}

impl From<RetentionArg> for AssetRetention {
    fn from(v: RetentionArg) -> Self {
        match v {
            RetentionArg::Keep => AssetRetention::Keep,
            RetentionArg::RevokePublic => AssetRetention::RevokePublic,
            RetentionArg::Delete => AssetRetention::Delete,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during a one-shot conversion.
    let show_progress = match &cli.command {
        Command::Convert {
            json, no_progress, ..
        } => !cli.common.quiet && !json && !no_progress,
        Command::Serve { .. } => false,
    };
    let filter = if cli.common.verbose {
        "debug"
    } else if cli.common.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            bind,
            max_upload_mb,
        } => {
            let config = build_config(&cli.common, None)?;
            serve(bind, max_upload_mb, config, !cli.common.no_browser).await
        }
        Command::Convert {
            input,
            save_images,
            out_dir,
            title,
            json,
            ..
        } => {
            let config = build_config(&cli.common, title)?;
            let bar = show_progress.then(CliProgressCallback::new_dynamic);
            let progress = bar
                .clone()
                .map(|bar| bar as Arc<dyn ConversionProgressCallback>);

            let result = convert_file(&input, save_images, &config, progress).await;
            if result.is_err() {
                if let Some(bar) = &bar {
                    bar.clear();
                }
            }
            let output =
                result.with_context(|| format!("Conversion of {} failed", input.display()))?;

            if let Some(archive) = &output.archive {
                tokio::fs::create_dir_all(&out_dir)
                    .await
                    .with_context(|| format!("Failed to create {}", out_dir.display()))?;
                let path = out_dir.join(&archive.file_name);
                tokio::fs::write(&path, &archive.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.common.quiet && !json {
                    eprintln!(
                        "   {} images  →  {}",
                        archive.entries,
                        bold(&path.display().to_string())
                    );
                }
            }

            if json {
                let json =
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
                println!("{json}");
            } else {
                println!("{}", output.presentation_url);
                if !cli.common.quiet {
                    eprintln!(
                        "   {} slides  /  {} KiB uploaded  /  {}ms total",
                        output.slides.len(),
                        dim(&(output.stats.uploaded_bytes / 1024).to_string()),
                        output.stats.total_duration_ms,
                    );
                }
            }
            Ok(())
        }
    }
}

async fn serve(
    bind: SocketAddr,
    max_upload_mb: usize,
    config: ConversionConfig,
    open_browser: bool,
) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;

    let converter = Arc::new(GoogleConverter::new(config));
    let controller = ConversionController::new(converter);

    let url = format!("http://{addr}/");
    eprintln!("{} {}", cyan("◆"), bold(&format!("Open {url} to convert a PDF")));
    if open_browser {
        if let Err(e) = webbrowser::open(&url) {
            tracing::warn!("Could not open a browser: {}", e);
        }
    }

    web::serve(listener, controller, max_upload_mb.saturating_mul(1024 * 1024))
        .await
        .context("Web server stopped")
}

/// Map CLI args to `ConversionConfig`.
fn build_config(common: &CommonArgs, title: Option<String>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .render_scale(common.scale)
        .geometry(SlideGeometry {
            width_pt: common.slide_width,
            height_pt: common.slide_height,
        })
        .retention(common.retention.into())
        .token_path(&common.token_file)
        .client_secrets_path(&common.client_secrets)
        .open_browser(!common.no_browser);

    if let Some(path) = &common.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(title) = title {
        builder = builder.title(title);
    }

    builder.build().context("Invalid configuration")
}
