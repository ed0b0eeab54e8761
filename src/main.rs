//! gijiroku - preview and export meeting minutes

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use gijiroku::export::{
    CaptureOptions, DirectorySaver, DocxConfig, ExportConfig, Format, PdfConfig, RasterImage,
    RegionCapture,
};
use gijiroku::session::{Clipboard, Session};
use gijiroku::template::{JsonFileStore, MemoryStore, Template};
use gijiroku::{Error, preview};

const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "store.json";
const CONFIG_DIR_ENV: &str = "GIJIROKU_CONFIG_DIR";

#[derive(Parser)]
#[command(name = "gijiroku")]
#[command(version, about = "Preview and export meeting minutes", long_about = None)]
#[command(after_help = "EXAMPLES:
    gijiroku preview minutes.md                 Print the HTML preview
    gijiroku export minutes.md --format docx    Write 議事録_<date>.docx
    gijiroku export minutes.md --format pdf --capture shot.png -o out.pdf
    gijiroku templates fork minutes --name 定例会")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: ~/.gijiroku/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log pipeline steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render Markdown to the preview HTML fragment
    Preview {
        /// Markdown file, or - for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Write the fragment here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Export Markdown to a downloadable format
    Export {
        /// Markdown file, or - for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output format (default: from the extension of -o)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// PNG screenshot of the rendered preview (required for PDF)
        #[arg(long, value_name = "PNG")]
        capture: Option<PathBuf>,

        /// Output file (default: <label>_<date>.<ext> in the current directory)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Label used in the default filename
        #[arg(long)]
        label: Option<String>,
    },
    /// Copy Markdown to the system clipboard
    Copy {
        /// Markdown file, or - for stdin
        #[arg(value_name = "INPUT")]
        input: String,
    },
    /// Manage generation templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List presets and custom templates
    List,
    /// Print a template's system prompt
    Show { id: String },
    /// Copy a template into a new custom template
    Fork {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Change a custom template
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// File holding the new system prompt
        #[arg(long, value_name = "FILE")]
        prompt_file: Option<PathBuf>,
    },
    /// Delete a custom template
    Delete { id: String },
    /// Select the template used for generation
    Select { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Md,
    Docx,
    Pdf,
    Html,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Md => Format::Markdown,
            FormatArg::Docx => Format::Docx,
            FormatArg::Pdf => Format::Pdf,
            FormatArg::Html => Format::Html,
        }
    }
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    label: Option<String>,
    store_path: Option<PathBuf>,
    pdf: PdfSettings,
    docx: DocxSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PdfSettings {
    scale: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DocxSettings {
    creator: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GIJIROKU_LOG").unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config_dir = config_dir(cli.config.as_deref());
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join(CONFIG_FILE_NAME));
    let settings = load_settings(&config_path)?;
    let store_path = settings
        .store_path
        .clone()
        .unwrap_or_else(|| config_dir.join(STORE_FILE_NAME));

    match cli.command {
        Command::Preview { input, output } => {
            let html = preview::render_markdown(&read_input(&input)?);
            match output {
                Some(path) => fs::write(&path, html).map_err(|e| e.to_string())?,
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout
                        .write_all(html.as_bytes())
                        .and_then(|()| stdout.write_all(b"\n"))
                        .map_err(|e| e.to_string())?;
                }
            }
            Ok(())
        }
        Command::Export {
            input,
            format,
            capture,
            output,
            label,
        } => {
            let format = resolve_format(format, output.as_deref())?;
            let mut pdf_config = PdfConfig::default();
            if let Some(scale) = settings.pdf.scale {
                pdf_config.scale = scale;
            }
            let mut docx_config = DocxConfig::default();
            if let Some(creator) = settings.docx.creator {
                docx_config.creator = creator;
            }
            let export_config = ExportConfig {
                label: label
                    .or(settings.label)
                    .unwrap_or_else(|| ExportConfig::default().label),
                date: None,
            };
            let mut session = Session::new(MemoryStore::new())
                .with_export_config(export_config)
                .with_pdf_config(pdf_config)
                .with_docx_config(docx_config);
            session.set_markdown(read_input(&input)?);

            let (dir, filename) = match output {
                Some(path) => split_output(&path),
                None => (PathBuf::from("."), None),
            };
            let capture = capture.map(PngCapture::new);
            let artifact = session
                .save(
                    format,
                    &DirectorySaver::new(&dir),
                    capture.as_ref().map(|c| c as &dyn RegionCapture),
                    filename,
                )
                .map_err(|e| e.to_string())?;
            if !cli.quiet {
                println!("{}", dir.join(&artifact.filename).display());
            }
            Ok(())
        }
        Command::Copy { input } => {
            let mut session = Session::new(MemoryStore::new());
            session.set_markdown(read_input(&input)?);
            let mut clipboard = SystemClipboard::new().map_err(|e| e.to_string())?;
            session
                .copy_markdown(&mut clipboard)
                .map_err(|e| e.to_string())
        }
        Command::Templates { action } => {
            let store = JsonFileStore::open(&store_path).map_err(|e| e.to_string())?;
            tracing::debug!(path = %store.path().display(), "using template store");
            let session = Session::new(store);
            manage_templates(session, action, cli.quiet).map_err(|e| e.to_string())
        }
    }
}

fn manage_templates(
    mut session: Session<JsonFileStore>,
    action: TemplateAction,
    quiet: bool,
) -> gijiroku::Result<()> {
    let registry = session.templates_mut();
    match action {
        TemplateAction::List => {
            let selected = registry.selected_id();
            for template in registry.list_all() {
                let marker = if template.id == selected { "*" } else { " " };
                let kind = if registry.is_preset(&template.id) {
                    "preset"
                } else {
                    "custom"
                };
                println!("{marker} {:<24} {:<7} {}", template.id, kind, template.name);
            }
        }
        TemplateAction::Show { id } => {
            let template = registry.get(&id)?;
            println!("# {}", template.name);
            println!("{}", template.system_prompt);
        }
        TemplateAction::Fork { id, name } => {
            let mut forked = registry.fork(&id)?;
            if let Some(name) = name {
                forked.name = name;
                registry.update(&forked.id, forked.clone())?;
            }
            if !quiet {
                println!("{}", forked.id);
            }
        }
        TemplateAction::Edit {
            id,
            name,
            prompt_file,
        } => {
            if registry.is_preset(&id) {
                if !quiet {
                    eprintln!("{id} is a preset and was not changed; fork it to edit a copy");
                }
                return Ok(());
            }
            let current = registry.get(&id)?;
            let system_prompt = match prompt_file {
                Some(path) => fs::read_to_string(path)?,
                None => current.system_prompt,
            };
            let updated = Template::new(&id, name.unwrap_or(current.name), system_prompt);
            registry.update(&id, updated)?;
        }
        TemplateAction::Delete { id } => {
            if registry.is_preset(&id) {
                if !quiet {
                    eprintln!("{id} is a preset and was not deleted");
                }
            } else if !registry.delete_and_reselect(&id)? {
                return Err(Error::TemplateNotFound(id));
            }
        }
        TemplateAction::Select { id } => registry.select(&id)?,
    }
    Ok(())
}

/// Resolve the settings directory: `--config`'s parent, `$GIJIROKU_CONFIG_DIR`,
/// then `~/.gijiroku`.
fn config_dir(explicit: Option<&Path>) -> PathBuf {
    resolve_config_dir(explicit, std::env::var_os(CONFIG_DIR_ENV), dirs::home_dir())
}

fn resolve_config_dir(
    explicit: Option<&Path>,
    env_dir: Option<OsString>,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(parent) = explicit.and_then(Path::parent)
        && !parent.as_os_str().is_empty()
    {
        return parent.to_path_buf();
    }
    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    home.map(|home| home.join(".gijiroku"))
        .unwrap_or_else(|| PathBuf::from(".gijiroku"))
}

/// Load settings. A missing file means defaults.
fn load_settings(path: &Path) -> Result<Settings, String> {
    match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).map_err(|e| format!("{}: {e}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file; using defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(format!("{}: {e}", path.display())),
    }
}

fn read_input(input: &str) -> Result<String, String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| e.to_string())?;
        Ok(buf)
    } else {
        fs::read_to_string(input).map_err(|e| format!("{input}: {e}"))
    }
}

/// `--format` wins; otherwise the extension of the output path decides.
fn resolve_format(arg: Option<FormatArg>, output: Option<&Path>) -> Result<Format, String> {
    if let Some(arg) = arg {
        return Ok(arg.into());
    }
    output
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
        .ok_or_else(|| "--format is required unless -o ends in .md, .html, .docx or .pdf".into())
}

fn split_output(path: &Path) -> (PathBuf, Option<String>) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    (dir, filename)
}

/// A pre-rendered screenshot of the preview region.
struct PngCapture {
    path: PathBuf,
}

impl PngCapture {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RegionCapture for PngCapture {
    fn capture(&self, _options: &CaptureOptions) -> gijiroku::Result<RasterImage> {
        let capture_error = |e: &dyn std::fmt::Display| {
            Error::RenderCapture(format!("{}: {e}", self.path.display()))
        };
        let file = File::open(&self.path).map_err(|e| capture_error(&e))?;
        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info().map_err(|e| capture_error(&e))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf).map_err(|e| capture_error(&e))?;
        buf.truncate(frame.buffer_size());

        let rgba = to_rgba(frame.color_type, buf)
            .ok_or_else(|| capture_error(&"indexed color was not expanded"))?;
        tracing::debug!(width = frame.width, height = frame.height, "decoded capture");
        Ok(RasterImage::new(frame.width, frame.height, rgba))
    }
}

/// Widen 8-bit decoded samples to RGBA. Palette data must already be expanded.
fn to_rgba(color_type: png::ColorType, buf: Vec<u8>) -> Option<Vec<u8>> {
    let rgba = match color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => return None,
    };
    Some(rgba)
}

struct SystemClipboard(arboard::Clipboard);

impl SystemClipboard {
    fn new() -> gijiroku::Result<Self> {
        arboard::Clipboard::new()
            .map(Self)
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> gijiroku::Result<()> {
        self.0
            .set_text(text)
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}
