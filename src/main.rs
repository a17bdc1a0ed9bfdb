//! 命令行入口
//!
//! 读取一个 HTML 文件，用 Ollama 后端在无头布局上执行整页翻译，输出翻译后的文档。

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use page_translator::env::{self, EnvVar};
use page_translator::page::{FlowLayout, Page, Rect};
use page_translator::translation::{
    ConfigManager, DisplayMode, OllamaTranslator, PageRun, PageTranslator, StaticSettings,
    TranslationError, TranslationResult, TranslationSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Show {
    Original,
    Translated,
}

#[derive(Parser, Debug)]
#[command(name = "page-translator", version, about, long_about = None)]
struct Args {
    /// HTML file to translate
    #[arg(required_unless_present_any = ["print_env", "init_config"])]
    input: Option<PathBuf>,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Translation backend base URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Model name
    #[arg(short, long)]
    model: Option<String>,

    /// Target language code (ja, zh, ko, en)
    #[arg(short, long)]
    target: Option<String>,

    /// Viewport size used for priority ordering
    #[arg(long, default_value = "1280x800", value_parser = parse_viewport)]
    viewport: (f64, f64),

    /// Which text the written document shows
    #[arg(long, value_enum, default_value_t = Show::Translated)]
    show: Show,

    /// Page location used for domain exclusion (defaults to the input file URL)
    #[arg(short, long)]
    location: Option<String>,

    /// Charset of the input when the document does not declare one
    #[arg(long)]
    encoding: Option<String>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    print_env: bool,

    /// Write an example settings file to this path and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

fn parse_viewport(value: &str) -> Result<(f64, f64), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: f64 = width.trim().parse().map_err(|_| format!("invalid width '{}'", width))?;
    let height: f64 = height.trim().parse().map_err(|_| format!("invalid height '{}'", height))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport dimensions must be positive".to_string());
    }
    Ok((width, height))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env::core::LogLevel::get_or_default("info".to_string())));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_settings(args: &Args) -> TranslationResult<TranslationSettings> {
    let manager = match &args.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };

    let mut settings = manager.get_settings().clone();
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(target) = &args.target {
        settings.target_language = target.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn default_location(input: &Path) -> String {
    fs::canonicalize(input)
        .ok()
        .and_then(|path| Url::from_file_path(path).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| "about:blank".to_string())
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, bytes),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()
        }
    }
}

async fn run(args: &Args, input: &Path) -> TranslationResult<()> {
    let settings = load_settings(args)?;

    let data = fs::read(input)
        .map_err(|e| TranslationError::DocumentError(format!("无法读取 {}: {}", input.display(), e)))?;
    let location = args
        .location
        .clone()
        .unwrap_or_else(|| default_location(input));
    let (width, height) = args.viewport;

    let page = Page::from_html(
        &data,
        args.encoding.as_deref(),
        Box::new(FlowLayout::new(width, 8.0, 20.0)),
        Rect::new(0.0, 0.0, width, height),
        location,
    )?;

    let engine = PageTranslator::new(page, OllamaTranslator::new(), StaticSettings::from(settings));
    let run = engine.start().await?;
    match &run {
        PageRun::Completed(report) => tracing::info!(
            "翻译结束: {}/{} 个段落",
            report.translated(),
            report.candidates()
        ),
        other => tracing::info!("未执行翻译: {:?}", other),
    }

    if args.show == Show::Original && engine.display_mode() == DisplayMode::Translated {
        engine.toggle();
    }

    let bytes = engine.page().serialize()?;
    write_output(args.output.as_deref(), &bytes)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    if args.print_env {
        print!("{}", env::generate_env_docs());
        return ExitCode::SUCCESS;
    }

    if let Some(path) = &args.init_config {
        return match ConfigManager::generate_example_config(path) {
            Ok(()) => {
                eprintln!("已生成示例配置: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("Error: {}", error);
                ExitCode::FAILURE
            }
        };
    }

    let Some(input) = args.input.clone() else {
        eprintln!("Error: no input file");
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Error: failed to start runtime: {}", error);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&args, &input)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}
