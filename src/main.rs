use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lottie_compiler::core::{AnimationBody, FilepathImageProvider, NodeKind};
use lottie_compiler::{AnimationCompiler, AnimationDocument, CompatibilityMode, CompilerOptions, LayerNode};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the animation JSON document
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// JSON file with compiler options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Fail on the first unsupported feature
    #[arg(long)]
    abort: bool,

    /// Directory that image assets are read from
    #[arg(long, value_name = "DIR")]
    image_dir: Option<PathBuf>,

    /// Print the playback progress of a named marker
    #[arg(long, value_name = "NAME")]
    marker: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut options = match &cli.options {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading options {}", path.display()))?;
            CompilerOptions::from_json(&json).with_context(|| format!("parsing options {}", path.display()))?
        }
        None => CompilerOptions::default(),
    };
    if cli.abort {
        options.compatibility_mode = CompatibilityMode::Abort;
    }

    let bytes = fs::read(&cli.document).with_context(|| format!("reading {}", cli.document.display()))?;
    let document = AnimationDocument::from_slice(&bytes)
        .with_context(|| format!("decoding {}", cli.document.display()))?;
    info!(
        layers = document.layers.len(),
        frames = document.duration_frames(),
        framerate = document.framerate,
        "loaded document"
    );

    if let Some(name) = &cli.marker {
        match document.progress_for_marker(name) {
            Some(progress) => println!("marker {name}: progress {progress:.4}"),
            None => bail!("document has no marker named {name:?}"),
        }
    }

    let mut compiler = AnimationCompiler::new(options);
    if let Some(dir) = &cli.image_dir {
        compiler = compiler.with_image_provider(FilepathImageProvider::new(dir));
    }
    let compiled = compiler
        .compile(&document)
        .with_context(|| format!("compiling {}", cli.document.display()))?;

    compiled.root.visit(0, &mut |node, depth| println!("{}", describe(node, depth)));

    for issue in &compiled.issues {
        warn!(context = %issue.context, "{}", issue.message);
    }
    info!(
        nodes = compiled.root.node_count(),
        animations = compiled.root.animation_count(),
        issues = compiled.issues.len(),
        "done"
    );
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level.to_string().parse()?)
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
    Ok(())
}

/// One line of the printed tree: indentation, kind, name, then the
/// animated key paths.
fn describe(node: &LayerNode, depth: usize) -> String {
    let kind = match &node.kind {
        NodeKind::Container => "container",
        NodeKind::Transform => "transform",
        NodeKind::Shape(_) => "shape",
        NodeKind::Gradient(_) => "gradient",
        NodeKind::Image { image: None, .. } => "image (missing)",
        NodeKind::Image { .. } => "image",
        NodeKind::Text(_) => "text",
        NodeKind::InfinitePlane { .. } => "plane",
    };
    let mut line = format!("{}{kind} {:?}", "  ".repeat(depth), node.name);
    if !node.animations.is_empty() {
        let animated: Vec<String> = node
            .animations
            .iter()
            .map(|animation| match &animation.body {
                AnimationBody::Basic { .. } => animation.key_path.clone(),
                AnimationBody::Keyframe(keyframes) => format!("{}[{}]", animation.key_path, keyframes.key_times.len()),
                AnimationBody::Sequence(segments) => format!("{}[{} segments]", animation.key_path, segments.len()),
            })
            .collect();
        line.push_str(&format!(" animates {}", animated.join(", ")));
    }
    line
}
