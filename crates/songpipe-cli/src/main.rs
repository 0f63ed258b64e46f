use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use songpipe_core::ResolvedReference;
use songpipe_local::{
    fallback::build_fallback_with, parse_candidates, sanitize_outcome, Resolver, ResolverConfig,
    Sanitized,
};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "songpipe")]
#[command(about = "Turn model song suggestions into safe, working links", long_about = None)]
struct Cli {
    /// Default log filter when RUST_LOG is unset (logs go to stderr).
    #[arg(long, global = true, env = "SONGPIPE_LOG", default_value = "warn")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a batch of candidates (JSON or free-form model output) into verified links.
    Resolve(ResolveCmd),
    /// Sanitize a single raw URL string (no network).
    Sanitize(SanitizeCmd),
    /// Build the fallback search URL for a title/artist pair (no network).
    Fallback(FallbackCmd),
    /// Print the effective configuration (json).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    /// One `title / artist<TAB>url` line per result.
    Text,
}

#[derive(clap::Args, Debug)]
struct ResolveCmd {
    /// Input file; `-` or omitted reads stdin.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output JSON path (default: stdout).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Override SONGPIPE_MAX_BATCH.
    #[arg(long)]
    max_batch: Option<usize>,
    /// Override SONGPIPE_CONCURRENCY.
    #[arg(long)]
    concurrency: Option<usize>,
    /// Override SONGPIPE_VERIFY_TIMEOUT_MS.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Override SONGPIPE_OEMBED_ENDPOINT.
    #[arg(long)]
    oembed_endpoint: Option<String>,
    /// Trust canonical watch URLs without an oEmbed check.
    #[arg(long, default_value_t = false)]
    no_verify: bool,
    #[arg(long = "output", alias = "format", value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

#[derive(clap::Args, Debug)]
struct SanitizeCmd {
    /// Raw URL text, as the model produced it.
    raw: String,
}

#[derive(clap::Args, Debug)]
struct FallbackCmd {
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    artist: String,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    #[arg(long = "output", alias = "format", value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

/// Opt-in KEY=VALUE env file (`SONGPIPE_ENV_FILE`). Never overrides the process env.
fn load_env_file() {
    let Ok(p) = std::env::var("SONGPIPE_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second init (tests embedding main) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(p) if p.as_os_str() != "-" => {
            std::fs::read_to_string(p).with_context(|| format!("read input {}", p.display()))
        }
        _ => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("read stdin")?;
            Ok(s)
        }
    }
}

fn write_output(out: Option<&PathBuf>, body: &str) -> Result<()> {
    match out {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            std::fs::write(p, body).with_context(|| format!("write {}", p.display()))
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

fn render_text(results: &[ResolvedReference]) -> String {
    results
        .iter()
        .map(|r| format!("{} / {}\t{}", r.title, r.artist, r.url))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn run_resolve(args: ResolveCmd) -> Result<()> {
    let mut cfg = ResolverConfig::from_env();
    if let Some(n) = args.max_batch {
        cfg.max_batch = n;
    }
    if let Some(n) = args.concurrency {
        cfg.concurrency = n;
    }
    if let Some(ms) = args.timeout_ms {
        cfg.verify_timeout_ms = ms;
    }
    if let Some(e) = args.oembed_endpoint {
        cfg.oembed_endpoint = e;
    }
    if args.no_verify {
        cfg.verify = false;
    }
    let resolver = Resolver::from_config(cfg).context("build resolver")?;

    let text = read_input(args.input.as_ref())?;
    let candidates = parse_candidates(&text).context("parse candidates")?;
    tracing::info!(count = candidates.len(), "resolving candidates");
    let results = resolver.resolve_batch(&candidates).await;

    let body = match args.output {
        OutputFormat::Text => render_text(&results),
        OutputFormat::Json => serde_json::json!({
            "schema_version": 1,
            "kind": "resolve",
            "ok": true,
            "input_count": candidates.len(),
            "max_batch": resolver.config().max_batch,
            "results": results,
        })
        .to_string(),
    };
    write_output(args.out.as_ref(), &body)
}

fn sanitize_json(raw: &str) -> serde_json::Value {
    let (outcome, url, video_id) = match sanitize_outcome(Some(raw)) {
        Sanitized::Watch { url, video_id } => ("watch", Some(url), Some(video_id)),
        Sanitized::Other { url } => ("other", Some(url), None),
        Sanitized::Unrecognized => ("unrecognized", None, None),
    };
    serde_json::json!({
        "schema_version": 1,
        "kind": "sanitize",
        "input": raw,
        "outcome": outcome,
        "url": url,
        "video_id": video_id,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match cli.command {
        Commands::Resolve(args) => run_resolve(args).await?,
        Commands::Sanitize(args) => println!("{}", sanitize_json(&args.raw)),
        Commands::Fallback(args) => {
            let cfg = ResolverConfig::from_env();
            let url =
                build_fallback_with(&cfg.search_base, &cfg.default_query, &args.title, &args.artist);
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "fallback",
                "title": args.title,
                "artist": args.artist,
                "url": url,
            });
            println!("{v}");
        }
        Commands::Doctor(_) => {
            let cfg = ResolverConfig::from_env();
            let (ok, error) = match cfg.validate() {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            };
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "name": "songpipe",
                "version": env!("CARGO_PKG_VERSION"),
                "ok": ok,
                "error": error,
                "config": cfg,
            });
            println!("{v}");
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "songpipe",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output {
                OutputFormat::Text => println!("songpipe {}", env!("CARGO_PKG_VERSION")),
                OutputFormat::Json => println!("{v}"),
            }
        }
    }
    Ok(())
}
