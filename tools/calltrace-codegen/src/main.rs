use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use calltrace_gen::{Generator, RustEmitter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod summary;

use summary::Summary;

#[derive(Parser, Debug)]
#[command(
    name = "calltrace-codegen",
    about = "Generate Rust tracing shims for a graphics API (d3d9, d3d11, d3d11_1, egl)."
)]
struct Args {
    /// API to generate shims for
    #[arg(required_unless_present = "list")]
    api: Option<String>,

    /// Write the generated source here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also write a JSON summary of every generated shim
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Print the known API names and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    list: bool,

    /// Allow overwriting existing outputs
    #[arg(long, action = clap::ArgAction::SetTrue)]
    force: bool,

    /// Log filter (tracing-subscriber EnvFilter syntax)
    #[arg(long, env = "CALLTRACE_LOG", default_value = "warn")]
    log: String,
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn write_output(path: &Path, contents: &[u8], force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote");
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.list {
        let mut stdout = io::stdout().lock();
        for name in calltrace_specs::APIS {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }
    let Some(name) = args.api.as_deref() else {
        bail!("no API given");
    };

    let binding =
        calltrace_specs::load(name).with_context(|| format!("load API tables for `{name}`"))?;
    let generated = Generator::new(&binding.api, &binding.hooks)
        .generate()
        .with_context(|| format!("generate shims for `{name}`"))?;
    tracing::info!(
        api = name,
        functions = generated.functions.len(),
        interfaces = generated.interfaces.len(),
        shims = generated.shim_count(),
        "generated"
    );

    let source = RustEmitter::new(&generated).emit();
    match &args.output {
        Some(path) => write_output(path, source.as_bytes(), args.force)?,
        None => io::stdout()
            .lock()
            .write_all(source.as_bytes())
            .context("write generated source to stdout")?,
    }

    if let Some(path) = &args.summary {
        let mut json = serde_json::to_vec_pretty(&Summary::new(&generated))
            .context("serialize shim summary")?;
        json.push(b'\n');
        write_output(path, &json, args.force)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log);
    run(args)
}
