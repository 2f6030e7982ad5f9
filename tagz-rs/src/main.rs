use std::io::BufRead;

use tagz::cli::{self, ConfigFile};
use tagz::config::Config;
use tagz::context::Context;
use tagz::script::Engine;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("tagz: {e}");
            eprintln!("Usage: tagz [-f[<file>]] [-D<name>=<value>]... [-m<depth>] [-d] [<script>]");
            std::process::exit(1);
        }
    };

    init_logging(args.debug);

    // ── Load config ───────────────────────────────────────────────────────────
    let path = match args.config {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(path) => Some(path),
        ConfigFile::Search => cli::find_user_config(),
    };
    let mut config = Config::new();
    if let Some(path) = path {
        match Config::load_file(&path) {
            Ok((loaded, errors)) => {
                for e in errors {
                    eprintln!("tagz: warning: {}: {e}", path.display());
                }
                config = loaded;
            }
            Err(e) => eprintln!("tagz: warning: {}: {e}", path.display()),
        }
    }

    // ── Build engine and context ─────────────────────────────────────────────
    let mut options = config.options;
    if let Some(depth) = args.max_depth {
        options.max_depth = depth;
    }
    let engine = Engine::new().with_options(options);
    let mut ctx: Context = config.vars;
    ctx.extend(args.defines);
    tracing::debug!(vars = ctx.len(), max_depth = options.max_depth, "engine ready");

    // ── Evaluate ──────────────────────────────────────────────────────────────
    if let Some(script) = args.script {
        match engine.evaluate(&script, &mut ctx) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("tagz: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    // Batch mode: one script per line, sharing one context.
    let mut failed = false;
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("tagz: {e}");
                std::process::exit(1);
            }
        };
        match engine.evaluate(&line, &mut ctx) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("tagz: {e}");
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `-d`.
fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
