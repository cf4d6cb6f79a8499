use clap::{Parser, Subcommand};
use sitefold::partials::PartialRegistry;
use sitefold::{check, config, generate, output, scan, serve};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Shared flags for commands that write pages.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the output cache and rewrite every page
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sitefold")]
#[command(about = "Static site generator that folds shared partials into pages")]
#[command(long_about = "\
Static site generator that folds shared partials into pages

Pages are HTML or Markdown files with TOML front matter. Shared fragments are
pulled in with include markers, resolved once at build time.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── partials/                    # User partials, named by file stem
  │   └── related.html             # → {% include related %}
  ├── pages/
  │   ├── index.html               # → dist/index.html
  │   ├── about.md                 # → dist/about.html
  │   └── blog/2018/01/16/post/
  │       └── index.html           # → dist/blog/2018/01/16/post/index.html
  └── static/                      # Copied to the output root as-is

Page front matter:

  +++
  title = \"How to Support Multiple OSes with One Mac\"
  date = \"16 Jan 2018\"
  section = \"blog\"               # Highlighted in the navbar
  layout = \"article\"             # or \"raw\" for full-document pages
  +++

Built-in partials: head, navbar SECTION, footer.

Run 'sitefold gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".sitefold-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan content directory into a manifest
    Scan,
    /// Produce the HTML site from an existing manifest
    Generate(CacheArgs),
    /// Run the full pipeline: scan → generate
    Build(CacheArgs),
    /// Validate pages and partial references without building
    Check,
    /// Serve the output directory over HTTP
    Serve {
        /// Port to listen on (the next free port is used if taken)
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan => {
            let manifest = scan::scan(&cli.source)?;
            scan::save_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Generate(cache_args) => {
            let manifest_path = cli.temp_dir.join(scan::MANIFEST_FILENAME);
            let manifest = scan::load_manifest(&manifest_path)?;
            init_thread_pool(&manifest.config.build);
            let report = generate::generate_manifest(
                &manifest,
                &cli.source,
                &cli.output,
                !cache_args.no_cache,
            )?;
            output::print_generate_output(&report);
            exit_on_failures(report.has_failures() || manifest.invalid_pages().next().is_some());
        }
        Command::Build(cache_args) => {
            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            scan::save_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            init_thread_pool(&manifest.config.build);
            let report = generate::generate_manifest(
                &manifest,
                &cli.source,
                &cli.output,
                !cache_args.no_cache,
            )?;
            output::print_generate_output(&report);

            let failed = report.has_failures() || manifest.invalid_pages().next().is_some();
            if failed {
                println!("==> Build finished with errors: {}", cli.output.display());
            } else {
                println!("==> Build complete: {}", cli.output.display());
            }
            exit_on_failures(failed);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            let registry = load_registry(&cli.source, &manifest.config)?;
            let report = check::check(&manifest, &registry);
            output::print_check_output(&report);
            if report.is_ok() {
                println!("==> Content is valid");
            }
            exit_on_failures(!report.is_ok());
        }
        Command::Serve { port, bind } => {
            serve::serve(&cli.output, bind, port)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on build config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(build: &config::BuildConfig) {
    let threads = config::effective_threads(build);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn load_registry(
    source: &Path,
    config: &config::SiteConfig,
) -> Result<PartialRegistry, Box<dyn std::error::Error>> {
    Ok(PartialRegistry::load(
        &source.join(&config.build.partials_dir),
        config,
    )?)
}

fn exit_on_failures(failed: bool) {
    if failed {
        std::process::exit(1);
    }
}
