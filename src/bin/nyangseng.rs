use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nyangseng", version)]
#[command(about = "Past-life cat personality quiz", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a catalog and check its invariants.
    Validate(CatalogArgs),
    /// Play the quiz non-interactively with a list of option ids.
    Play(PlayArgs),
    /// Match a raw tag profile against the catalog.
    Resolve(ResolveArgs),
    /// List every result except the fallback.
    Gallery(CatalogArgs),
    /// Render a result card as a PNG.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct CatalogArgs {
    /// Catalog JSON.
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Parser, Debug)]
struct MatchArgs {
    /// Override the catalog's match threshold.
    #[arg(long)]
    threshold: Option<usize>,

    /// How repeated tags are scored.
    #[arg(long, value_enum, default_value_t = ScoringChoice::Multiset)]
    scoring: ScoringChoice,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Option ids in question order, e.g. `1a,2c,3b`.
    #[arg(long, value_delimiter = ',', required = true)]
    answers: Vec<String>,

    #[command(flatten)]
    matching: MatchArgs,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Profile tags, e.g. `lazy,proud,proud`.
    #[arg(long, value_delimiter = ',', required = true)]
    tags: Vec<String>,

    #[command(flatten)]
    matching: MatchArgs,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Result id to render.
    #[arg(long)]
    result: String,

    /// Asset root that catalog image references resolve against. Defaults to the catalog's dir.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// TTF/OTF font for title, description and footer. Without it text is drawn as boxes.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Layout parameter overrides (JSON).
    #[arg(long)]
    params: Option<PathBuf>,

    /// Footer logo reference, relative to the asset root.
    #[arg(long)]
    logo: Option<String>,

    /// Footer brand text.
    #[arg(long)]
    brand_text: Option<String>,

    /// Directory the PNG is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScoringChoice {
    Multiset,
    Set,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nyangseng=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Play(args) => cmd_play(args),
        Command::Resolve(args) => cmd_resolve(args),
        Command::Gallery(args) => cmd_gallery(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn load_catalog(args: &CatalogArgs) -> anyhow::Result<nyangseng::Catalog> {
    nyangseng::Catalog::from_path(&args.catalog)
        .with_context(|| format!("load catalog '{}'", args.catalog.display()))
}

fn match_policy(catalog: &nyangseng::Catalog, args: &MatchArgs) -> nyangseng::MatchPolicy {
    let mut policy = nyangseng::MatchPolicy::for_catalog(catalog);
    if let Some(t) = args.threshold {
        policy.threshold = t;
    }
    policy.scoring = match args.scoring {
        ScoringChoice::Multiset => nyangseng::ScoreMode::Multiset,
        ScoringChoice::Set => nyangseng::ScoreMode::Set,
    };
    policy
}

fn cmd_validate(args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args)?;
    println!(
        "ok: {} questions, {} results",
        catalog.question_count(),
        catalog.candidates().count()
    );
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let policy = match_policy(&catalog, &args.matching);
    let mut shell = nyangseng::QuizShell::new(
        nyangseng::QuizEngine::new(&catalog),
        policy,
        nyangseng::MemoryFlags::default(),
    );

    shell.start_quiz();
    for answer in &args.answers {
        match shell.submit_option(answer)? {
            nyangseng::Step::Continue(next) => tracing::debug!(%answer, next, "answered"),
            nyangseng::Step::Complete => tracing::debug!(%answer, "quiz complete"),
        }
    }

    let result = shell.resolve()?;
    println!("{}\t{}", result.id, result.title);
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let policy = match_policy(&catalog, &args.matching);

    for ranked in nyangseng::rank(&args.tags, &catalog, &policy) {
        eprintln!("  {:>3}  {}", ranked.score, ranked.result.id);
    }
    let result = nyangseng::resolve(&args.tags, &catalog, &policy);
    println!("{}\t{}", result.id, result.title);
    Ok(())
}

fn cmd_gallery(args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args)?;
    for card in catalog.gallery() {
        println!("{}\t{}\t{}", card.id, card.title, card.image);
    }
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let result = catalog
        .result(&args.result)
        .with_context(|| format!("unknown result id '{}'", args.result))?;

    let params = match &args.params {
        Some(path) => read_params_json(path)?,
        None => nyangseng::LayoutParams::default(),
    };
    let mut branding = nyangseng::Branding::default();
    if let Some(logo) = args.logo {
        branding.logo = logo;
    }
    if let Some(text) = args.brand_text {
        branding.brand_text = text;
    }

    let assets_root = match args.assets {
        Some(root) => root,
        None => args
            .catalog
            .catalog
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let loader = nyangseng::DirAssetLoader::new(assets_root);

    let image = match &args.font {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
            let typesetter = nyangseng::ParleyTypesetter::from_font_bytes(bytes)?;
            nyangseng::Compositor::new(params, branding, typesetter)?.compose(result, &loader)?
        }
        None => {
            tracing::warn!("no --font given; text is drawn as placeholder boxes");
            let typesetter = nyangseng::MonospaceTypesetter::default();
            nyangseng::Compositor::new(params, branding, typesetter)?.compose(result, &loader)?
        }
    };

    let out = args.out_dir.join(&image.file_name);
    let mut sink = nyangseng::DirDownloadSink::new(&args.out_dir);
    nyangseng::download(image, &mut sink)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn read_params_json(path: &Path) -> anyhow::Result<nyangseng::LayoutParams> {
    let f = File::open(path).with_context(|| format!("open layout params '{}'", path.display()))?;
    let r = BufReader::new(f);
    let params: nyangseng::LayoutParams =
        serde_json::from_reader(r).with_context(|| "parse layout params JSON")?;
    Ok(params)
}
