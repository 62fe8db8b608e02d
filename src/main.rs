use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{execute, terminal};
use gomoku_duel::config::{AppConfig, DEFAULT_CONFIG_PATH};
use gomoku_duel::player::ai::Tier;
use gomoku_duel::selfplay::{run_selfplay, SelfPlayConfig, KIFU_DIR};
use gomoku_duel::ui::app::App;
use gomoku_duel::ui::{select_mode, MenuChoice};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gomoku-duel", version, about = "Five-in-a-row against the AI or over the LAN")]
struct Cli {
    /// JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Display name (overrides the config)
    #[arg(long)]
    name: Option<String>,

    #[arg(long, default_value = "gomoku.log")]
    log_file: PathBuf,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play against the built-in AI
    Single {
        #[arg(long)]
        tier: Option<Tier>,
    },
    /// Wait for a peer to join
    Host {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Join a hosted game
    Join {
        host: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Headless AI-vs-AI games, results printed as JSON
    Selfplay {
        #[arg(long, default_value_t = 10)]
        games: usize,
        #[arg(long, default_value = "medium")]
        black: Tier,
        #[arg(long, default_value = "medium")]
        white: Tier,
        #[arg(long)]
        seed: Option<u64>,
        /// Save each game's moves under selfplay_kifu/
        #[arg(long)]
        save_kifu: bool,
    },
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    // 画面を汚さないようにログはファイルへ
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let mut config = AppConfig::load_or_default(&cli.config);
    if let Some(name) = &cli.name {
        config.nickname = name.clone();
    }
    let config = AppConfig::init(config.normalized());
    info!(?config, "starting");
    if cli.save_config {
        config.save(&cli.config)?;
    }

    if let Some(Command::Selfplay {
        games,
        black,
        white,
        seed,
        save_kifu,
    }) = cli.command
    {
        let stats = run_selfplay(&SelfPlayConfig {
            num_games: games,
            black_tier: black,
            white_tier: white,
            seed,
            kifu_dir: save_kifu.then(|| PathBuf::from(KIFU_DIR)),
        })?;
        println!("{}", stats.to_json()?);
        return Ok(());
    }

    // ターミナル初期化
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen)?;

    let res = run(cli.command);

    // ターミナル復帰
    execute!(io::stdout(), terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    if let Err(e) = &res {
        error!("{:#}", e);
    }
    res
}

fn run(command: Option<Command>) -> anyhow::Result<()> {
    let config = AppConfig::get();
    let choice = match command {
        Some(Command::Single { tier }) => MenuChoice::Single(tier.unwrap_or(config.ai_tier)),
        Some(Command::Host { port }) => MenuChoice::Host(port.unwrap_or(config.default_port)),
        Some(Command::Join { host, port }) => MenuChoice::Join {
            host,
            port: port.unwrap_or(config.default_port),
        },
        Some(Command::Selfplay { .. }) => return Ok(()),
        None => select_mode(config.ai_tier, config.default_port)?,
    };

    let mut app = match choice {
        MenuChoice::Single(tier) => App::single(tier),
        MenuChoice::Host(port) => App::host(port)?,
        MenuChoice::Join { host, port } => {
            print!("Connecting to {}:{}...\r\n", host, port);
            App::join(&host, port)?
        }
        MenuChoice::Quit => return Ok(()),
    };
    app.run()
}
