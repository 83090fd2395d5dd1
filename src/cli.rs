//! Terminal front end
//!
//! `llmchess play` runs a game on stdin/stdout, against the language model or
//! between two people. `llmchess health` probes the configured endpoint.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use llmchess::ai::health::{health_url, probe, Health};
use llmchess::ai::{AcquireError, Difficulty, MoveAcquirer, MoveSource};
use llmchess::core::AiConfig;
use llmchess::game::{GameError, GameMode, GameSession};
use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "llmchess")]
#[command(about = "Play chess against a language model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal (default)
    Play(PlayArgs),
    /// Check that the configured inference endpoint answers
    Health,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PlayArgs {
    /// Opponent: the language model or a friend at the same keyboard
    #[arg(long, value_enum, default_value_t = ModeArg::Ai)]
    pub mode: ModeArg,

    /// Your color when playing the AI
    #[arg(long, value_enum, default_value_t = ColorArg::White)]
    pub color: ColorArg,

    /// AI persona: easy, medium or hard
    #[arg(long, default_value_t = Difficulty::Easy)]
    pub difficulty: Difficulty,

    /// Start from this position instead of the initial one
    #[arg(long)]
    pub fen: Option<String>,

    /// Skip the startup reachability probe
    #[arg(long)]
    pub no_probe: bool,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            mode: ModeArg::Ai,
            color: ColorArg::White,
            difficulty: Difficulty::Easy,
            fen: None,
            no_probe: false,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Ai,
    Friend,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorArg {
    White,
    Black,
}

impl From<ColorArg> for Color {
    fn from(color: ColorArg) -> Self {
        match color {
            ColorArg::White => Color::White,
            ColorArg::Black => Color::Black,
        }
    }
}

const HELP: &str = "Enter a move in SAN (Nf3, exd5, O-O, e8=Q) or squares (e2e4, e7e8q).
Commands: moves, board, pgn, new, quit";

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Play(PlayArgs::default())) {
        Command::Play(args) => play(args).await,
        Command::Health => health().await,
    }
}

async fn health() -> Result<()> {
    let config = AiConfig::from_env().context("invalid AI configuration")?;
    let url = health_url(&config.endpoint, config.provider);
    let http = reqwest::Client::new();
    match probe(&http, &url, config.api_key.as_deref()).await {
        Health::Reachable => {
            println!("{} is reachable ({})", config.provider, url);
            Ok(())
        }
        Health::Unhealthy(status) => bail!("{url} answered HTTP {status}"),
        Health::Unreachable(reason) => bail!("{url} is unreachable: {reason}"),
    }
}

/// What the input loop is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Playing,
    /// Game over, or the AI failed for good: only `new` and `quit` remain
    Halted,
}

async fn play(args: PlayArgs) -> Result<()> {
    let mode = match args.mode {
        ModeArg::Friend => GameMode::Friend,
        ModeArg::Ai => GameMode::VsAi {
            ai_color: !Color::from(args.color),
            difficulty: args.difficulty,
        },
    };

    let acquirer = match mode {
        GameMode::VsAi { .. } => {
            let config = AiConfig::from_env().context("invalid AI configuration")?;
            if !args.no_probe {
                let url = health_url(&config.endpoint, config.provider);
                match probe(&reqwest::Client::new(), &url, config.api_key.as_deref()).await {
                    Health::Reachable => info!("[AI] {} is reachable", url),
                    other => warn!("[AI] {} probe: {:?}; trying anyway", url, other),
                }
            }
            Some(MoveAcquirer::from_config(&config)?)
        }
        GameMode::Friend => None,
    };

    let new_session = || -> Result<GameSession> {
        Ok(match &args.fen {
            Some(fen) => GameSession::from_fen(mode, fen)?,
            None => GameSession::new(mode),
        })
    };
    let flipped = matches!(mode, GameMode::VsAi { ai_color: Color::White, .. });

    let mut session = new_session()?;
    let mut phase = Phase::Playing;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}\n");
    println!("{}\n", session.board_diagram(flipped));

    loop {
        if phase == Phase::Playing {
            if let Some(outcome) = session.outcome() {
                println!("\n{}\n{}", outcome.title(), outcome.message());
                println!("{}", session.pgn());
                phase = Phase::Halted;
            }
        }

        if phase == Phase::Playing && session.is_ai_turn() {
            if let (Some(acquirer), GameMode::VsAi { difficulty, .. }) = (&acquirer, mode) {
                phase = ai_turn(&mut session, acquirer, difficulty, flipped).await;
                continue;
            }
        }

        let prompt = match phase {
            Phase::Playing => format!("{} > ", session.status()),
            Phase::Halted => "new or quit > ".to_string(),
        };
        let Some(line) = read_line(&mut lines, &prompt).await? else {
            return Ok(());
        };
        let input = line.trim();

        match input {
            "" => {}
            "quit" | "exit" | "q" => return Ok(()),
            "new" => {
                session = new_session()?;
                phase = Phase::Playing;
                println!("{}\n", session.board_diagram(flipped));
            }
            "board" => println!("{}", session.board_diagram(flipped)),
            "pgn" => println!("{}", session.pgn()),
            "help" => println!("{HELP}"),
            "moves" if phase == Phase::Playing => println!("{}", session.legal_moves().join(" ")),
            _ if phase == Phase::Halted => println!("Type new or quit."),
            _ => match play_input(&mut session, input) {
                Ok(san) => {
                    println!("{san}");
                    println!("{}\n", session.board_diagram(flipped));
                }
                Err(e) => println!("{e}"),
            },
        }
    }
}

/// SAN first, then coordinate notation
fn play_input(session: &mut GameSession, input: &str) -> Result<String, GameError> {
    match session.play_san(input) {
        Ok(played) => Ok(played.san),
        Err(GameError::IllegalMove { .. }) => session.play_coordinates(input).map(|p| p.san),
        Err(e) => Err(e),
    }
}

async fn ai_turn(
    session: &mut GameSession,
    acquirer: &MoveAcquirer,
    difficulty: Difficulty,
    flipped: bool,
) -> Phase {
    println!("AI is thinking...");
    let snapshot = session.snapshot();

    match acquirer.acquire(&snapshot, difficulty).await {
        Ok(acquired) => match session.apply_acquired(&acquired) {
            Ok(played) => {
                if acquired.source == MoveSource::Fallback {
                    println!("AI plays {} (its own answer was illegal)", played.san);
                } else {
                    println!("AI plays {}", played.san);
                }
                println!("{}\n", session.board_diagram(flipped));
                Phase::Playing
            }
            Err(e) => {
                warn!("[GAME] Discarding AI move: {}", e);
                println!("\n=== AI Error ===\n{e}\n");
                Phase::Halted
            }
        },
        Err(AcquireError::NoLegalMoves) => Phase::Halted,
        Err(e) => {
            println!("\n=== AI Error ===\n{e}\n");
            println!("The game cannot continue. Start a new game or quit.");
            Phase::Halted
        }
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    use std::io::Write;
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}
