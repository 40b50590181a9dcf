use adaptive_opponent::{DifficultyConfig, GameSession, shakmaty::Color};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{
    env,
    io::{self, BufRead, Write},
};

#[derive(Parser, Debug)]
#[command(name = "observe")]
#[command(about = "Play against, or watch, an opponent that adapts to your strength")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Side to play; asked interactively when omitted
    #[arg(short, long, value_enum)]
    side: Option<Side>,

    /// Engine processes evaluating candidate moves at once
    #[arg(short, long, default_value_t = 4)]
    workers: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Side {
    Observe,
    White,
    Black,
    Random,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every evaluation and the chosen target
    env_logger::init();
    let args = Args::parse();

    // 1. Load configuration; the engine path can come from the environment
    let mut config = match &args.config {
        Some(path) => DifficultyConfig::from_file(path)?,
        None => DifficultyConfig::default(),
    };
    if let Ok(path) = env::var("STOCKFISH_PATH") {
        config.engine.path = path;
    }

    // 2. Choose a side
    let side = match args.side {
        Some(side) => side,
        None => ask_side()?,
    };
    let mut rng = StdRng::from_entropy();
    let human = match side {
        Side::Observe => None,
        Side::White => Some(Color::White),
        Side::Black => Some(Color::Black),
        Side::Random => {
            let color = if rng.gen_bool(0.5) { Color::White } else { Color::Black };
            println!("You play {color:?}");
            Some(color)
        }
    };

    let engine = config.engine.clone();
    let mut game = GameSession::new(engine, config, rng).with_workers(args.workers);
    if let Some(color) = human {
        game = game.with_human(color);
    }

    // 3. Play until the game ends
    let stdin = io::stdin();
    while !game.is_game_over() {
        if game.is_human_turn() {
            print!("Your move: ");
            io::stdout().flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            match game.play_human(&line) {
                Ok(turn) => println!(
                    "Accuracy {}  skill {}  confidence {}",
                    turn.accuracy, turn.skill.value, turn.skill.confidence
                ),
                Err(e) => println!("{e}. Try again."),
            }
        } else {
            let reply = game.play_opponent()?;
            println!("Move\t\tScore");
            println!("---------------------");
            for (san, score) in &reply.candidates {
                println!("{:<12}\t{score:+.2}", san.to_string());
            }
            println!("Opponent played {} ({:+.2})\n", reply.san, reply.score);
        }
    }

    println!("Game over. Final skill estimate: {}", game.skill().value);
    Ok(())
}

fn ask_side() -> Result<Side, io::Error> {
    loop {
        print!("(O)bserve, or play (W)hite, (B)lack or (R)andom: ");
        io::stdout().flush()?;
        let mut choice = String::new();
        io::stdin().lock().read_line(&mut choice)?;
        match choice.trim().to_lowercase().as_str() {
            "o" => return Ok(Side::Observe),
            "w" => return Ok(Side::White),
            "b" => return Ok(Side::Black),
            "r" => return Ok(Side::Random),
            _ => println!("Please enter O, W, B or R."),
        }
    }
}
