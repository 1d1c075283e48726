// Offline front-end for the prompt builder and the style quiz
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use style_engine::{build_prompt, FormChoices, QuizCatalog, QuizSubmission, RoomEditRequest};
use tracing::info;

#[derive(Parser)]
#[command(name = "style-cli")]
#[command(about = "Room prompt builder and style quiz", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the prompt that would be sent to the image model
    Prompt {
        /// Room type (e.g. "Bedroom")
        #[arg(short, long)]
        room: Option<String>,

        /// Element to change; repeat for several
        #[arg(short, long = "change")]
        changes: Vec<String>,

        /// Design style (e.g. "Modern")
        #[arg(short, long)]
        style: Option<String>,

        /// Preferred color as #RRGGBB
        #[arg(long)]
        color: Option<String>,

        /// Wood finish (e.g. "Walnut")
        #[arg(short, long)]
        wood: Option<String>,
    },

    /// List the quiz questions
    Questions {
        /// Question table to use instead of the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Score a quiz from a JSON array of answers (null for unanswered)
    Quiz {
        /// File holding the answers
        answers: PathBuf,

        /// Question table to use instead of the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn load_catalog(path: Option<&PathBuf>) -> Result<QuizCatalog> {
    let catalog = match path {
        Some(path) => QuizCatalog::from_path(path)?,
        None => QuizCatalog::builtin()?,
    };
    Ok(catalog)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prompt {
            room,
            changes,
            style,
            color,
            wood,
        } => {
            let defaults = FormChoices::default().default_request();
            let request = RoomEditRequest {
                room_type: room.unwrap_or(defaults.room_type),
                change_options: if changes.is_empty() { defaults.change_options } else { changes },
                aesthetic: style.unwrap_or(defaults.aesthetic),
                color: color.unwrap_or_default(),
                wood_type: wood.unwrap_or(defaults.wood_type),
            };

            let prompt = build_prompt(&request)?;
            println!("{}", prompt);
        }
        Commands::Questions { catalog } => {
            let quiz = load_catalog(catalog.as_ref())?;
            for (i, question) in quiz.questions().iter().enumerate() {
                println!("{}. {}", i + 1, question.question);
                for option in &question.options {
                    println!("   - {}", option);
                }
            }
        }
        Commands::Quiz { answers, catalog } => {
            let quiz = load_catalog(catalog.as_ref())?;
            let raw = std::fs::read_to_string(&answers)
                .with_context(|| format!("Failed to read {}", answers.display()))?;
            let answers: Vec<Option<String>> =
                serde_json::from_str(&raw).context("Answers must be a JSON array of strings or nulls")?;
            info!("Scoring {} answers", answers.len());

            match quiz.evaluate(&QuizSubmission::new(answers)) {
                Ok(outcome) => {
                    println!("{}", outcome.title());
                    println!("{}", outcome.message());
                }
                Err(e) => {
                    println!("{}", e.title());
                    println!("{}", e.user_message());
                }
            }
        }
    }

    Ok(())
}
