//! Command-line definitions for `quizgen`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quiz_core::model::{DifficultyLevel, MaterialId, QuestionType, QuizId, UserId};

/// Stable owner used when neither `--user` nor `QUIZ_USER_ID` is given.
pub const DEFAULT_USER_ID: &str = "00000000-0000-4000-8000-000000000001";

#[derive(Parser, Debug)]
#[command(name = "quizgen")]
#[command(author, version, about = "Generate quizzes from study material and grade attempts")]
#[command(long_about = r#"
quizgen turns uploaded study material into quizzes with a language model
and grades submitted answers.

The model endpoint is configured through the environment:
  QUIZ_AI_API_KEY (or OPENAI_API_KEY), QUIZ_AI_BASE_URL, QUIZ_AI_MODEL,
  QUIZ_AI_TIMEOUT_SECS

Example:
  quizgen upload notes.txt
  quizgen generate --material <id> --count 8 --types multiple_choice,true_false
  quizgen submit <quiz> --answers answers.json --time-spent 300
"#)]
pub struct Cli {
    /// SQLite database url or file path
    #[arg(long, env = "QUIZ_DB_URL", default_value = "sqlite://quizgen.sqlite3")]
    pub db: String,

    /// Directory uploaded files are copied into
    #[arg(long, env = "QUIZ_UPLOAD_DIR", default_value = "uploads")]
    pub uploads: PathBuf,

    /// Acting user
    #[arg(long, env = "QUIZ_USER_ID", default_value = DEFAULT_USER_ID)]
    pub user: UserId,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a document and extract its text
    Upload {
        path: PathBuf,
        /// Declared MIME type; guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
    },
    /// List your materials
    Materials,
    /// Delete a material; quizzes generated from it are kept
    DeleteMaterial { material: MaterialId },
    /// Generate a quiz from a processed material
    Generate {
        #[arg(long)]
        material: MaterialId,
        /// Number of questions (5 to 50)
        #[arg(long)]
        count: Option<u32>,
        /// Comma-separated: multiple_choice, true_false, fill_blank
        #[arg(long, value_delimiter = ',')]
        types: Vec<QuestionType>,
        /// beginner, intermediate, advanced or mixed
        #[arg(long)]
        difficulty: Option<DifficultyLevel>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List your quizzes
    Quizzes,
    /// Print a quiz with its questions
    Show { quiz: QuizId },
    /// Make a quiz visible to other users
    Publish { quiz: QuizId },
    /// Delete a quiz and its attempts
    DeleteQuiz { quiz: QuizId },
    /// Grade answers read from a JSON file of `{"questionId", "answer"}` records
    Submit {
        quiz: QuizId,
        #[arg(long, value_name = "PATH")]
        answers: PathBuf,
        /// Seconds spent on the quiz
        #[arg(long, default_value_t = 0)]
        time_spent: u32,
    },
    /// List your attempts, or every attempt on one of your quizzes
    Results {
        #[arg(long)]
        quiz: Option<QuizId>,
    },
    /// Show totals and average score
    Stats,
    /// Insert a processed sample material and quiz for offline use
    Seed,
}
