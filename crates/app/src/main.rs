use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Parser;
use quiz_core::grading::SubmittedAnswer;
use quiz_core::model::{Material, MaterialStatus, format_file_size};
use serde::{Deserialize, Serialize};
use services::{
    AppServices, Clock, OpenAiClient, QuizRequest, Submission, SubmissionResult, Upload,
};
use storage::repository::Storage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod seed;

use cli::{Cli, Command};

/// Answers file: either a bare list or a full submission object.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswersFile {
    List(Vec<SubmittedAnswer>),
    Submission(Submission),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MaterialSummary<'a> {
    id: String,
    original_name: &'a str,
    mime_type: &'static str,
    status: MaterialStatus,
    size: String,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a Material> for MaterialSummary<'a> {
    fn from(m: &'a Material) -> Self {
        Self {
            id: m.id().to_string(),
            original_name: m.original_name(),
            mime_type: m.media_type().as_mime(),
            status: m.status(),
            size: format_file_size(m.file_size()),
            created_at: m.created_at(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitOutput<'a> {
    attempt_id: String,
    score: f64,
    correct_answers: u32,
    total_questions: u32,
    feedback: &'a [String],
}

impl<'a> From<&'a SubmissionResult> for SubmitOutput<'a> {
    fn from(r: &'a SubmissionResult) -> Self {
        Self {
            attempt_id: r.attempt.id().to_string(),
            score: r.attempt.score(),
            correct_answers: r.attempt.correct_answers(),
            total_questions: r.attempt.total_questions(),
            feedback: &r.feedback,
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var_os("RUST_LOG").is_some() && verbose == 0 {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn is_memory_url(db_url: &str) -> bool {
    db_url == "sqlite::memory:" || db_url.contains("mode=memory")
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim().to_string();
    if is_memory_url(&trimmed) || trimmed.starts_with("sqlite://") {
        return trimmed;
    }

    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if is_memory_url(db_url) {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let db_url = normalize_sqlite_url(cli.db);
    prepare_sqlite_file(&db_url)?;
    let user = cli.user;
    let clock = Clock::system();

    let completion = OpenAiClient::from_env()?;
    if !completion.enabled() {
        warn!("no QUIZ_AI_API_KEY or OPENAI_API_KEY set; quiz generation is disabled");
    }
    let app = AppServices::new_sqlite(&db_url, cli.uploads, clock, Arc::new(completion)).await?;

    match cli.command {
        Command::Upload { path, mime } => {
            let mut upload = Upload::from_path(path);
            if let Some(mime) = mime {
                upload = upload.with_mime_type(mime);
            }
            let material = app.materials().register(user, upload).await?;
            print_json(&MaterialSummary::from(&material))
        }
        Command::Materials => {
            let materials = app.materials().list(user).await?;
            let summaries: Vec<MaterialSummary<'_>> =
                materials.iter().map(MaterialSummary::from).collect();
            print_json(&summaries)
        }
        Command::DeleteMaterial { material } => {
            app.materials().delete(user, material).await?;
            println!("deleted material {material}");
            Ok(())
        }
        Command::Generate {
            material,
            count,
            types,
            difficulty,
            title,
            description,
        } => {
            let request = QuizRequest {
                material_id: material,
                question_count: count,
                question_types: types,
                difficulty,
                title,
                description,
            };
            let quiz = app.quizzes().generate(user, request).await?;
            print_json(&quiz)
        }
        Command::Quizzes => print_json(&app.quizzes().list(user).await?),
        Command::Show { quiz } => print_json(&app.quizzes().get(user, quiz).await?),
        Command::Publish { quiz } => print_json(&app.quizzes().publish(user, quiz).await?),
        Command::DeleteQuiz { quiz } => {
            app.quizzes().delete(user, quiz).await?;
            println!("deleted quiz {quiz}");
            Ok(())
        }
        Command::Submit {
            quiz,
            answers,
            time_spent,
        } => {
            let raw = std::fs::read_to_string(&answers)
                .with_context(|| format!("reading {}", answers.display()))?;
            let submission = match serde_json::from_str::<AnswersFile>(&raw)
                .with_context(|| format!("parsing {}", answers.display()))?
            {
                AnswersFile::List(answers) => Submission {
                    answers,
                    time_spent_secs: time_spent,
                },
                AnswersFile::Submission(mut s) => {
                    if time_spent > 0 {
                        s.time_spent_secs = time_spent;
                    }
                    s
                }
            };
            let result = app.attempts().submit(user, quiz, submission).await?;
            print_json(&SubmitOutput::from(&result))
        }
        Command::Results { quiz } => {
            let attempts = match quiz {
                Some(quiz) => app.attempts().list_for_quiz(user, quiz).await?,
                None => app.attempts().list_for_user(user).await?,
            };
            print_json(&attempts)
        }
        Command::Stats => print_json(&app.analytics().stats(user).await?),
        Command::Seed => {
            let storage = Storage::sqlite(&db_url).await?;
            let (material, quiz) = seed::seed(&storage, clock, user).await?;
            info!(material = %material.id(), quiz = %quiz.id(), "seeded sample data");
            print_json(&quiz)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        let shared = "sqlite:file:demo?mode=memory&cache=shared".to_string();
        assert_eq!(normalize_sqlite_url(shared.clone()), shared);
        assert!(prepare_sqlite_file(&shared).is_ok());
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/q.db".into()),
            "sqlite:///tmp/q.db"
        );
    }

    #[test]
    fn prepare_creates_parent_dirs_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("quiz.sqlite3");
        let url = format!("sqlite://{}", path.display());
        prepare_sqlite_file(&url).unwrap();
        assert!(path.exists());
        assert!(prepare_sqlite_file("postgres://nope").is_err());
    }

    #[test]
    fn answers_file_accepts_list_or_object() {
        let list: AnswersFile =
            serde_json::from_str(r#"[{"questionId":"q1","answer":"true"}]"#).unwrap();
        assert!(matches!(list, AnswersFile::List(a) if a.len() == 1));
        let object: AnswersFile = serde_json::from_str(
            r#"{"answers":[{"questionId":"q1","answer":"true"}],"timeSpent":12}"#,
        )
        .unwrap();
        assert!(matches!(object, AnswersFile::Submission(s) if s.time_spent_secs == 12));
    }
}
