use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::grading::SubmittedAnswer;
use quiz_core::model::{MaterialStatus, QuestionType, UserId};
use quiz_core::time::fixed_now;
use services::{
    AppServices, Clock, CompletionClient, CompletionError, GenerationError, QuizRequest,
    QuizServiceError, Submission, Upload,
};

/// Replies with queued strings, one per call.
struct ScriptedCompletion {
    replies: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(ToString::to_string).collect()),
        })
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn generate_completion(
        &self,
        _system: &str,
        _user: &str,
        _temperature: f32,
    ) -> Result<String, CompletionError> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or(CompletionError::EmptyResponse)
    }
}

const QUIZ_REPLY: &str = r#"```json
{
  "questions": [
    {
      "id": "q1",
      "type": "true_false",
      "question": "Photosynthesis produces oxygen.",
      "correctAnswer": "true"
    },
    {
      "id": "q2",
      "type": "fill_blank",
      "question": "Photosynthesis happens in the ____.",
      "correctAnswer": "chloroplast",
      "explanation": "Chloroplasts hold chlorophyll."
    },
    {
      "id": "q3",
      "type": "multiple_choice",
      "question": "Which gas do plants absorb?",
      "options": ["Oxygen", "Carbon dioxide", "Nitrogen"],
      "correctAnswer": "Helium"
    }
  ]
}
```"#;

async fn services(db: &str, dir: &Path, replies: &[&str]) -> AppServices {
    AppServices::new_sqlite(
        &format!("sqlite:file:{db}?mode=memory&cache=shared"),
        dir.join("uploads"),
        Clock::fixed(fixed_now()),
        ScriptedCompletion::new(replies),
    )
    .await
    .expect("services")
}

fn write_notes(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        "Photosynthesis happens in the chloroplast.\nIt produces oxygen.\n",
    )
    .unwrap();
    path
}

#[tokio::test]
async fn upload_generate_submit_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let app = services("memdb_quiz_flow", dir.path(), &[QUIZ_REPLY]).await;
    let me = UserId::new();

    let material = app
        .materials()
        .register(me, Upload::from_path(write_notes(dir.path(), "notes.txt")))
        .await
        .expect("register");
    assert_eq!(material.status(), MaterialStatus::Processed);

    let mut request = QuizRequest::for_material(material.id());
    request.question_types = vec![QuestionType::TrueFalse, QuestionType::FillBlank];
    request.title = Some("Plants".into());
    let quiz = app
        .quizzes()
        .generate(me, request)
        .await
        .expect("generate");
    // The multiple-choice record with an answer outside its options is dropped.
    assert_eq!(quiz.questions().len(), 2);
    assert_eq!(quiz.title(), "Plants");
    assert_eq!(quiz.time_limit_minutes(), Some(30));
    assert_eq!(quiz.material_id(), Some(material.id()));

    let reversed = Submission {
        answers: vec![
            SubmittedAnswer::new("q2", "chloroplast"),
            SubmittedAnswer::new("q1", "false"),
        ],
        time_spent_secs: 120,
    };
    let result = app
        .attempts()
        .submit(me, quiz.id(), reversed)
        .await
        .expect("submit");
    assert_eq!(result.attempt.score(), 50.0);
    assert_eq!(
        result.feedback,
        vec![
            "Question 1: Incorrect. The correct answer is \"true\".".to_string(),
            "Question 2: Correct! Chloroplasts hold chlorophyll.".to_string(),
        ]
    );

    let stats = app.analytics().stats(me).await.expect("stats");
    assert_eq!(stats.total_materials, 1);
    assert_eq!(stats.total_quizzes, 1);
    assert_eq!(stats.total_attempts, 1);
    assert_eq!(stats.avg_score, 50.0);

    app.quizzes().publish(me, quiz.id()).await.expect("publish");
    let stranger = UserId::new();
    let seen = app.quizzes().get(stranger, quiz.id()).await.expect("published");
    assert!(seen.is_published());

    app.quizzes().delete(me, quiz.id()).await.expect("delete");
    assert!(app.attempts().list_for_user(me).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_reply_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app = services(
        "memdb_quiz_malformed",
        dir.path(),
        &["I could not produce JSON for this material."],
    )
    .await;
    let me = UserId::new();
    let material = app
        .materials()
        .register(me, Upload::from_path(write_notes(dir.path(), "notes.txt")))
        .await
        .unwrap();

    let err = app
        .quizzes()
        .generate(me, QuizRequest::for_material(material.id()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QuizServiceError::Generation(GenerationError::Malformed(_))
    ));
    assert!(app.quizzes().list(me).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_material_cannot_generate() {
    let dir = tempfile::tempdir().unwrap();
    let app = services("memdb_quiz_unprocessed", dir.path(), &[QUIZ_REPLY]).await;
    let me = UserId::new();
    let path = dir.path().join("slides.pdf");
    std::fs::write(&path, b"%PDF-1.7").unwrap();
    let material = app
        .materials()
        .register(me, Upload::from_path(path))
        .await
        .unwrap();
    assert_eq!(material.status(), MaterialStatus::Failed);

    let err = app
        .quizzes()
        .generate(me, QuizRequest::for_material(material.id()))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::NotProcessed));

    let err = app
        .quizzes()
        .generate(UserId::new(), QuizRequest::for_material(material.id()))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::NotFound));
}
