use anyhow::Result;
use quiz_core::Clock;
use quiz_core::model::{
    DifficultyLevel, Material, MaterialDraft, MaterialId, MediaType, Question, QuestionType, Quiz,
    QuizDraft, QuizId, UserId,
};
use storage::repository::{MaterialRepository, QuizRepository, Storage};

const SAMPLE_TEXT: &str = "Photosynthesis is the process by which green plants use sunlight, \
water and carbon dioxide to make glucose. It takes place in the chloroplasts, which contain \
the green pigment chlorophyll. Oxygen is released as a by-product.";

/// Insert a processed material and a quiz built from it, without calling a model.
pub async fn seed(storage: &Storage, clock: Clock, user_id: UserId) -> Result<(Material, Quiz)> {
    let mut material = MaterialDraft {
        user_id,
        name: "sample-photosynthesis".into(),
        original_name: "photosynthesis.txt".into(),
        file_path: "sample/photosynthesis.txt".into(),
        file_size: SAMPLE_TEXT.len() as u64,
        media_type: MediaType::PlainText,
    }
    .validate(MaterialId::new(), clock.now())?;
    material.mark_processed(SAMPLE_TEXT.to_string());
    storage.materials.insert_material(&material).await?;

    let quiz = QuizDraft {
        user_id,
        material_id: Some(material.id()),
        title: "Photosynthesis basics".into(),
        description: Some("Sample quiz".into()),
        questions: sample_questions(),
        difficulty: DifficultyLevel::Beginner,
        time_limit_minutes: Some(30),
    }
    .validate(QuizId::new(), clock.now())?;
    storage.quizzes.insert_quiz(&quiz).await?;

    Ok((material, quiz))
}

fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            id: "q1".into(),
            kind: QuestionType::MultipleChoice,
            question: "Where does photosynthesis take place?".into(),
            options: Some(vec![
                "Chloroplasts".into(),
                "Mitochondria".into(),
                "Nucleus".into(),
                "Cell wall".into(),
            ]),
            correct_answer: "Chloroplasts".into(),
            explanation: Some("Chloroplasts contain chlorophyll.".into()),
            difficulty: Some("beginner".into()),
        },
        Question {
            id: "q2".into(),
            kind: QuestionType::TrueFalse,
            question: "Photosynthesis releases oxygen.".into(),
            options: None,
            correct_answer: "true".into(),
            explanation: None,
            difficulty: Some("beginner".into()),
        },
        Question {
            id: "q3".into(),
            kind: QuestionType::FillBlank,
            question: "The green pigment in plants is called ____.".into(),
            options: None,
            correct_answer: "chlorophyll".into(),
            explanation: None,
            difficulty: Some("beginner".into()),
        },
    ]
}
