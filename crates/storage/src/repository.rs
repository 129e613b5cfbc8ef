use async_trait::async_trait;
use quiz_core::model::{Attempt, AttemptId, Material, MaterialId, Quiz, QuizId, UserId};
use std::cmp::Reverse;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for uploaded materials.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Persist a new material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists.
    async fn insert_material(&self, material: &Material) -> Result<(), StorageError>;

    /// Overwrite status and extracted text of an existing material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the material is missing.
    async fn update_material(&self, material: &Material) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_material(&self, id: MaterialId) -> Result<Option<Material>, StorageError>;

    /// Materials owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_materials(&self, user_id: UserId) -> Result<Vec<Material>, StorageError>;

    /// Delete a material; quizzes generated from it keep existing without a source.
    ///
    /// Returns `Ok(false)` if nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_material(&self, id: MaterialId) -> Result<bool, StorageError>;
}

/// Repository contract for generated quizzes.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a new quiz with its full question list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists.
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// Quizzes owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quizzes(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError>;

    /// Mark a quiz as published. Publishing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is missing.
    async fn publish_quiz(&self, id: QuizId) -> Result<(), StorageError>;

    /// Delete a quiz together with its attempts.
    ///
    /// Returns `Ok(false)` if nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_quiz(&self, id: QuizId) -> Result<bool, StorageError>;
}

/// Repository contract for graded attempts. Attempts are append-only.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist,
    /// or `StorageError::Conflict` if the id already exists.
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_attempt(&self, id: AttemptId) -> Result<Option<Attempt>, StorageError>;

    /// Attempts by `user_id`, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts_for_user(&self, user_id: UserId)
    -> Result<Vec<Attempt>, StorageError>;

    /// Attempts against `quiz_id`, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts_for_quiz(&self, quiz_id: QuizId)
    -> Result<Vec<Attempt>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Rows are kept in insertion order; listings are newest first, with ties
/// broken by most recent insertion.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    materials: Arc<Mutex<Vec<Material>>>,
    quizzes: Arc<Mutex<Vec<Quiz>>>,
    attempts: Arc<Mutex<Vec<Attempt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn newest_first<T: Clone, K: Ord>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().filter(|r| keep(*r)).cloned().collect();
    out.sort_by_key(|r| Reverse(key(r)));
    out
}

#[async_trait]
impl MaterialRepository for InMemoryRepository {
    async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
        let mut guard = self.materials.lock().map_err(poisoned)?;
        if guard.iter().any(|m| m.id() == material.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(material.clone());
        Ok(())
    }

    async fn update_material(&self, material: &Material) -> Result<(), StorageError> {
        let mut guard = self.materials.lock().map_err(poisoned)?;
        let slot = guard
            .iter_mut()
            .find(|m| m.id() == material.id())
            .ok_or(StorageError::NotFound)?;
        *slot = material.clone();
        Ok(())
    }

    async fn get_material(&self, id: MaterialId) -> Result<Option<Material>, StorageError> {
        let guard = self.materials.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|m| m.id() == id).cloned())
    }

    async fn list_materials(&self, user_id: UserId) -> Result<Vec<Material>, StorageError> {
        let guard = self.materials.lock().map_err(poisoned)?;
        Ok(newest_first(&guard, |m| m.user_id() == user_id, Material::created_at))
    }

    async fn delete_material(&self, id: MaterialId) -> Result<bool, StorageError> {
        let removed = {
            let mut guard = self.materials.lock().map_err(poisoned)?;
            let before = guard.len();
            guard.retain(|m| m.id() != id);
            guard.len() != before
        };
        if removed {
            let mut quizzes = self.quizzes.lock().map_err(poisoned)?;
            for quiz in quizzes.iter_mut().filter(|q| q.material_id() == Some(id)) {
                quiz.detach_material();
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        if guard.iter().any(|q| q.id() == quiz.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|q| q.id() == id).cloned())
    }

    async fn list_quizzes(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        Ok(newest_first(&guard, |q| q.user_id() == user_id, Quiz::created_at))
    }

    async fn publish_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        guard
            .iter_mut()
            .find(|q| q.id() == id)
            .ok_or(StorageError::NotFound)?
            .publish();
        Ok(())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<bool, StorageError> {
        let removed = {
            let mut guard = self.quizzes.lock().map_err(poisoned)?;
            let before = guard.len();
            guard.retain(|q| q.id() != id);
            guard.len() != before
        };
        if removed {
            let mut attempts = self.attempts.lock().map_err(poisoned)?;
            attempts.retain(|a| a.quiz_id() != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let quiz_exists = {
            let quizzes = self.quizzes.lock().map_err(poisoned)?;
            quizzes.iter().any(|q| q.id() == attempt.quiz_id())
        };
        if !quiz_exists {
            return Err(StorageError::NotFound);
        }
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        if guard.iter().any(|a| a.id() == attempt.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(attempt.clone());
        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<Attempt>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|a| a.id() == id).cloned())
    }

    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        Ok(newest_first(&guard, |a| a.user_id() == user_id, Attempt::completed_at))
    }

    async fn list_attempts_for_quiz(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        Ok(newest_first(&guard, |a| a.quiz_id() == quiz_id, Attempt::completed_at))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub materials: Arc<dyn MaterialRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            materials: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            attempts: Arc::new(repo),
        }
    }
}
