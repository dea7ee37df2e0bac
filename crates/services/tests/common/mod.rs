#![allow(dead_code)]

use std::sync::Arc;

use quiz_core::model::{Difficulty, Question, QuestionId, QuestionOption, QuizId};
use quiz_core::time::fixed_clock;
use services::QuizLoopService;
use storage::repository::{InMemoryRepository, QuizDefinition, QuizRepository};

pub fn question(id: u64, correct: usize, points: u32, time_limit: Option<u32>) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Question {id}"),
        vec![
            QuestionOption::from("first"),
            QuestionOption::from("second"),
            QuestionOption::from("third"),
        ],
        correct,
        points,
        Difficulty::Medium,
        time_limit,
    )
    .unwrap()
}

pub async fn seeded(questions: Vec<Question>) -> (InMemoryRepository, QuizLoopService) {
    let repo = InMemoryRepository::new();
    repo.upsert_quiz(&QuizDefinition {
        id: QuizId::new(1),
        title: "Smoke Quiz".into(),
        category: None,
        questions,
    })
    .await
    .unwrap();

    let service = QuizLoopService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    (repo, service)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
