use chrono::Duration;
use quiz_core::model::{
    AttemptId, AttemptSummary, CommittedAnswer, Difficulty, EndReason, Question, QuestionId,
    QuestionOption, QuizId,
};
use quiz_core::time::fixed_now;
use storage::repository::{QuizDefinition, Storage};

fn build_quiz(id: u64) -> QuizDefinition {
    let questions = (1..=3)
        .map(|n| {
            Question::new(
                QuestionId::new(n),
                format!("Question {n}"),
                vec![QuestionOption::from("A"), QuestionOption::from("B")],
                usize::from(n % 2 == 0),
                5,
                Difficulty::Medium,
                None,
            )
            .unwrap()
        })
        .collect();
    QuizDefinition {
        id: QuizId::new(id),
        title: format!("Quiz {id}"),
        category: Some("General".into()),
        questions,
    }
}

#[tokio::test]
async fn quiz_round_trip_keeps_question_order() {
    let storage = Storage::in_memory();
    let quiz = build_quiz(1);
    storage.quizzes.upsert_quiz(&quiz).await.unwrap();

    let fetched = storage.quizzes.get_quiz(QuizId::new(1)).await.unwrap();
    let ids: Vec<u64> = fetched.questions.iter().map(|q| q.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(fetched, quiz);
}

#[tokio::test]
async fn results_list_newest_first_and_filter_by_quiz() {
    let storage = Storage::in_memory();
    let quiz = build_quiz(1);
    let start = fixed_now();

    for minutes in [0, 10, 5] {
        let completed = start + Duration::minutes(minutes);
        let summary = AttemptSummary::from_attempt(
            AttemptId::generate(),
            start,
            completed,
            &quiz.questions,
            &[CommittedAnswer::Skipped; 3],
            3,
            EndReason::Finished,
        )
        .unwrap();
        storage.results.append_result(quiz.id, &summary).await.unwrap();
    }

    let other = AttemptSummary::from_attempt(
        AttemptId::generate(),
        start,
        start,
        &quiz.questions,
        &[],
        3,
        EndReason::Finished,
    )
    .unwrap();
    storage
        .results
        .append_result(QuizId::new(2), &other)
        .await
        .unwrap();

    let rows = storage.results.list_results(quiz.id, None).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].summary.completed_at() >= rows[1].summary.completed_at());
    assert!(rows[1].summary.completed_at() >= rows[2].summary.completed_at());

    let recent = storage
        .results
        .list_results(quiz.id, Some(start + Duration::minutes(5)))
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
}
