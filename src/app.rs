use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::judge::evaluate_single_item;
use crate::report::{
    load_items, EvaluationItem, EvaluationReport, JudgeVerdict,
};
use crate::templates::{self, TemplateMap};
use crate::{create_app_state, AppConfig, AppState};

pub async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    run_app().await
}

pub async fn run_app() -> Result<()> {
    let cli = Cli::parse();

    // Startup failures abort before any item is processed; everything after
    // this point is per-item recoverable.
    let templates = templates::parse_prompt_file(&cli.prompt_file)?;
    let items = load_items(&cli.input_file)?;

    let state = create_app_state(AppConfig {
        openai_api_key: cli.openai_api_key,
        openai_api_base: cli.openai_api_base,
        judge_model: cli.judge_model,
    })?;

    println!(
        "Starting evaluation for {} items using {}...",
        items.len(),
        state.judge_model
    );

    let report = run_evaluation(&state, &templates, &items).await;
    report.save(&cli.output_file)?;

    println!();
    println!("Evaluation complete!");
    println!("Average score: {:.2} / 5.0", report.meta.average_score);
    println!(
        "Full detailed results saved to: {}",
        cli.output_file.display()
    );

    Ok(())
}

/// Process every item strictly in input order: exactly one verdict per item,
/// no retries. Items whose task type has no template are skipped without a
/// judge call; judge failures are recorded and the batch continues.
pub async fn run_evaluation(
    state: &AppState,
    templates: &TemplateMap,
    items: &[EvaluationItem],
) -> EvaluationReport {
    let mut results: Vec<JudgeVerdict> = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        println!(
            "[{}/{}] evaluating item {}",
            index + 1,
            items.len(),
            item.id
        );

        let template = match templates.get(&item.task_type) {
            Some(template) => template,
            None => {
                warn!(
                    "No prompt found for task type '{}' (id: {})",
                    item.task_type, item.id
                );
                results.push(JudgeVerdict::skipped(item));
                continue;
            }
        };

        let verdict = evaluate_single_item(
            state.judge_client.as_ref(),
            item,
            template,
            &state.judge_model,
        )
        .await;
        results.push(verdict);
    }

    EvaluationReport::new(&state.judge_model, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::fake::FakeOpenAIClient;
    use crate::report::VerdictStatus;
    use crate::test_utils::init_test_logging;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn item(id: u64, task_type: &str) -> EvaluationItem {
        EvaluationItem {
            id: json!(id),
            task_type: task_type.to_string(),
            question: json!("What color is the sky?"),
            reference_answer: json!("Blue"),
            model_answer: json!("Blue, usually"),
        }
    }

    fn template_map() -> TemplateMap {
        let mut templates = HashMap::new();
        templates.insert(
            "A".to_string(),
            "Q: {{question}} R: {{reference_answer}} M: {{model_answer}}"
                .to_string(),
        );
        templates
    }

    #[tokio::test]
    async fn unmapped_task_type_is_skipped_without_a_judge_call() {
        init_test_logging();
        let fake_client = Arc::new(
            FakeOpenAIClient::new()
                .with_response(r#"{"score": 4, "reasoning": "ok"}"#),
        );
        let state =
            AppState::new_for_testing_with_client(fake_client.clone());

        let items = vec![item(1, "A"), item(2, "Z")];
        let report =
            run_evaluation(&state, &template_map(), &items).await;

        // Only the mapped item reached the judge.
        assert_eq!(fake_client.request_count(), 1);

        assert_eq!(report.meta.total_items, 2);
        assert_eq!(report.meta.evaluated_items, 1);
        assert_eq!(report.meta.average_score, 4.0);

        assert_eq!(report.details[0].status, VerdictStatus::Success);
        assert_eq!(report.details[1].status, VerdictStatus::Skipped);
        assert_eq!(
            report.details[1].error.as_deref(),
            Some("Task type not found in prompt file")
        );
    }

    #[tokio::test]
    async fn judge_failure_does_not_stop_the_batch() {
        init_test_logging();
        let fake_client = Arc::new(
            FakeOpenAIClient::new()
                .with_error("connection reset by peer")
                .with_response(r#"{"score": 5, "reasoning": "perfect"}"#),
        );
        let state =
            AppState::new_for_testing_with_client(fake_client.clone());

        let items = vec![item(1, "A"), item(2, "A")];
        let report =
            run_evaluation(&state, &template_map(), &items).await;

        assert_eq!(fake_client.request_count(), 2);

        assert_eq!(report.details[0].status, VerdictStatus::Error);
        let reasoning = report.details[0].reasoning.clone().unwrap();
        assert!(reasoning
            .as_str()
            .unwrap()
            .contains("connection reset by peer"));

        assert_eq!(report.details[1].status, VerdictStatus::Success);
        // The failed item is excluded from the average entirely.
        assert_eq!(report.meta.evaluated_items, 1);
        assert_eq!(report.meta.average_score, 5.0);
    }

    #[tokio::test]
    async fn verdicts_keep_input_order_and_identity() {
        init_test_logging();
        let fake_client = Arc::new(FakeOpenAIClient::new().with_responses(
            vec![
                r#"{"score": 1, "reasoning": "a"}"#,
                r#"{"score": 2, "reasoning": "b"}"#,
            ],
        ));
        let state =
            AppState::new_for_testing_with_client(fake_client.clone());

        let items = vec![item(10, "A"), item(20, "Z"), item(30, "A")];
        let report =
            run_evaluation(&state, &template_map(), &items).await;

        assert_eq!(report.details.len(), 3);
        for (verdict, input) in report.details.iter().zip(items.iter()) {
            assert_eq!(verdict.id, input.id);
            assert_eq!(verdict.task_type, input.task_type);
        }
    }
}
