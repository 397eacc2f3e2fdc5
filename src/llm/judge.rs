//! Judge synthesis: one provider evaluates the panel's answers

use tokio_util::sync::CancellationToken;

use crate::llm::client::{ProviderClient, ProviderResult};

/// What the judge step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeOutcome {
    /// The judge's evaluation and final answer
    Synthesis(String),
    /// The judge was called and failed
    Failure(String),
    /// No panel member answered, so the judge was never called
    AllFailed,
}

/// Build the meta-prompt. Answers are numbered by their position among the
/// valid answers, starting at `AI 1`.
pub fn build_judge_prompt(query: &str, valid_answers: &[&str], instructions: &str) -> String {
    let noun = if valid_answers.len() == 1 {
        "answer"
    } else {
        "answers"
    };

    let answers = valid_answers
        .iter()
        .enumerate()
        .map(|(i, answer)| format!("AI {}:\n{}\n", i + 1, answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "User Question:\n{}\n\n\
        Here {} {} AI {}:\n\n\
        {}\n\
        {}",
        query,
        if valid_answers.len() == 1 { "is" } else { "are" },
        count_word(valid_answers.len()),
        noun,
        answers,
        instructions.trim()
    )
}

fn count_word(n: usize) -> String {
    match n {
        1 => "one".to_string(),
        2 => "two".to_string(),
        3 => "three".to_string(),
        4 => "four".to_string(),
        5 => "five".to_string(),
        n => n.to_string(),
    }
}

/// Synthesize a final answer from the successful results.
///
/// With zero successes this returns `AllFailed` without touching the judge.
pub async fn synthesize(
    query: &str,
    results: &[ProviderResult],
    judge: &ProviderClient,
    instructions: &str,
    cancel: &CancellationToken,
) -> JudgeOutcome {
    let valid_answers: Vec<&str> = results.iter().filter_map(ProviderResult::text).collect();

    if valid_answers.is_empty() {
        tracing::warn!("no provider answered, skipping judge");
        return JudgeOutcome::AllFailed;
    }

    let prompt = build_judge_prompt(query, &valid_answers, instructions);
    tracing::debug!(
        judge = judge.name(),
        answers = valid_answers.len(),
        "asking judge"
    );

    match judge.invoke(&prompt, cancel).await {
        ProviderResult::Success(text) => JudgeOutcome::Synthesis(text),
        ProviderResult::Failure(reason) => JudgeOutcome::Failure(reason),
    }
}
