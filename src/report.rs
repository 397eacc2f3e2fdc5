//! Console report for a panel response

use std::fmt::Write as _;

use crossterm::style::Stylize;

use crate::llm::{JudgeOutcome, LabeledResult, PanelResponse, ProviderResult};

pub const DIVIDER: &str = "--------------------------------------------";

/// Renders responses as plain or colored text
#[derive(Debug, Clone, Copy)]
pub struct Report {
    color: bool,
}

impl Report {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, text: String) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text
        }
    }

    fn failure(&self, text: String) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text
        }
    }

    fn body(&self, result: &ProviderResult) -> String {
        match result {
            ProviderResult::Success(text) => text.clone(),
            ProviderResult::Failure(reason) => self.failure(format!("[no answer: {}]", reason)),
        }
    }

    fn member_line(&self, position: usize, member: &LabeledResult) -> String {
        format!(
            "{} {}\n",
            self.header(format!("AI {} {}:", position, member.model)),
            self.body(&member.result)
        )
    }

    /// Render a full response block, divider first
    pub fn render(&self, response: &PanelResponse) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}\n", DIVIDER);

        match response {
            PanelResponse::FastPath(answer) => {
                let _ = writeln!(
                    out,
                    "{} {}",
                    self.header(format!("Quick answer from {}:", answer.model)),
                    self.body(&answer.result)
                );
            }
            PanelResponse::Full(outcome) => {
                for (i, member) in outcome.results.iter().enumerate() {
                    let _ = writeln!(out, "{}", self.member_line(i + 1, member));
                }

                let conclusion = self.header(format!(
                    "Conclusion by AI {} ({}):",
                    outcome.results.len() + 1,
                    outcome.judge_model
                ));
                let text = match &outcome.judge {
                    JudgeOutcome::Synthesis(text) => text.clone(),
                    JudgeOutcome::Failure(reason) => {
                        self.failure(format!("[judge failed: {}]", reason))
                    }
                    JudgeOutcome::AllFailed => self.failure(
                        "All providers failed, so there is nothing to judge. Please try again."
                            .to_string(),
                    ),
                };
                let _ = writeln!(out, "{} {}", conclusion, text);
            }
        }

        out
    }
}
