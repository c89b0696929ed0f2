//! Step panels: a markdown view of the controller plus the actions the user
//! can take from it.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use codeflow_core::{
    models::MAX_DEBUG_ATTEMPTS,
    workflow::{Controller, FollowUpState, Half},
    CodingRequest, Event, OperationStatus, WorkflowError, WorkflowStep,
};
use dialoguer::{Editor, Input, Select};

use crate::renderer::TerminalRenderer;

/// What the user picked in a panel.
pub enum Choice {
    Send(Event),
    EditPlan,
    Respond,
    Describe,
    Quit,
}

/// Prints the step indicator and the panel for the current step.
pub fn render(renderer: &TerminalRenderer, controller: &Controller) -> Result<()> {
    renderer.steps(controller.step())?;
    println!();

    let markdown = match (controller.step(), controller.request()) {
        (WorkflowStep::Plan, _) => plan_markdown(controller.draft_plan()),
        (WorkflowStep::Code, Some(request)) => code_markdown(request),
        (WorkflowStep::FollowUp, Some(request)) => {
            let empty = FollowUpState::default();
            follow_up_markdown(request, controller.follow_up().unwrap_or(&empty))
        }
        _ => String::new(),
    };
    if !markdown.is_empty() {
        renderer.render(&markdown)?;
    }

    if let Some(failure) = controller.failure() {
        renderer.status(&OperationStatus::failure(format!(
            "{failure}. Choose Retry to try again."
        )))?;
    }
    Ok(())
}

pub fn plan_markdown(draft: Option<&str>) -> String {
    match draft {
        Some(plan) => format!("# Implementation Plan\n\n{}\n", plan.trim_end()),
        None => "# Implementation Plan\n\n_No plan available._\n".to_string(),
    }
}

pub fn code_markdown(request: &CodingRequest) -> String {
    let mut out = String::from("# Generated Code\n\n");
    match &request.code {
        Some(code) => {
            let _ = writeln!(out, "```python\n{}\n```", code.trim_end());
        }
        None => out.push_str("_No code available._\n"),
    }

    if let Some(output) = &request.output {
        let _ = writeln!(out, "\n## Output\n\n```text\n{}\n```", output.trim_end());
    }

    if !request.errors.is_empty() {
        out.push_str("\n## Errors\n\n");
        for error in &request.errors {
            let _ = writeln!(out, "- `{error}`");
        }
    }

    if request.debug_attempts > 0 {
        let _ = writeln!(
            out,
            "\nDebug attempts: {}/{MAX_DEBUG_ATTEMPTS}",
            request.debug_attempts
        );
    }
    if !request.errors.is_empty() && !request.can_debug() {
        let _ = writeln!(
            out,
            "\n**{}**",
            WorkflowError::DebugBudgetExhausted {
                max: MAX_DEBUG_ATTEMPTS
            }
        );
    }
    out
}

fn half_markdown(half: &Half) -> String {
    match half {
        Half::Pending => "_Generating..._".to_string(),
        Half::Ready(text) => text.trim_end().to_string(),
        Half::Failed(err) => format!("_Could not generate this section: {err}_"),
    }
}

pub fn follow_up_markdown(request: &CodingRequest, state: &FollowUpState) -> String {
    let mut out = String::from("# Success! Your code is ready\n\n");
    let _ = writeln!(out, "Request: {}\n", request.description);
    let _ = writeln!(out, "## Code Explanation\n\n{}\n", half_markdown(&state.explanation));
    let _ = writeln!(out, "## What's Next?\n\n{}", half_markdown(&state.question));

    if !state.replies.is_empty() {
        out.push_str("\n## Your Replies\n\n");
        for reply in &state.replies {
            let _ = writeln!(out, "- {reply}");
        }
    }
    out
}

/// Actions offered by the current step, in menu order.
pub fn choices(controller: &Controller) -> Vec<(String, Choice)> {
    let mut items: Vec<(String, Choice)> = Vec::new();
    let retry = controller.failure().is_some();

    match controller.step() {
        WorkflowStep::Request => {
            items.push(("Describe a new task".into(), Choice::Describe));
        }
        WorkflowStep::Plan => {
            if controller.draft_plan().is_some() {
                items.push(("Approve plan".into(), Choice::Send(Event::Approve)));
            }
            items.push(("Edit plan".into(), Choice::EditPlan));
            if retry {
                items.push(("Retry".into(), Choice::Send(Event::Retry)));
            }
            items.push(("Back".into(), Choice::Send(Event::Back)));
        }
        WorkflowStep::Code => {
            let request = controller.request();
            if request.is_some_and(|r| r.code.is_some()) {
                items.push(("Execute".into(), Choice::Send(Event::Execute)));
            }
            if let Some(r) = request.filter(|r| !r.errors.is_empty() && r.can_debug()) {
                items.push((
                    format!("Debug ({} attempts left)", r.remaining_debug_attempts()),
                    Choice::Send(Event::Debug),
                ));
            }
            if controller.can_complete() {
                items.push(("Complete".into(), Choice::Send(Event::Complete)));
            }
            if retry {
                items.push(("Retry".into(), Choice::Send(Event::Retry)));
            }
            items.push(("Back to plan".into(), Choice::Send(Event::Back)));
        }
        WorkflowStep::FollowUp => {
            items.push(("Respond".into(), Choice::Respond));
            if retry {
                items.push(("Retry".into(), Choice::Send(Event::Retry)));
            }
            items.push(("New request".into(), Choice::Send(Event::NewRequest)));
        }
    }

    items.push(("Quit".into(), Choice::Quit));
    items
}

/// Asks the user for the next action and turns it into an event.
///
/// Returns `None` when the user quits.
pub fn prompt(controller: &Controller) -> Result<Option<Event>> {
    let mut items = choices(controller);
    let labels: Vec<&str> = items.iter().map(|(label, _)| label.as_str()).collect();
    let selection = Select::new()
        .with_prompt("Next")
        .items(&labels)
        .default(0)
        .interact()
        .context("Failed to read selection")?;

    let event = match items.swap_remove(selection).1 {
        Choice::Send(event) => event,
        Choice::Quit => return Ok(None),
        Choice::Describe => {
            let description: String = Input::new()
                .with_prompt("Describe your task")
                .interact_text()
                .context("Failed to read description")?;
            Event::Submit { description }
        }
        Choice::EditPlan => {
            let draft = controller.draft_plan().unwrap_or_default();
            let edited = Editor::new()
                .extension(".md")
                .edit(draft)
                .context("Failed to open editor")?;
            Event::EditPlan {
                text: edited.unwrap_or_else(|| draft.to_string()),
            }
        }
        Choice::Respond => {
            let text: String = Input::new()
                .with_prompt("Your reply")
                .interact_text()
                .context("Failed to read reply")?;
            Event::Respond { text }
        }
    };
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use codeflow_core::{ExecutionResult, Session};
    use jiff::Timestamp;

    use super::*;

    fn request() -> CodingRequest {
        CodingRequest::new("1", "Build a CSV analysis script", Timestamp::now())
    }

    #[test]
    fn test_code_panel_shows_errors_and_budget() {
        let mut request = request();
        request.code = Some("import pandas as pd".to_string());
        request.record_execution(&ExecutionResult::Failure {
            errors: vec!["NameError: name 'main' is not defined".to_string()],
        });
        request.debug_attempts = MAX_DEBUG_ATTEMPTS;

        let markdown = code_markdown(&request);
        assert!(markdown.contains("```python\nimport pandas as pd\n```"));
        assert!(markdown.contains("- `NameError: name 'main' is not defined`"));
        assert!(markdown.contains("Debug attempts: 3/3"));
        assert!(markdown.contains("Manual review may be needed."));
        assert!(!markdown.contains("## Output"));
    }

    #[test]
    fn test_follow_up_panel_reports_failed_half() {
        let state = FollowUpState {
            explanation: Half::Ready("It reads a CSV file.".to_string()),
            question: Half::Failed(codeflow_core::ProviderError::EmptyResponse),
            replies: vec!["Add charts".to_string()],
        };
        let markdown = follow_up_markdown(&request(), &state);
        assert!(markdown.contains("It reads a CSV file."));
        assert!(markdown.contains("Could not generate this section"));
        assert!(markdown.contains("- Add charts"));
    }

    #[test]
    fn test_request_step_offers_describe_and_quit() {
        let controller = Controller::new(Session::signed_in("alice").expect("session"));
        let labels: Vec<String> = choices(&controller).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Describe a new task", "Quit"]);
    }

    #[test]
    fn test_plan_panel_without_draft() {
        assert!(plan_markdown(None).contains("No plan available"));
        assert!(plan_markdown(Some("## Step 1\n\n")).ends_with("## Step 1\n"));
    }
}
