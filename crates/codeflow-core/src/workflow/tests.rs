use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;

use super::*;
use crate::{
    config::WorkflowConfig,
    error::{ProviderError, WorkflowError},
    models::{ExecutionResult, RequestStatus, WorkflowStep, MAX_DEBUG_ATTEMPTS},
    providers::{GenerationProvider, SimulatedExecutor, TemplateGenerator},
    session::Session,
    store::{MemoryStore, RequestStore},
};

const CSV_TASK: &str = "Build a CSV analysis script";
const GENERIC_TASK: &str = "generic task";

fn signed_in() -> Controller {
    Controller::new(Session::signed_in("alice").expect("Failed to sign in"))
}

fn ticket(effects: &[Effect]) -> Ticket {
    effects
        .iter()
        .find_map(Effect::ticket)
        .expect("expected a provider call")
}

/// Submits a task and answers the plan call with `plan`.
fn at_plan(controller: &mut Controller, plan: &str) {
    let effects = controller
        .handle(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .expect("Failed to submit");
    controller
        .handle(Event::PlanGenerated {
            ticket: ticket(&effects),
            result: Ok(plan.to_string()),
        })
        .expect("Failed to apply plan");
}

/// Continues from the plan step into code with `code` generated.
fn at_code(controller: &mut Controller, code: &str) {
    at_plan(controller, "## Step 1: Do it");
    let effects = controller.handle(Event::Approve).expect("Failed to approve");
    controller
        .handle(Event::CodeGenerated {
            ticket: ticket(&effects),
            result: Ok(code.to_string()),
        })
        .expect("Failed to apply code");
}

fn run(controller: &mut Controller, outcome: ExecutionResult) {
    let effects = controller.handle(Event::Execute).expect("Failed to execute");
    controller
        .handle(Event::Executed {
            ticket: ticket(&effects),
            result: Ok(outcome),
        })
        .expect("Failed to apply execution");
}

fn failure() -> ExecutionResult {
    ExecutionResult::Failure {
        errors: vec!["NameError: name 'main' is not defined".to_string()],
    }
}

fn success() -> ExecutionResult {
    ExecutionResult::Success {
        output: "done".to_string(),
    }
}

#[test]
fn test_submit_creates_request_and_asks_for_plan() {
    let mut controller = signed_in();
    let effects = controller
        .handle(Event::Submit {
            description: "  Build a CSV analysis script \n".to_string(),
        })
        .expect("Failed to submit");

    assert_eq!(controller.step(), WorkflowStep::Plan);
    assert_eq!(controller.pending(), Some(Stage::Plan));
    let request = controller.request().expect("live request");
    assert_eq!(request.description, CSV_TASK);
    assert_eq!(request.status, RequestStatus::Planning);
    assert!(!request.id.is_empty());

    assert_eq!(effects.len(), 2);
    match &effects[0] {
        Effect::Persist(Persist::Create { user_id, request }) => {
            assert_eq!(user_id, "alice");
            assert_eq!(request.status, RequestStatus::Planning);
        }
        other => panic!("expected create, got {other:?}"),
    }
    assert!(matches!(
        &effects[1],
        Effect::GeneratePlan { description, .. } if description == CSV_TASK
    ));
}

#[test]
fn test_blank_description_keeps_request_step() {
    let mut controller = signed_in();
    let err = controller
        .handle(Event::Submit {
            description: " \t\n".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidInput { .. }));
    assert_eq!(controller.step(), WorkflowStep::Request);
    assert!(controller.request().is_none());
}

#[test]
fn test_events_refused_without_user() {
    let mut controller = Controller::new(Session::new());
    let err = controller
        .handle(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthenticated));
    assert_eq!(controller.step(), WorkflowStep::Request);
}

#[test]
fn test_logout_discards_live_request() {
    let mut controller = signed_in();
    at_plan(&mut controller, "plan");
    let user = controller.logout().expect("was signed in");
    assert_eq!(user.id, "alice");
    assert_eq!(controller.step(), WorkflowStep::Request);
    assert!(controller.request().is_none());
    assert!(matches!(
        controller.handle(Event::Back),
        Err(WorkflowError::Unauthenticated)
    ));
}

#[test]
fn test_edited_plan_is_approved_verbatim() {
    let mut controller = signed_in();
    at_plan(&mut controller, "## Step 1: Generated");
    assert_eq!(controller.draft_plan(), Some("## Step 1: Generated"));

    let edited = "## Step 1: Mine\n- keep   spacing  \n";
    controller
        .handle(Event::EditPlan {
            text: edited.to_string(),
        })
        .expect("Failed to edit plan");
    let effects = controller.handle(Event::Approve).expect("Failed to approve");

    assert_eq!(controller.step(), WorkflowStep::Code);
    let request = controller.request().expect("live request");
    assert_eq!(request.plan.as_deref(), Some(edited));
    assert_eq!(request.status, RequestStatus::Coding);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::GenerateCode { plan, .. } if plan == edited)));
}

#[test]
fn test_blank_plan_cannot_be_approved() {
    let mut controller = signed_in();
    at_plan(&mut controller, "plan");
    controller
        .handle(Event::EditPlan {
            text: "   ".to_string(),
        })
        .expect("Failed to edit plan");
    assert!(matches!(
        controller.handle(Event::Approve),
        Err(WorkflowError::InvalidInput { .. })
    ));
    assert_eq!(controller.step(), WorkflowStep::Plan);
}

#[test]
fn test_busy_refuses_calls_but_allows_back() {
    let mut controller = signed_in();
    controller
        .handle(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .expect("Failed to submit");

    assert!(matches!(
        controller.handle(Event::Approve),
        Err(WorkflowError::Busy {
            pending: "plan generation"
        })
    ));

    controller.handle(Event::Back).expect("Failed to go back");
    assert_eq!(controller.step(), WorkflowStep::Request);
    assert!(controller.request().is_none());
    assert!(!controller.is_busy());
}

#[test]
fn test_stale_plan_is_discarded() {
    let mut controller = signed_in();
    let first = controller
        .handle(Event::Submit {
            description: "first".to_string(),
        })
        .expect("Failed to submit");
    controller.handle(Event::Back).expect("Failed to go back");
    let second = controller
        .handle(Event::Submit {
            description: "second".to_string(),
        })
        .expect("Failed to submit");

    let effects = controller
        .handle(Event::PlanGenerated {
            ticket: ticket(&first),
            result: Ok("plan for first".to_string()),
        })
        .expect("stale results are not errors");
    assert!(effects.is_empty());
    assert!(controller.draft_plan().is_none());
    assert_eq!(controller.pending(), Some(Stage::Plan));

    controller
        .handle(Event::PlanGenerated {
            ticket: ticket(&second),
            result: Ok("plan for second".to_string()),
        })
        .expect("Failed to apply plan");
    assert_eq!(controller.draft_plan(), Some("plan for second"));
}

#[test]
fn test_new_submission_gets_a_greater_id() {
    let mut controller = signed_in();
    let mut ids = Vec::new();
    for _ in 0..3 {
        controller
            .handle(Event::Submit {
                description: GENERIC_TASK.to_string(),
            })
            .expect("Failed to submit");
        ids.push(
            controller
                .request()
                .expect("live request")
                .id
                .parse::<i64>()
                .expect("numeric id"),
        );
        controller.handle(Event::Back).expect("Failed to go back");
    }
    assert!(ids[0] < ids[1] && ids[1] < ids[2]);
}

#[test]
fn test_back_from_code_keeps_approved_plan() {
    let mut controller = signed_in();
    at_plan(&mut controller, "original");
    controller
        .handle(Event::EditPlan {
            text: "edited".to_string(),
        })
        .expect("Failed to edit plan");
    controller.handle(Event::Approve).expect("Failed to approve");

    let effects = controller.handle(Event::Back).expect("Failed to go back");
    assert_eq!(controller.step(), WorkflowStep::Plan);
    assert!(matches!(effects[..], [Effect::GeneratePlan { .. }]));

    controller
        .handle(Event::PlanGenerated {
            ticket: ticket(&effects),
            result: Ok("fresh draft".to_string()),
        })
        .expect("Failed to apply plan");
    assert_eq!(controller.draft_plan(), Some("edited"));
}

#[test]
fn test_execution_results_are_exclusive() {
    let mut controller = signed_in();
    at_code(&mut controller, "def main():\n    pass\n");

    run(&mut controller, failure());
    let request = controller.request().expect("live request");
    assert!(request.output.is_none());
    assert!(!request.errors.is_empty());
    assert_eq!(request.status, RequestStatus::Error);
    assert!(!controller.can_complete());

    run(&mut controller, success());
    let request = controller.request().expect("live request");
    assert_eq!(request.output.as_deref(), Some("done"));
    assert!(request.errors.is_empty());
    assert!(controller.can_complete());
}

#[test]
fn test_debug_budget_caps_at_three() {
    let mut controller = signed_in();
    at_code(&mut controller, "print('no entry point')");
    run(&mut controller, failure());

    for attempt in 1..=MAX_DEBUG_ATTEMPTS {
        assert!(controller.can_debug());
        let effects = controller.handle(Event::Debug).expect("Failed to debug");
        assert_eq!(
            controller.request().expect("live request").debug_attempts,
            attempt
        );

        let rerun = controller
            .handle(Event::Debugged {
                ticket: ticket(&effects),
                result: Ok("print('still no entry point')".to_string()),
            })
            .expect("Failed to apply revision");
        assert!(matches!(
            rerun.last(),
            Some(Effect::Execute {
                after_debug: true,
                ..
            })
        ));
        controller
            .handle(Event::Executed {
                ticket: ticket(&rerun),
                result: Ok(failure()),
            })
            .expect("Failed to apply execution");
    }

    assert!(!controller.can_debug());
    assert!(matches!(
        controller.handle(Event::Debug),
        Err(WorkflowError::DebugBudgetExhausted { max: 3 })
    ));
    assert_eq!(controller.request().expect("live request").debug_attempts, 3);
}

#[test]
fn test_debug_requires_a_failed_run() {
    let mut controller = signed_in();
    at_code(&mut controller, "def main():\n    pass\n");
    assert!(matches!(
        controller.handle(Event::Debug),
        Err(WorkflowError::InvalidInput { .. })
    ));
}

#[test]
fn test_complete_requires_success() {
    let mut controller = signed_in();
    at_code(&mut controller, "def main():\n    pass\n");
    assert!(controller.handle(Event::Complete).is_err());

    run(&mut controller, success());
    let effects = controller.handle(Event::Complete).expect("Failed to complete");
    assert_eq!(controller.step(), WorkflowStep::FollowUp);
    assert_eq!(
        controller.request().expect("live request").status,
        RequestStatus::Completed
    );
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::GenerateFollowUp {
            explanation: true,
            question: true,
            ..
        }
    )));
}

#[test]
fn test_plan_failure_is_retried() {
    let mut controller = signed_in();
    let effects = controller
        .handle(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .expect("Failed to submit");
    controller
        .handle(Event::PlanGenerated {
            ticket: ticket(&effects),
            result: Err(ProviderError::Connection("timed out".to_string())),
        })
        .expect("Failed to apply failure");

    let failure = controller.failure().expect("recorded failure");
    assert_eq!(failure.stage, Stage::Plan);
    assert!(failure.message.contains("timed out"));
    assert_eq!(controller.step(), WorkflowStep::Plan);

    let effects = controller.handle(Event::Retry).expect("Failed to retry");
    assert!(controller.failure().is_none());
    assert!(matches!(effects[..], [Effect::GeneratePlan { .. }]));
}

#[test]
fn test_retry_without_failure_is_refused() {
    let mut controller = signed_in();
    at_plan(&mut controller, "plan");
    assert!(matches!(
        controller.handle(Event::Retry),
        Err(WorkflowError::InvalidTransition { .. })
    ));
}

fn rejected() -> ProviderError {
    ProviderError::Connection("timed out".to_string())
}

#[test]
fn test_code_failure_is_retried() {
    let mut controller = signed_in();
    at_plan(&mut controller, "## Step 1: Do it");
    let effects = controller.handle(Event::Approve).expect("Failed to approve");
    controller
        .handle(Event::CodeGenerated {
            ticket: ticket(&effects),
            result: Err(rejected()),
        })
        .expect("Failed to apply failure");

    let failure = controller.failure().expect("recorded failure");
    assert_eq!(failure.stage, Stage::Code);
    assert_eq!(controller.step(), WorkflowStep::Code);
    assert!(controller.request().expect("live request").code.is_none());

    let effects = controller.handle(Event::Retry).expect("Failed to retry");
    assert!(controller.failure().is_none());
    assert_eq!(controller.pending(), Some(Stage::Code));
    assert!(matches!(
        &effects[..],
        [Effect::GenerateCode { plan, .. }] if plan == "## Step 1: Do it"
    ));
}

#[test]
fn test_execution_failure_is_retried() {
    let mut controller = signed_in();
    at_code(&mut controller, "def main():\n    pass");
    let effects = controller.handle(Event::Execute).expect("Failed to execute");
    controller
        .handle(Event::Executed {
            ticket: ticket(&effects),
            result: Err(rejected()),
        })
        .expect("Failed to apply failure");

    assert_eq!(
        controller.failure().expect("recorded failure").stage,
        Stage::Execution
    );
    let request = controller.request().expect("live request");
    assert_eq!(request.status, RequestStatus::Coding);
    assert!(request.output.is_none() && request.errors.is_empty());

    let effects = controller.handle(Event::Retry).expect("Failed to retry");
    assert!(controller.failure().is_none());
    assert_eq!(controller.pending(), Some(Stage::Execution));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::Execute {
            after_debug: false,
            ..
        }
    )));
}

#[test]
fn test_debug_failure_is_retried_without_spending_an_attempt() {
    let mut controller = signed_in();
    at_code(&mut controller, "print('hi')");
    run(&mut controller, failure());

    let effects = controller.handle(Event::Debug).expect("Failed to debug");
    controller
        .handle(Event::Debugged {
            ticket: ticket(&effects),
            result: Err(rejected()),
        })
        .expect("Failed to apply failure");

    assert_eq!(
        controller.failure().expect("recorded failure").stage,
        Stage::Debug
    );
    assert_eq!(controller.request().expect("live request").debug_attempts, 1);

    let effects = controller.handle(Event::Retry).expect("Failed to retry");
    assert_eq!(controller.pending(), Some(Stage::Debug));
    assert!(matches!(
        &effects[..],
        [Effect::Debug { errors, .. }] if !errors.is_empty()
    ));
    assert_eq!(controller.request().expect("live request").debug_attempts, 1);
}

#[test]
fn test_rejected_rerun_drops_previous_output() {
    let mut controller = signed_in();
    at_code(&mut controller, "def main():\n    pass");
    run(&mut controller, success());
    assert!(controller.can_complete());

    let effects = controller.handle(Event::Execute).expect("Failed to execute");
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::Persist(Persist::Update { update, .. })
            if update.output == Some(None) && update.errors == Some(Vec::new())
    )));
    controller
        .handle(Event::Executed {
            ticket: ticket(&effects),
            result: Err(rejected()),
        })
        .expect("Failed to apply failure");

    assert!(controller.request().expect("live request").output.is_none());
    assert!(!controller.can_complete());
    assert!(controller.handle(Event::Complete).is_err());
}

#[test]
fn test_rejected_run_after_debug_drops_stale_errors() {
    let mut controller = signed_in();
    at_code(&mut controller, "print('hi')");
    run(&mut controller, failure());

    let effects = controller.handle(Event::Debug).expect("Failed to debug");
    let effects = controller
        .handle(Event::Debugged {
            ticket: ticket(&effects),
            result: Ok("revised".to_string()),
        })
        .expect("Failed to apply revision");
    controller
        .handle(Event::Executed {
            ticket: ticket(&effects),
            result: Err(rejected()),
        })
        .expect("Failed to apply failure");

    let request = controller.request().expect("live request");
    assert_eq!(request.code.as_deref(), Some("revised"));
    assert!(request.errors.is_empty());
    assert!(matches!(
        controller.handle(Event::Debug),
        Err(WorkflowError::InvalidInput { .. })
    ));
}

#[test]
fn test_illegal_events_name_the_step() {
    let mut controller = signed_in();
    let err = controller.handle(Event::Approve).unwrap_err();
    assert_eq!(err.to_string(), "Cannot approve the plan while in the request step");
    assert!(controller.handle(Event::NewRequest).is_err());
    assert!(controller.handle(Event::Back).is_err());
}

/// Template generator whose follow-up question can be made to fail.
struct FlakyGenerator {
    inner: TemplateGenerator,
    fail_question: AtomicBool,
    explanation_calls: AtomicUsize,
}

impl FlakyGenerator {
    fn new() -> Self {
        Self {
            inner: TemplateGenerator::instant(),
            fail_question: AtomicBool::new(true),
            explanation_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerationProvider for FlakyGenerator {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn generate_plan(&self, description: &str) -> Result<String, ProviderError> {
        self.inner.generate_plan(description).await
    }

    async fn generate_code(&self, description: &str, plan: &str) -> Result<String, ProviderError> {
        self.inner.generate_code(description, plan).await
    }

    async fn debug_code(&self, code: &str, errors: &[String]) -> Result<String, ProviderError> {
        self.inner.debug_code(code, errors).await
    }

    async fn generate_explanation(
        &self,
        description: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        self.explanation_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_explanation(description, code).await
    }

    async fn generate_follow_up_question(
        &self,
        description: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        if self.fail_question.load(Ordering::SeqCst) {
            return Err(ProviderError::Api("quota exceeded".to_string()));
        }
        self.inner.generate_follow_up_question(description, code).await
    }
}

fn runner_with(
    generator: Arc<dyn GenerationProvider>,
    store: Arc<MemoryStore>,
) -> WorkflowRunner {
    let config = WorkflowConfig::instant().with_seed(7);
    WorkflowRunner::new(
        Session::signed_in("alice").expect("Failed to sign in"),
        generator,
        Arc::new(SimulatedExecutor::new(&config)),
        store,
        config,
    )
}

#[tokio::test]
async fn test_csv_request_exhausts_debug_budget() {
    let store = Arc::new(MemoryStore::new());
    let mut runner = runner_with(Arc::new(TemplateGenerator::instant()), store.clone());

    runner
        .dispatch(Event::Submit {
            description: CSV_TASK.to_string(),
        })
        .await
        .expect("Failed to submit");
    assert!(runner
        .controller()
        .draft_plan()
        .expect("plan")
        .starts_with("# Implementation Plan for CSV Data Analysis Script"));

    runner.dispatch(Event::Approve).await.expect("Failed to approve");
    let code = runner
        .controller()
        .request()
        .and_then(|r| r.code.clone())
        .expect("generated code");
    assert!(code.contains("pandas"));
    assert!(!code.contains("def main():"));

    runner.dispatch(Event::Execute).await.expect("Failed to execute");
    for _ in 0..MAX_DEBUG_ATTEMPTS {
        let errors = &runner.controller().request().expect("live request").errors;
        assert_eq!(errors[0], "NameError: name 'main' is not defined");
        runner.dispatch(Event::Debug).await.expect("Failed to debug");
    }

    let request = runner.controller().request().expect("live request").clone();
    assert_eq!(request.errors[0], "NameError: name 'main' is not defined");
    assert_eq!(request.debug_attempts, 3);
    assert!(matches!(
        runner.dispatch(Event::Debug).await,
        Err(WorkflowError::DebugBudgetExhausted { .. })
    ));

    let stored = store
        .get(&request.id)
        .await
        .expect("Failed to read store")
        .expect("stored request");
    assert_eq!(stored.user_id, "alice");
    assert_eq!(stored.request.debug_attempts, 3);
    assert_eq!(stored.request.status, RequestStatus::Error);
    assert_eq!(stored.request.code, request.code);
}

#[tokio::test]
async fn test_generic_request_runs_to_follow_up() {
    let store = Arc::new(MemoryStore::new());
    let mut runner = runner_with(Arc::new(TemplateGenerator::instant()), store.clone());

    runner
        .dispatch(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .await
        .expect("Failed to submit");
    runner.dispatch(Event::Approve).await.expect("Failed to approve");
    runner.dispatch(Event::Execute).await.expect("Failed to execute");

    let request = runner.controller().request().expect("live request");
    assert!(request.errors.is_empty());
    assert!(request.output.as_deref().is_some_and(|o| !o.is_empty()));
    let first_id = request.id.clone();

    runner.dispatch(Event::Complete).await.expect("Failed to complete");
    let follow_up = runner.controller().follow_up().expect("follow-up state");
    assert!(follow_up.explanation.text().is_some());
    assert!(follow_up.question.text().is_some());
    assert!(runner.controller().failure().is_none());

    runner
        .dispatch(Event::Respond {
            text: "Add a progress bar".to_string(),
        })
        .await
        .expect("Failed to respond");
    assert_eq!(
        runner.controller().follow_up().expect("follow-up").replies,
        vec!["Add a progress bar".to_string()]
    );

    runner
        .dispatch(Event::NewRequest)
        .await
        .expect("Failed to start over");
    assert_eq!(runner.controller().step(), WorkflowStep::Request);
    assert!(runner.controller().request().is_none());

    runner
        .dispatch(Event::Submit {
            description: "another task".to_string(),
        })
        .await
        .expect("Failed to submit");
    let second_id = runner.controller().request().expect("live request").id.clone();
    assert_ne!(first_id, second_id);

    let history = runner.history().await.expect("Failed to list history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second_id);
    assert_eq!(history[1].id, first_id);
    assert_eq!(history[1].status, RequestStatus::Completed);
}

#[tokio::test]
async fn test_follow_up_halves_fail_independently() {
    let generator = Arc::new(FlakyGenerator::new());
    let store = Arc::new(MemoryStore::new());
    let mut runner = runner_with(generator.clone(), store);

    runner
        .dispatch(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .await
        .expect("Failed to submit");
    runner.dispatch(Event::Approve).await.expect("Failed to approve");
    runner.dispatch(Event::Execute).await.expect("Failed to execute");
    runner.dispatch(Event::Complete).await.expect("Failed to complete");

    let follow_up = runner.controller().follow_up().expect("follow-up state");
    assert!(follow_up.explanation.text().is_some());
    assert!(follow_up.question.is_failed());
    let failure = runner.controller().failure().expect("recorded failure");
    assert_eq!(failure.stage, Stage::FollowUp);
    assert!(failure.message.contains("quota exceeded"));

    generator.fail_question.store(false, Ordering::SeqCst);
    runner.dispatch(Event::Retry).await.expect("Failed to retry");

    let follow_up = runner.controller().follow_up().expect("follow-up state");
    assert!(follow_up.question.text().is_some());
    assert!(runner.controller().failure().is_none());
    assert_eq!(generator.explanation_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dispatch_refused_when_signed_out() {
    let store = Arc::new(MemoryStore::new());
    let mut runner = runner_with(Arc::new(TemplateGenerator::instant()), store.clone());
    runner.logout();

    let err = runner
        .dispatch(Event::Submit {
            description: GENERIC_TASK.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthenticated));
    assert!(store.is_empty().await);
}
