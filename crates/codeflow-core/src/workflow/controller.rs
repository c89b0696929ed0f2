//! The workflow state machine.

use jiff::Timestamp;
use log::{debug, info, warn};

use super::{Effect, Event, FollowUpState, Half, Persist, Stage, StepFailure, Ticket};
use crate::{
    error::{ProviderError, Result, WorkflowError},
    models::{
        CodingRequest, ExecutionResult, RequestStatus, RequestUpdate, WorkflowStep,
        MAX_DEBUG_ATTEMPTS,
    },
    session::{Session, User},
};

/// Owns the live request and decides what happens next.
///
/// [`Controller::handle`] never performs I/O. It validates an [`Event`],
/// updates state, and returns the [`Effect`]s the caller must perform.
/// Completions of those effects come back as events carrying the
/// [`Ticket`] they were issued with; completions from an earlier epoch are
/// dropped.
#[derive(Debug, Default)]
pub struct Controller {
    session: Session,
    step: WorkflowStep,
    request: Option<CodingRequest>,
    draft_plan: Option<String>,
    follow_up: Option<FollowUpState>,
    pending: Option<Stage>,
    failure: Option<StepFailure>,
    epoch: u64,
    last_id: i64,
}

fn live<'a>(
    request: &'a mut Option<CodingRequest>,
    step: WorkflowStep,
    action: &'static str,
) -> Result<&'a mut CodingRequest> {
    request.as_mut().ok_or(WorkflowError::InvalidTransition {
        step,
        event: action,
    })
}

fn persist(id: &str, update: RequestUpdate) -> Effect {
    Effect::Persist(Persist::Update {
        id: id.to_string(),
        update,
    })
}

/// Drops the previous run's outcome before a new execution is issued.
fn begin_run(request: &mut CodingRequest) -> RequestUpdate {
    request.output = None;
    request.errors.clear();
    RequestUpdate {
        output: Some(None),
        errors: Some(Vec::new()),
        ..RequestUpdate::status(RequestStatus::Executing)
    }
}

impl Controller {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    /// The live request, if one has been submitted.
    pub fn request(&self) -> Option<&CodingRequest> {
        self.request.as_ref()
    }

    /// Plan text shown in the plan step.
    pub fn draft_plan(&self) -> Option<&str> {
        self.draft_plan.as_deref()
    }

    pub fn follow_up(&self) -> Option<&FollowUpState> {
        self.follow_up.as_ref()
    }

    /// The call currently outstanding.
    pub fn pending(&self) -> Option<Stage> {
        self.pending
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// The last rejected call of the current step.
    pub fn failure(&self) -> Option<&StepFailure> {
        self.failure.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the live request has debug attempts left.
    pub fn can_debug(&self) -> bool {
        self.request.as_ref().is_some_and(CodingRequest::can_debug)
    }

    /// Whether the last execution succeeded and the code step can finish.
    pub fn can_complete(&self) -> bool {
        self.step == WorkflowStep::Code
            && self.request.as_ref().is_some_and(|r| r.output.is_some())
    }

    pub fn login(&mut self, user_id: &str) -> Result<&User> {
        self.session.login(user_id)
    }

    /// Signs out and discards the live request.
    pub fn logout(&mut self) -> Option<User> {
        let user = self.session.logout();
        self.enter(WorkflowStep::Request);
        self.request = None;
        self.draft_plan = None;
        self.follow_up = None;
        if let Some(user) = &user {
            info!("User {} signed out", user.id);
        }
        user
    }

    /// Applies one event and returns the work it requires.
    ///
    /// # Errors
    ///
    /// Intents are refused with [`WorkflowError::Unauthenticated`] when no
    /// user is signed in, [`WorkflowError::InvalidTransition`] when the
    /// current step does not accept them, and [`WorkflowError::Busy`] when
    /// they need a provider call while another is outstanding.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>> {
        if let Some(ticket) = event.ticket() {
            if ticket.epoch != self.epoch {
                debug!(
                    "Dropping stale completion ({}): epoch {} is now {}",
                    event.action(),
                    ticket.epoch,
                    self.epoch
                );
                return Ok(Vec::new());
            }
        } else {
            self.session.require_user()?;
        }

        let action = event.action();
        match event {
            Event::Submit { description } => self.submit(&description, action),
            Event::EditPlan { text } => self.edit_plan(text, action),
            Event::Approve => self.approve(action),
            Event::Back => self.back(action),
            Event::Execute => self.execute(action),
            Event::Debug => self.debug(action),
            Event::Complete => self.complete(action),
            Event::NewRequest => self.new_request(action),
            Event::Retry => self.retry(action),
            Event::Respond { text } => self.respond(&text, action),
            Event::PlanGenerated { result, .. } => {
                if !self.settle(Stage::Plan) {
                    return Ok(Vec::new());
                }
                self.plan_generated(result);
                Ok(Vec::new())
            }
            Event::CodeGenerated { result, .. } => {
                if !self.settle(Stage::Code) {
                    return Ok(Vec::new());
                }
                self.code_generated(result, action)
            }
            Event::Executed { result, .. } => {
                if !self.settle(Stage::Execution) {
                    return Ok(Vec::new());
                }
                self.executed(result, action)
            }
            Event::Debugged { result, .. } => {
                if !self.settle(Stage::Debug) {
                    return Ok(Vec::new());
                }
                self.debugged(result, action)
            }
            Event::FollowUpGenerated {
                explanation,
                question,
                ..
            } => {
                if !self.settle(Stage::FollowUp) {
                    return Ok(Vec::new());
                }
                self.follow_up_generated(explanation, question);
                Ok(Vec::new())
            }
        }
    }

    fn ticket(&self) -> Ticket {
        Ticket { epoch: self.epoch }
    }

    fn enter(&mut self, step: WorkflowStep) {
        if self.step != step {
            info!("Workflow step: {} -> {}", self.step, step);
        }
        self.step = step;
        self.epoch += 1;
        self.pending = None;
        self.failure = None;
    }

    /// Clears the outstanding call if it is `stage`.
    fn settle(&mut self, stage: Stage) -> bool {
        if self.pending == Some(stage) {
            self.pending = None;
            true
        } else {
            debug!("Dropping unexpected {stage} result");
            false
        }
    }

    fn ensure_step(&self, step: WorkflowStep, action: &'static str) -> Result<()> {
        if self.step == step {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                step: self.step,
                event: action,
            })
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.pending {
            Some(stage) => Err(WorkflowError::Busy {
                pending: stage.as_str(),
            }),
            None => Ok(()),
        }
    }

    fn fail(&mut self, stage: Stage, err: &ProviderError) {
        warn!("{stage} failed: {err}");
        self.failure = Some(StepFailure {
            stage,
            message: err.to_string(),
        });
    }

    /// Millisecond id, strictly greater than any id issued before.
    fn next_id(&mut self, now: Timestamp) -> String {
        let id = now.as_millisecond().max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }

    fn submit(&mut self, description: &str, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::Request, action)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(WorkflowError::invalid_input("description").with_reason("must not be empty"));
        }
        let user_id = self.session.require_user()?.id.clone();

        let now = Timestamp::now();
        let request = CodingRequest::new(self.next_id(now), description, now);
        info!("Submitted request {} for {user_id}", request.id);

        self.enter(WorkflowStep::Plan);
        self.draft_plan = None;
        self.follow_up = None;
        self.pending = Some(Stage::Plan);

        let effects = vec![
            Effect::Persist(Persist::Create {
                user_id,
                request: request.clone(),
            }),
            Effect::GeneratePlan {
                ticket: self.ticket(),
                description: request.description.clone(),
            },
        ];
        self.request = Some(request);
        Ok(effects)
    }

    fn plan_generated(&mut self, result: std::result::Result<String, ProviderError>) {
        match result {
            Ok(plan) => {
                let carried = self.request.as_ref().and_then(|r| r.plan.clone());
                if carried.is_some() {
                    debug!("Keeping the previously approved plan");
                }
                self.draft_plan = Some(carried.unwrap_or(plan));
            }
            Err(err) => self.fail(Stage::Plan, &err),
        }
    }

    fn edit_plan(&mut self, text: String, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::Plan, action)?;
        self.ensure_idle()?;
        self.draft_plan = Some(text);
        self.failure = None;
        Ok(Vec::new())
    }

    fn approve(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::Plan, action)?;
        self.ensure_idle()?;
        let plan = self
            .draft_plan
            .clone()
            .filter(|plan| !plan.trim().is_empty())
            .ok_or_else(|| WorkflowError::invalid_input("plan").with_reason("must not be empty"))?;

        self.enter(WorkflowStep::Code);
        self.pending = Some(Stage::Code);
        let ticket = self.ticket();

        let request = live(&mut self.request, self.step, action)?;
        request.plan = Some(plan.clone());
        request.status = RequestStatus::Coding;
        request.code = None;
        request.output = None;
        request.errors.clear();

        Ok(vec![
            persist(
                &request.id,
                RequestUpdate {
                    plan: Some(plan.clone()),
                    ..RequestUpdate::status(RequestStatus::Coding)
                },
            ),
            Effect::GenerateCode {
                ticket,
                description: request.description.clone(),
                plan,
            },
        ])
    }

    fn back(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        match self.step {
            WorkflowStep::Plan => {
                self.enter(WorkflowStep::Request);
                if let Some(request) = self.request.take() {
                    info!("Discarded request {}", request.id);
                }
                self.draft_plan = None;
                Ok(Vec::new())
            }
            WorkflowStep::Code => {
                self.enter(WorkflowStep::Plan);
                self.draft_plan = None;
                self.pending = Some(Stage::Plan);
                let ticket = self.ticket();
                let request = live(&mut self.request, self.step, action)?;
                Ok(vec![Effect::GeneratePlan {
                    ticket,
                    description: request.description.clone(),
                }])
            }
            WorkflowStep::Request | WorkflowStep::FollowUp => {
                Err(WorkflowError::InvalidTransition {
                    step: self.step,
                    event: action,
                })
            }
        }
    }

    fn code_generated(
        &mut self,
        result: std::result::Result<String, ProviderError>,
        action: &'static str,
    ) -> Result<Vec<Effect>> {
        match result {
            Ok(code) => {
                let request = live(&mut self.request, self.step, action)?;
                request.code = Some(code.clone());
                request.status = RequestStatus::Coding;
                Ok(vec![persist(
                    &request.id,
                    RequestUpdate {
                        code: Some(code),
                        ..RequestUpdate::status(RequestStatus::Coding)
                    },
                )])
            }
            Err(err) => {
                self.fail(Stage::Code, &err);
                Ok(Vec::new())
            }
        }
    }

    fn execute(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::Code, action)?;
        self.ensure_idle()?;
        let ticket = self.ticket();
        let request = live(&mut self.request, self.step, action)?;
        let code = request
            .code
            .clone()
            .ok_or_else(|| WorkflowError::invalid_input("code").with_reason("no code has been generated"))?;

        request.status = RequestStatus::Executing;
        let run = begin_run(request);
        let update = persist(&request.id, run);
        self.pending = Some(Stage::Execution);
        self.failure = None;

        Ok(vec![
            update,
            Effect::Execute {
                ticket,
                code,
                after_debug: false,
            },
        ])
    }

    fn executed(
        &mut self,
        result: std::result::Result<ExecutionResult, ProviderError>,
        action: &'static str,
    ) -> Result<Vec<Effect>> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(Stage::Execution, &err);
                let request = live(&mut self.request, self.step, action)?;
                request.status = RequestStatus::Coding;
                return Ok(vec![persist(
                    &request.id,
                    RequestUpdate::status(RequestStatus::Coding),
                )]);
            }
        };

        let request = live(&mut self.request, self.step, action)?;
        request.record_execution(&outcome);
        request.status = if outcome.is_success() {
            info!("Request {} ran successfully", request.id);
            RequestStatus::Coding
        } else {
            info!(
                "Request {} failed with {} error line(s)",
                request.id,
                request.errors.len()
            );
            RequestStatus::Error
        };

        Ok(vec![persist(
            &request.id,
            RequestUpdate {
                output: Some(request.output.clone()),
                errors: Some(request.errors.clone()),
                ..RequestUpdate::status(request.status)
            },
        )])
    }

    fn debug(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::Code, action)?;
        self.ensure_idle()?;
        let ticket = self.ticket();
        let request = live(&mut self.request, self.step, action)?;
        if request.errors.is_empty() {
            return Err(WorkflowError::invalid_input("errors")
                .with_reason("the last execution did not fail"));
        }
        if !request.can_debug() {
            return Err(WorkflowError::DebugBudgetExhausted {
                max: MAX_DEBUG_ATTEMPTS,
            });
        }

        request.debug_attempts += 1;
        request.status = RequestStatus::Coding;
        info!(
            "Debug attempt {}/{MAX_DEBUG_ATTEMPTS} for request {}",
            request.debug_attempts, request.id
        );

        let effects = vec![
            persist(
                &request.id,
                RequestUpdate {
                    debug_attempts: Some(request.debug_attempts),
                    ..RequestUpdate::status(RequestStatus::Coding)
                },
            ),
            Effect::Debug {
                ticket,
                code: request.code.clone().unwrap_or_default(),
                errors: request.errors.clone(),
            },
        ];
        self.pending = Some(Stage::Debug);
        self.failure = None;
        Ok(effects)
    }

    fn debugged(
        &mut self,
        result: std::result::Result<String, ProviderError>,
        action: &'static str,
    ) -> Result<Vec<Effect>> {
        let code = match result {
            Ok(code) => code,
            Err(err) => {
                self.fail(Stage::Debug, &err);
                return Ok(Vec::new());
            }
        };

        let ticket = self.ticket();
        let request = live(&mut self.request, self.step, action)?;
        request.code = Some(code.clone());
        request.status = RequestStatus::Executing;
        let run = RequestUpdate {
            code: Some(code.clone()),
            ..begin_run(request)
        };
        let update = persist(&request.id, run);
        self.pending = Some(Stage::Execution);

        Ok(vec![
            update,
            Effect::Execute {
                ticket,
                code,
                after_debug: true,
            },
        ])
    }

    fn complete(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::Code, action)?;
        self.ensure_idle()?;
        if !self.can_complete() {
            return Err(WorkflowError::invalid_input("execution")
                .with_reason("run the code successfully before completing"));
        }

        self.enter(WorkflowStep::FollowUp);
        self.follow_up = Some(FollowUpState::default());
        self.pending = Some(Stage::FollowUp);
        let ticket = self.ticket();

        let request = live(&mut self.request, self.step, action)?;
        request.status = RequestStatus::Completed;
        info!("Request {} completed", request.id);

        Ok(vec![
            persist(&request.id, RequestUpdate::status(RequestStatus::Completed)),
            Effect::GenerateFollowUp {
                ticket,
                description: request.description.clone(),
                code: request.code.clone().unwrap_or_default(),
                explanation: true,
                question: true,
            },
        ])
    }

    fn follow_up_generated(
        &mut self,
        explanation: Option<std::result::Result<String, ProviderError>>,
        question: Option<std::result::Result<String, ProviderError>>,
    ) {
        let state = self.follow_up.get_or_insert_with(FollowUpState::default);
        if let Some(result) = explanation {
            state.explanation = Half::from_result(result);
        }
        if let Some(result) = question {
            state.question = Half::from_result(result);
        }

        if let Some(message) = state.failure_message() {
            warn!("{} failed: {message}", Stage::FollowUp);
            self.failure = Some(StepFailure {
                stage: Stage::FollowUp,
                message,
            });
        }
    }

    fn retry(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_idle()?;
        let Some(failure) = self.failure.clone() else {
            return Err(WorkflowError::InvalidTransition {
                step: self.step,
                event: action,
            });
        };
        info!("Retrying {}", failure.stage);

        self.failure = None;
        let ticket = self.ticket();
        let request = live(&mut self.request, self.step, action)?;
        let effect = match failure.stage {
            Stage::Plan => Effect::GeneratePlan {
                ticket,
                description: request.description.clone(),
            },
            Stage::Code => Effect::GenerateCode {
                ticket,
                description: request.description.clone(),
                plan: request.plan.clone().unwrap_or_default(),
            },
            Stage::Debug => Effect::Debug {
                ticket,
                code: request.code.clone().unwrap_or_default(),
                errors: request.errors.clone(),
            },
            Stage::Execution => return self.execute(action),
            Stage::FollowUp => {
                let state = self.follow_up.get_or_insert_with(FollowUpState::default);
                let explanation = state.explanation.is_failed();
                let question = state.question.is_failed();
                if explanation {
                    state.explanation = Half::Pending;
                }
                if question {
                    state.question = Half::Pending;
                }
                Effect::GenerateFollowUp {
                    ticket,
                    description: request.description.clone(),
                    code: request.code.clone().unwrap_or_default(),
                    explanation,
                    question,
                }
            }
        };
        self.pending = Some(failure.stage);
        Ok(vec![effect])
    }

    fn respond(&mut self, text: &str, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::FollowUp, action)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkflowError::invalid_input("response").with_reason("must not be empty"));
        }
        self.follow_up
            .get_or_insert_with(FollowUpState::default)
            .replies
            .push(text.to_string());
        Ok(Vec::new())
    }

    fn new_request(&mut self, action: &'static str) -> Result<Vec<Effect>> {
        self.ensure_step(WorkflowStep::FollowUp, action)?;
        self.enter(WorkflowStep::Request);
        self.request = None;
        self.draft_plan = None;
        self.follow_up = None;
        Ok(Vec::new())
    }
}
