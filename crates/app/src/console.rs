//! Line-oriented presentation layer over the session gate and assessment stepper.

use std::fmt;
use std::io::{self, Write};

use assess_core::model::{OptionId, QuestionId, Route, RouteDecision, StepNumber};
use services::{
    AssessmentIntent, AssessmentService, AssessmentSession, AssessmentSubmission, Credentials,
    IntentOutcome, LoginOutcome, SessionGate,
};

/// Redirect chains are at most two hops (e.g. `/login` → `/` → `/onboarding`).
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Onboard,
    Go(Route),
    Next,
    Prev,
    Jump(StepNumber),
    /// Option for the current question: an option id or its 1-based position.
    Answer(String),
    AnswerFor { question: QuestionId, option: OptionId },
    Submit,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    Usage(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd} (try `help`)"),
            CommandError::Usage(usage) => write!(f, "usage: {usage}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    /// # Errors
    ///
    /// Returns `CommandError` for blank input, unknown verbs, or bad arguments.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = parts.collect();
        let cmd = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("login", [email, password]) => Self::Login {
                email: (*email).to_owned(),
                password: (*password).to_owned(),
            },
            ("login", _) => return Err(CommandError::Usage("login <email> <password>")),
            ("logout", []) => Self::Logout,
            ("onboard", []) => Self::Onboard,
            ("go", [path]) => Self::Go(Route::parse(path)),
            ("go", _) => return Err(CommandError::Usage("go <path>")),
            ("next", []) => Self::Next,
            ("prev" | "back", []) => Self::Prev,
            ("jump", [step]) => Self::Jump(
                step.parse()
                    .map_err(|_| CommandError::Usage("jump <step>"))?,
            ),
            ("jump", _) => return Err(CommandError::Usage("jump <step>")),
            ("answer", [option]) => Self::Answer((*option).to_owned()),
            ("answer", [question, option]) => Self::AnswerFor {
                question: question
                    .parse()
                    .map_err(|_| CommandError::Usage("answer <question> <option>"))?,
                option: option
                    .parse()
                    .map_err(|_| CommandError::Usage("answer <question> <option>"))?,
            },
            ("answer", _) => return Err(CommandError::Usage("answer [<question>] <option>")),
            ("submit", []) => Self::Submit,
            ("status", []) => Self::Status,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => return Err(CommandError::Unknown(verb.to_owned())),
        };
        Ok(cmd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Holds the route the user is on and, while on the stepper, the live attempt.
pub struct Console {
    gate: SessionGate,
    assessments: AssessmentService,
    route: Route,
    email: Option<String>,
    session: Option<AssessmentSession>,
    submission: Option<AssessmentSubmission>,
}

impl Console {
    #[must_use]
    pub fn new(gate: SessionGate, assessments: AssessmentService) -> Self {
        Self {
            gate,
            assessments,
            route: Route::Home,
            email: None,
            session: None,
            submission: None,
        }
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    #[must_use]
    pub fn session(&self) -> Option<&AssessmentSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn submission(&self) -> Option<&AssessmentSubmission> {
        self.submission.as_ref()
    }

    /// Resolve the initial route and render it.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing fails.
    pub async fn start(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.navigate(Route::Home, out).await?;
        self.render(out)
    }

    /// # Errors
    ///
    /// Returns `io::Error` if writing fails. Service failures are reported to `out`.
    pub async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        match Command::parse(line) {
            Ok(cmd) => self.handle(cmd, out).await,
            Err(err) => {
                writeln!(out, "{err}")?;
                Ok(Flow::Continue)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `io::Error` if writing fails.
    pub async fn handle(&mut self, cmd: Command, out: &mut impl Write) -> io::Result<Flow> {
        match cmd {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                print_help(out)?;
                return Ok(Flow::Continue);
            }
            Command::Status => {
                let status = self.gate.status().await;
                writeln!(out, "route: {}  status: {status:?}", self.route)?;
                return Ok(Flow::Continue);
            }
            Command::Login { email, password } => {
                self.login(Credentials::new(email, password), out).await?;
            }
            Command::Logout => {
                if let Err(err) = self.gate.logout().await {
                    writeln!(out, "logout failed: {err}")?;
                }
                self.email = None;
                self.session = None;
                self.submission = None;
                self.navigate(Route::Login, out).await?;
            }
            Command::Onboard => match self.gate.complete_onboarding().await {
                Ok(()) => self.navigate(Route::Home, out).await?,
                Err(err) => writeln!(out, "cannot complete onboarding: {err}")?,
            },
            Command::Go(route) => self.navigate(route, out).await?,
            Command::Next => self.apply(AssessmentIntent::Next, out).await?,
            Command::Prev => self.apply(AssessmentIntent::Prev, out).await?,
            Command::Jump(step) => self.apply(AssessmentIntent::Jump(step), out).await?,
            Command::Submit => self.apply(AssessmentIntent::Submit, out).await?,
            Command::AnswerFor { question, option } => {
                self.apply(AssessmentIntent::Answer { question, option }, out)
                    .await?;
            }
            Command::Answer(choice) => match self.answer_intent(&choice) {
                Some(intent) => self.apply(intent, out).await?,
                None => writeln!(out, "no question to answer here")?,
            },
        }
        self.render(out)?;
        Ok(Flow::Continue)
    }

    async fn login(&mut self, credentials: Credentials, out: &mut impl Write) -> io::Result<()> {
        match self.gate.login(&credentials).await {
            Ok(LoginOutcome::Accepted { email, .. }) => {
                writeln!(out, "signed in as {email}")?;
                self.email = Some(email);
                self.navigate(Route::Home, out).await
            }
            Ok(LoginOutcome::Rejected) => writeln!(out, "invalid email or password"),
            Err(err) => writeln!(out, "login failed: {err}"),
        }
    }

    /// Follow the guard's redirects, then prepare the target page.
    async fn navigate(&mut self, route: Route, out: &mut impl Write) -> io::Result<()> {
        let mut target = route;
        for _ in 0..MAX_REDIRECTS {
            match self.gate.resolve(&target).await {
                RouteDecision::Stay => break,
                RouteDecision::Redirect(next) => target = next,
            }
        }
        if target == Route::Login {
            self.session = None;
            self.submission = None;
        }
        if target == Route::Assessment && self.session.is_none() {
            match self.assessments.start().await {
                Ok(session) => self.session = Some(session),
                Err(err) => {
                    writeln!(out, "cannot start assessment: {err}")?;
                    target = Route::Home;
                }
            }
        }
        self.route = target;
        Ok(())
    }

    /// Re-check the session, then hand the intent to the stepper.
    async fn apply(&mut self, intent: AssessmentIntent, out: &mut impl Write) -> io::Result<()> {
        if self.route != Route::Assessment {
            return writeln!(out, "open the assessment first (go /assessment)");
        }
        self.navigate(Route::Assessment, out).await?;
        let now = self.assessments.clock().now();
        let outcome = match (&self.route, self.session.as_mut()) {
            (Route::Assessment, Some(session)) => session.dispatch(intent, now),
            _ => return writeln!(out, "session ended; sign in again"),
        };
        match outcome {
            IntentOutcome::Blocked => writeln!(out, "answer the question to continue")?,
            IntentOutcome::AtFinalStep => writeln!(out, "last step reached; use `submit`")?,
            IntentOutcome::Ignored => writeln!(out, "ignored")?,
            IntentOutcome::Submitted(submission) => {
                self.session = None;
                self.submission = Some(submission);
                self.navigate(Route::Results, out).await?;
            }
            IntentOutcome::Moved(_) | IntentOutcome::Unchanged | IntentOutcome::Answered => {}
        }
        Ok(())
    }

    fn answer_intent(&self, choice: &str) -> Option<AssessmentIntent> {
        let session = self.session.as_ref()?;
        let question = session.current_question()?;
        let option = match choice.parse::<usize>() {
            Ok(n) if n >= 1 => question.options().get(n - 1).map(|o| o.id.clone())?,
            _ => OptionId::new(choice).ok()?,
        };
        Some(AssessmentIntent::Answer {
            question: question.id().clone(),
            option,
        })
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "── {} ──", self.route)?;
        match &self.route {
            Route::Login => writeln!(out, "Sign in: login <email> <password>"),
            Route::Onboarding => {
                writeln!(out, "Welcome! This is your first sign-in.")?;
                writeln!(out, "Type `onboard` to finish onboarding, or `logout`.")
            }
            Route::Home => {
                let who = self.email.as_deref().unwrap_or("returning user");
                writeln!(out, "Signed in ({who}). `go /assessment` to start the self-assessment.")
            }
            Route::Assessment => match &self.session {
                Some(session) => render_step(session, out),
                None => writeln!(out, "No assessment in progress."),
            },
            Route::Results => self.render_results(out),
            Route::Other(path) => writeln!(out, "Nothing at {path}."),
        }
    }

    fn render_results(&self, out: &mut impl Write) -> io::Result<()> {
        let Some(submission) = &self.submission else {
            return writeln!(out, "No submitted assessment yet.");
        };
        writeln!(
            out,
            "Attempt {} submitted at {}",
            submission.attempt_id, submission.submitted_at
        )?;
        for (question, option) in submission.answers.iter() {
            writeln!(out, "  {question}: {option}")?;
        }
        writeln!(out, "(scores are not computed in this build)")
    }
}

fn render_step(session: &AssessmentSession, out: &mut impl Write) -> io::Result<()> {
    let view = session.view();
    let pct = session.progress().percent();
    writeln!(
        out,
        "[{}/{}] {pct}%  {}",
        view.current_step, view.total_steps, view.step_title
    )?;
    match view.question {
        Some(question) => {
            writeln!(out, "{} / {}", question.category(), question.topic())?;
            writeln!(out, "{}", question.prompt())?;
            if !question.help_text().is_empty() {
                writeln!(out, "  ({})", question.help_text())?;
            }
            for (i, option) in question.options().iter().enumerate() {
                let marker = if view.selected == Some(&option.id) { "*" } else { " " };
                writeln!(out, " {marker} {}. [{}] {}", i + 1, option.id, option.text)?;
            }
        }
        None => writeln!(out, "(no question on this step)")?,
    }
    if view.is_final_step {
        let submit = if view.submit_allowed { "submit" } else { "answer, then submit" };
        writeln!(out, "final step: {submit}")
    } else {
        let next = if view.next_allowed { "next" } else { "answer to unlock next" };
        writeln!(out, "{next} | prev | jump <1..={}>", view.current_step)
    }
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "commands:")?;
    writeln!(out, "  login <email> <password>   sign in")?;
    writeln!(out, "  logout                     sign out and discard answers")?;
    writeln!(out, "  onboard                    finish onboarding")?;
    writeln!(out, "  go <path>                  open /, /assessment, /results, ...")?;
    writeln!(out, "  next | prev | jump <n>     move through the steps")?;
    writeln!(out, "  answer <n|option-id>       answer the current question")?;
    writeln!(out, "  answer <question> <option> answer a specific question")?;
    writeln!(out, "  submit                     finish from the last step")?;
    writeln!(out, "  status | help | quit")
}
