//! Chat Controller
//!
//! Holds the chat session state (current model, transcript, in-flight flag)
//! and turns user and stream events into effects. `handle` is pure, no I/O
//! and no clocks, so the chat flow is testable without a UI or a server.

use crate::api::chat::{ChatRequest, GenerateOptions, Transcript};

/// Inputs to the controller: user actions and stream events
#[derive(Debug, Clone)]
pub enum Command {
    /// Pick the model used for the next request
    SelectModel(String),

    /// Switch to a session, replacing the working transcript
    SelectSession { name: String, transcript: Transcript },

    /// User submitted a prompt
    Submit(String),

    /// A reply text fragment arrived
    Fragment(String),

    /// The reply stream completed
    ReplyDone,

    /// The request or stream failed
    ReplyFailed(String),

    /// Drop the working transcript
    ClearTranscript,
}

/// Outputs: what the surrounding shell should do next
#[derive(Debug, Clone)]
pub enum Effect {
    /// Start a chat request with the full history
    BeginRequest(ChatRequest),

    /// Show a reply fragment as it arrives
    AppendOutput(String),

    /// Push the working transcript to the server-side history
    PersistTranscript,

    /// Show an error to the user
    ShowError(String),
}

/// Chat session state machine: idle, or waiting for a reply
pub struct Controller {
    model: Option<String>,
    session: Option<String>,
    transcript: Transcript,
    options: GenerateOptions,
    /// Reply text received so far for the in-flight request
    pending_reply: String,
    busy: bool,
}

impl Controller {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            model: None,
            session: None,
            transcript: Transcript::new(),
            options,
            pending_reply: String::new(),
            busy: false,
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn options_mut(&mut self) -> &mut GenerateOptions {
        &mut self.options
    }

    /// Whether a reply is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Apply one command and return the effects to run
    pub fn handle(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::SelectModel(model) => {
                self.model = Some(model);
                Vec::new()
            }

            Command::SelectSession { name, transcript } => {
                self.session = Some(name);
                self.transcript = transcript;
                self.pending_reply.clear();
                self.busy = false;
                Vec::new()
            }

            Command::Submit(text) => self.submit(text),

            Command::Fragment(text) => {
                if !self.busy {
                    return Vec::new();
                }
                self.pending_reply.push_str(&text);
                vec![Effect::AppendOutput(text)]
            }

            Command::ReplyDone => {
                if !self.busy {
                    return Vec::new();
                }
                self.commit_pending_reply();
                vec![Effect::PersistTranscript]
            }

            Command::ReplyFailed(reason) => {
                if !self.busy {
                    return vec![Effect::ShowError(reason)];
                }
                // Keep whatever the user already saw
                let partial = !self.pending_reply.is_empty();
                self.commit_pending_reply();
                let mut effects = Vec::new();
                if partial {
                    effects.push(Effect::PersistTranscript);
                }
                effects.push(Effect::ShowError(reason));
                effects
            }

            Command::ClearTranscript => {
                self.transcript = Transcript::new();
                self.pending_reply.clear();
                Vec::new()
            }
        }
    }

    fn submit(&mut self, text: String) -> Vec<Effect> {
        // One reply at a time; a submit while waiting is dropped
        if self.busy {
            return Vec::new();
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            return Vec::new();
        }

        let Some(model) = self.model.clone() else {
            return vec![Effect::ShowError("no model selected".to_string())];
        };

        self.transcript.push_user(text);
        self.busy = true;
        self.pending_reply.clear();

        let request =
            ChatRequest::new(model, &self.transcript).with_options(self.options.clone());
        vec![Effect::BeginRequest(request)]
    }

    fn commit_pending_reply(&mut self) {
        if !self.pending_reply.is_empty() {
            let reply = std::mem::take(&mut self.pending_reply);
            self.transcript.push_assistant(reply);
        }
        self.busy = false;
    }
}
