//! Chat widget controller: transcript, input field and the lead-capture form.
//!
//! All UI state lives in [`WidgetState`]; rendering is done by free functions
//! over it, and every network call goes through a [`ChatApi`].

use crate::chat_api::{AskOutcome, ChatApi};
use crate::model::{ChatMessage, ContactRecord, Origin};
use tracing::error;

pub const CONNECTION_ERROR: &str = "Error al conectar con el servidor.";
pub const CONTACT_THANKS: &str =
    "Gracias por proporcionar tus datos de contacto. Nos pondremos en contacto contigo pronto.";
const GREETING_MARKER: &str = "¡hola! soy un asistente experto";
const UNKNOWN_ERROR: &str = "error desconocido";

/// Returns true when `answer` is the assistant's canned greeting.
///
/// The match is a lowercase substring check: case-insensitive, but accents
/// and other diacritics must match exactly. The greeting never asks for
/// contact data, so a `requires_contact` flag riding on it is ignored.
pub fn is_greeting_answer(answer: &str) -> bool {
    answer.to_lowercase().contains(GREETING_MARKER)
}

pub fn should_request_contact(requires_contact: bool, answer: &str) -> bool {
    requires_contact && !is_greeting_answer(answer)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    pub input: String,
    pub transcript: Vec<ChatMessage>,
    pub contact: ContactForm,
}

impl WidgetState {
    fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
    }
}

pub fn render_message(message: &ChatMessage) -> String {
    let label = match message.origin {
        Origin::User => "Tú:",
        Origin::Bot => "Bot:",
    };
    format!("{label} {}", message.text)
}

pub fn render_transcript(state: &WidgetState) -> Vec<String> {
    state.transcript.iter().map(render_message).collect()
}

pub struct ChatWidget<A> {
    state: WidgetState,
    api: A,
}

impl<A: ChatApi> ChatWidget<A> {
    pub fn new(api: A) -> Self {
        Self {
            state: WidgetState::default(),
            api,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Mutable access for the front-end to type into the input and form fields.
    pub fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub fn show_contact_form(&mut self) {
        self.state.contact.visible = true;
    }

    pub fn hide_contact_form(&mut self) {
        self.state.contact = ContactForm::default();
    }

    pub async fn send_message(&mut self) {
        let question = self.state.input.trim().to_string();
        if question.is_empty() {
            return;
        }
        self.state.push(ChatMessage::user(question.clone()));
        self.state.input.clear();

        match self.api.ask(&question).await {
            Ok(AskOutcome::Answer {
                answer,
                requires_contact,
            }) => {
                let wants_contact = should_request_contact(requires_contact, &answer);
                self.state.push(ChatMessage::bot(answer));
                if wants_contact {
                    self.show_contact_form();
                }
            }
            Ok(AskOutcome::Rejected(reason)) => {
                self.state.push(ChatMessage::bot(format!("Error: {reason}")));
            }
            Err(err) => {
                error!(?err, "ask request failed");
                self.state.push(ChatMessage::bot(CONNECTION_ERROR));
            }
        }
    }

    pub async fn send_contact(&mut self) {
        let form = &self.state.contact;
        let Some(contact) = ContactRecord::from_fields(&form.name, &form.email, &form.organization)
        else {
            return;
        };

        match self.api.submit_contact(&contact).await {
            Ok(reply) if reply.success => {
                self.state.push(ChatMessage::bot(CONTACT_THANKS));
                self.hide_contact_form();
            }
            Ok(reply) => {
                let reason = reply
                    .error
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .unwrap_or(UNKNOWN_ERROR);
                self.state.push(ChatMessage::bot(format!("Error: {reason}")));
            }
            Err(err) => {
                error!(?err, "contact request failed");
                self.state.push(ChatMessage::bot(CONNECTION_ERROR));
            }
        }
    }
}
