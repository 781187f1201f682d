//! Prompt builders for the two service contracts.

use std::fmt::Write;

use skald_core::service::{ProseRequest, ReasoningRequest};

use crate::wire::ChatMessage;

const REASONING_SYSTEM: &str = "You decide the next action of one character in a turn-based \
story. Stay in character. Choose exactly one of the offered actions and answer with a JSON \
object only: {\"chosen_action\": \"<label>\", \"rationale\": \"<one sentence>\"}.";

/// Messages asking the model to pick one of `request.allowed_actions`.
#[must_use]
pub fn reasoning_messages(request: &ReasoningRequest) -> Vec<ChatMessage> {
    let mut user = String::new();
    let _ = writeln!(user, "Turn {}.", request.turn);
    let _ = writeln!(user, "Character profile: {}", request.character_profile);
    user.push('\n');
    user.push_str(request.context.trim_end());
    user.push_str("\n\nOffered actions (answer with the label):\n");
    for option in &request.allowed_actions {
        let _ = writeln!(user, "- {}", option.label);
    }
    vec![ChatMessage::system(REASONING_SYSTEM), ChatMessage::user(user)]
}

/// Messages asking the model to narrate one turn.
#[must_use]
pub fn prose_messages(request: &ProseRequest) -> Vec<ChatMessage> {
    let system = format!(
        "You are the chronicler of a turn-based story. {} Mention every one of these \
         characters by name: {}. Reply with the prose only.",
        request.style.guidance(),
        request.characters.join(", ")
    );
    let mut user = format!("Turn {}. What happened:\n", request.turn);
    for beat in &request.beats {
        let _ = writeln!(user, "- {beat}");
    }
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
