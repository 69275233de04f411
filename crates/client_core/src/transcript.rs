use shared::domain::{ChatData, Message, Participant, ParticipantId, Role, Room};

/// Display name synthesized for senders missing from the roster.
pub const UNKNOWN_SENDER_NAME: &str = "King Customer";

/// The live, append-only message list and participant roster for the active
/// room. Seeded from the first room of the loaded fixture; only `append`
/// mutates it afterwards. Display order equals list order, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    room: Option<Room>,
    messages: Vec<Message>,
    participants: Vec<Participant>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wholesale re-seed from the first room entry. Idempotent; an empty
    /// fixture clears the transcript.
    pub fn seed(&mut self, data: &ChatData) {
        match data.results.first() {
            Some(entry) => {
                self.room = Some(entry.room.clone());
                self.messages = entry.comments.clone();
                self.participants = entry.room.participant.clone();
            }
            None => {
                self.room = None;
                self.messages.clear();
                self.participants.clear();
            }
        }
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Linear roster lookup. A miss synthesizes a placeholder customer and
    /// never writes it back into the roster.
    pub fn resolve_participant(&self, sender: &ParticipantId) -> Participant {
        self.participants
            .iter()
            .find(|participant| &participant.id == sender)
            .cloned()
            .unwrap_or_else(|| Participant {
                id: sender.clone(),
                name: UNKNOWN_SENDER_NAME.to_string(),
                role: Role::Customer,
            })
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn is_own(&self, message: &Message, current_user: &ParticipantId) -> bool {
        &message.sender == current_user
    }
}

#[cfg(test)]
#[path = "tests/transcript_tests.rs"]
mod tests;
