//! The oracle's verdict on one turn, and the wire shape it arrives in.

use crate::letters::parse_letter;
use crate::oracle::ProtocolError;
use crate::Tool;
use serde::Deserialize;

/// A line or couplet of poetry, optionally attributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    pub text: String,
    pub poet: Option<String>,
}

impl Verse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            poet: None,
        }
    }

    pub fn by(mut self, poet: impl Into<String>) -> Self {
        self.poet = Some(poet.into());
        self
    }
}

/// The oracle's response to one turn.
///
/// Consumed once by the controller and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentVerdict {
    /// Whether the submitted verse was accepted.
    pub is_valid: bool,
    /// Feedback for the player, shown verbatim on rejection or victory.
    pub feedback_message: String,
    /// The opponent's reply verse, if it produced one.
    pub opponent_verse: Option<Verse>,
    /// Letter the player's next verse must begin with.
    pub next_required_letter: Option<char>,
    /// The opponent concedes. Absent in the reply means `false`.
    pub is_winner: bool,
}

impl JudgmentVerdict {
    /// An accepted verse with no reply yet attached.
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            feedback_message: message.into(),
            opponent_verse: None,
            next_required_letter: None,
            is_winner: false,
        }
    }

    /// A rejected verse.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            ..Self::accepted(message)
        }
    }

    pub fn with_verse(mut self, verse: Verse) -> Self {
        self.opponent_verse = Some(verse);
        self
    }

    pub fn with_next_letter(mut self, letter: char) -> Self {
        self.next_required_letter = Some(letter);
        self
    }

    pub fn winner(mut self) -> Self {
        self.is_winner = true;
        self
    }

    /// Validate a structured reply and convert it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProtocolError> {
        if value.is_null() {
            return Err(ProtocolError::Empty);
        }
        let wire: WireVerdict =
            serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        wire.into_verdict()
    }

    /// Parse a reply the model wrote out as text instead of a tool call.
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        let body = json_body(text.trim());
        if body.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }
}

/// Record the verdict on the player's verse and, if accepted, your reply verse
#[derive(Debug, Deserialize, Tool)]
#[tool(name = "record_verdict")]
#[serde(rename_all = "camelCase")]
pub struct WireVerdict {
    /// Whether the user's input is a valid Persian verse matching the rules.
    #[tool(required)]
    is_valid: Option<bool>,
    /// Feedback message to the user in Persian. Explain why if invalid.
    #[tool(required)]
    message: Option<String>,
    /// The next verse recited by the AI. Null if user input was invalid.
    #[serde(default)]
    bot_verse: Option<String>,
    /// Name of the poet of the bot's verse.
    #[serde(default)]
    bot_verse_poet: Option<String>,
    /// The last letter of the bot's verse, which the user must use to start.
    #[serde(default)]
    #[tool(max_length = 1)]
    next_letter: Option<String>,
    /// True if the bot cannot continue or admits defeat.
    #[serde(default)]
    is_winner: Option<bool>,
}

impl WireVerdict {
    fn into_verdict(self) -> Result<JudgmentVerdict, ProtocolError> {
        let is_valid = self.is_valid.ok_or(ProtocolError::MissingField("isValid"))?;
        let feedback_message = self.message.ok_or(ProtocolError::MissingField("message"))?;

        let opponent_verse = non_blank(self.bot_verse).map(|text| Verse {
            text,
            poet: non_blank(self.bot_verse_poet),
        });

        Ok(JudgmentVerdict {
            is_valid,
            feedback_message: feedback_message.trim().to_string(),
            opponent_verse,
            next_required_letter: self.next_letter.as_deref().and_then(parse_letter),
            is_winner: self.is_winner.unwrap_or(false),
        })
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The JSON object inside a reply, dropping code fences (of any info
/// string) and prose around it.
fn json_body(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
