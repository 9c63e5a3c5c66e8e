// todo.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the remote store. Some backends hand out integers,
/// others strings; both are kept as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireId", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Int(i64),
}

impl TryFrom<WireId> for RecordId {
    type Error = String;

    fn try_from(raw: WireId) -> Result<Self, Self::Error> {
        let id = match raw {
            WireId::Text(s) => s,
            WireId::Int(n) => n.to_string(),
        };
        if id.trim().is_empty() {
            return Err("record id is empty".to_string());
        }
        Ok(Self(id))
    }
}

/// An item in the active collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", rename_all = "camelCase")]
pub struct Todo {
    pub id: RecordId,
    pub question: Option<String>,
    pub question_number: String,
    pub answer: String,
}

/// An item in the archived collection. Its id lives in a different id space
/// from the Todo it was completed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", rename_all = "camelCase")]
pub struct ArchivedTodo {
    pub id: RecordId,
    pub question: Option<String>,
    pub question_number: String,
    pub answer: String,
    pub archived: bool,
}

/// Body posted to the active collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub answer: String,
    pub question_number: String,
    pub question: String,
}

impl NewTodo {
    /// The displayed question is derived from the answer itself.
    pub fn new(answer: &str, question_number: &str) -> Self {
        Self {
            answer: answer.to_string(),
            question_number: question_number.to_string(),
            question: answer.to_string(),
        }
    }
}

/// Body posted to the archived collection when a Todo is completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArchivedTodo {
    pub answer: String,
    pub question_number: String,
    pub archived: bool,
}

impl From<&Todo> for NewArchivedTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            answer: todo.answer.clone(),
            question_number: todo.question_number.clone(),
            archived: true,
        }
    }
}

// Wire shape shared by both collections. Records are checked here, before
// anything reaches the mirrors.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    id: RecordId,
    #[serde(default)]
    question: Option<String>,
    question_number: Option<QuestionNumber>,
    answer: Option<String>,
    #[serde(default)]
    archived: Option<bool>,
}

// Forms post the number as text but hand-edited stores often hold integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionNumber {
    Text(String),
    Int(i64),
}

impl From<QuestionNumber> for String {
    fn from(n: QuestionNumber) -> Self {
        match n {
            QuestionNumber::Text(s) => s,
            QuestionNumber::Int(n) => n.to_string(),
        }
    }
}

impl RawRecord {
    fn required(self) -> Result<(RecordId, Option<String>, String, String, Option<bool>), String> {
        let question_number = self
            .question_number
            .map(String::from)
            .ok_or_else(|| format!("record {} is missing questionNumber", self.id))?;
        let answer = self
            .answer
            .ok_or_else(|| format!("record {} is missing answer", self.id))?;
        Ok((self.id, self.question, question_number, answer, self.archived))
    }
}

impl TryFrom<RawRecord> for Todo {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let (id, question, question_number, answer, archived) = raw.required()?;
        if archived == Some(true) {
            return Err(format!("active record {} is flagged as archived", id));
        }
        Ok(Todo {
            id,
            question,
            question_number,
            answer,
        })
    }
}

impl TryFrom<RawRecord> for ArchivedTodo {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let (id, question, question_number, answer, archived) = raw.required()?;
        if archived != Some(true) {
            return Err(format!("archived record {} is not flagged as archived", id));
        }
        Ok(ArchivedTodo {
            id,
            question,
            question_number,
            answer,
            archived: true,
        })
    }
}
