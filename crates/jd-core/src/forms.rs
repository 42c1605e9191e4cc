//! Validation of ticket forms before anything reaches the network.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SUMMARY_MIN_CHARS: usize = 5;
pub const SUMMARY_MAX_CHARS: usize = 255;

/// A form field that failed validation.
///
/// Reported next to the offending field; submission stays blocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must contain at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} cannot exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("at least one field must change")]
    NothingToUpdate,

    #[error("a comment is required to apply \"{transition}\"")]
    ClosureCommentRequired { transition: String },

    #[error("transition \"{0}\" is not available for this ticket")]
    UnknownTransition(String),

    #[error("no transition selected")]
    NoTransitionSelected,
}

impl ValidationError {
    /// Form field the error should be displayed next to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. } => field,
            ValidationError::NothingToUpdate => "form",
            ValidationError::ClosureCommentRequired { .. } => "comment",
            ValidationError::UnknownTransition(_) | ValidationError::NoTransitionSelected => {
                "transition"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Localised name for the generic issue types the tracker knows.
pub fn translate_issue_type(name: &str) -> String {
    match name.trim().to_lowercase().as_str() {
        "task" => "Tâche".to_string(),
        "bug" => "Bug".to_string(),
        "story" => "Story".to_string(),
        "epic" => "Epic".to_string(),
        _ => name.trim().to_string(),
    }
}

/// Whether `label` designates "no assignee" in any of the accepted spellings.
pub fn is_unassigned_label(label: &str) -> bool {
    matches!(
        label.trim().to_lowercase().as_str(),
        "non assigné" | "non-assigne" | "non assigne" | "unassigned"
    )
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn check_summary(summary: &str) -> Result<()> {
    let chars = summary.chars().count();
    if chars < SUMMARY_MIN_CHARS {
        return Err(ValidationError::TooShort {
            field: "summary",
            min: SUMMARY_MIN_CHARS,
        });
    }
    if chars > SUMMARY_MAX_CHARS {
        return Err(ValidationError::TooLong {
            field: "summary",
            max: SUMMARY_MAX_CHARS,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Raw values of the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTicketForm {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub priority: String,
    pub assignee: String,
}

/// Body of `POST /tickets`, built only from a validated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl NewTicketForm {
    pub fn validate(&self) -> Result<NewTicket> {
        let summary = non_blank(&self.summary).ok_or(ValidationError::Required { field: "summary" })?;
        check_summary(&summary)?;

        let issue_type = non_blank(&self.issue_type)
            .map(|t| translate_issue_type(&t))
            .ok_or(ValidationError::Required { field: "issueType" })?;

        Ok(NewTicket {
            summary,
            description: self.description.trim().to_string(),
            issue_type,
            priority: non_blank(&self.priority),
            assignee: non_blank(&self.assignee),
        })
    }
}

// ---------------------------------------------------------------------------
// Edition
// ---------------------------------------------------------------------------

/// Editable fields of a ticket, as shown in the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFields {
    pub summary: String,
    pub description: String,
    pub priority: String,
    pub issue_type: String,
    pub assignee: String,
}

/// Body of `PUT /tickets/{key}`: only the fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl TicketUpdate {
    /// Diff an edited form against the values it was opened with.
    ///
    /// Blank fields are left untouched rather than cleared.
    pub fn from_edit(original: &TicketFields, edited: &TicketFields) -> Result<Self> {
        let changed = |before: &str, after: &str| {
            non_blank(after).filter(|value| value.as_str() != before.trim())
        };

        let update = TicketUpdate {
            summary: changed(&original.summary, &edited.summary),
            description: changed(&original.description, &edited.description),
            priority: changed(&original.priority, &edited.priority),
            issue_type: changed(&original.issue_type, &edited.issue_type),
            assignee: changed(&original.assignee, &edited.assignee),
        };

        if update.is_empty() {
            return Err(ValidationError::NothingToUpdate);
        }
        if let Some(summary) = &update.summary {
            check_summary(summary)?;
        }
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.issue_type.is_none()
            && self.assignee.is_none()
    }
}
