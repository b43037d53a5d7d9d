// SPDX-License-Identifier: MIT

//! User profile model for the onboarding flow.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// One profile row per user, keyed by the identity provider's user id.
///
/// Invariant (enforced at write time): `onboarding_completed == true` implies
/// all three answers are present and non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider user id (primary key, not owned by this app).
    pub id: String,
    pub question_1_answer: Option<String>,
    pub question_2_answer: Option<String>,
    pub question_3_answer: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl UserProfile {
    /// Initial row created right after signup, before onboarding.
    pub fn initial(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question_1_answer: None,
            question_2_answer: None,
            question_3_answer: None,
            onboarding_completed: false,
        }
    }

    /// Completed row written by the onboarding submission handler.
    pub fn completed(id: impl Into<String>, answers: [String; 3]) -> Self {
        let [a1, a2, a3] = answers;
        Self {
            id: id.into(),
            question_1_answer: Some(a1),
            question_2_answer: Some(a2),
            question_3_answer: Some(a3),
            onboarding_completed: true,
        }
    }
}

/// Body of `POST /api/onboarding`.
///
/// Fields default to `None` so a missing key is reported as a validation
/// failure instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingSubmission {
    #[serde(default)]
    pub question1: Option<String>,
    #[serde(default)]
    pub question2: Option<String>,
    #[serde(default)]
    pub question3: Option<String>,
}

impl OnboardingSubmission {
    /// Validate all three answers and return them trimmed.
    ///
    /// Absent, empty, or whitespace-only answers are rejected before any
    /// write is attempted.
    pub fn validated(&self) -> Result<[String; 3], AppError> {
        let answers = [&self.question1, &self.question2, &self.question3];
        let mut trimmed = Vec::with_capacity(3);
        for answer in answers {
            match answer.as_deref().map(str::trim) {
                Some(a) if !a.is_empty() => trimmed.push(a.to_string()),
                _ => {
                    return Err(AppError::Validation(
                        "All questions must be answered".to_string(),
                    ))
                }
            }
        }
        Ok([
            trimmed.remove(0),
            trimmed.remove(0),
            trimmed.remove(0),
        ])
    }
}
