//! Contact page: info/social data and the contact form.
//!
//! Validation failures are returned to the caller so they can be shown next
//! to the field. When the backend is unreachable or failing (5xx) the
//! submission is queued locally and the visitor gets the same confirmation
//! as on success. A rejection by the backend is returned as an error.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ApiError, ContentService};
use crate::content::{self, Fetched};
use crate::db::{self, Pool};
use crate::fallback::Catalog;
use crate::model::{ContactInfo, ContactSubmission, SocialMedia};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

pub const CONFIRMATION_MESSAGE: &str =
    "Thank you for your message! We will get back to you as soon as possible.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("please enter a valid email address")]
    InvalidEmail,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("contact backend rejected submission: {0}")]
    Rejected(ApiError),
    #[error("failed to queue submission: {0:#}")]
    Queue(anyhow::Error),
}

impl ValidationError {
    /// The form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing(field) => *field,
            ValidationError::InvalidEmail => "email",
        }
    }
}

/// Raw form input as typed by the visitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ContactSubmission, ValidationError> {
        let required = [
            ("name", self.name.trim()),
            ("email", self.email.trim()),
            ("subject", self.subject.trim()),
            ("message", self.message.trim()),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ValidationError::Missing(field));
            }
        }
        let email = self.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }

        let phone = Some(self.phone.trim()).filter(|p| !p.is_empty());
        Ok(ContactSubmission {
            name: self.name.trim().to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent { message: String },
    /// Stored locally; `reference` identifies the queued row.
    Queued { reference: String, message: String },
}

impl SubmitOutcome {
    /// What the visitor sees. Identical in shape for both outcomes.
    pub fn message(&self) -> &str {
        match self {
            SubmitOutcome::Sent { message } | SubmitOutcome::Queued { message, .. } => message,
        }
    }
}

/// Validate and deliver a contact form, queueing it locally if the backend
/// cannot be reached.
pub async fn submit(
    service: &dyn ContentService,
    pool: &Pool,
    form: &ContactForm,
) -> Result<SubmitOutcome, SubmitError> {
    let submission = form.validate()?;

    match service.submit_contact(&submission).await {
        Ok(message) => {
            info!(subject = %submission.subject, "contact submission delivered");
            let message = if message.trim().is_empty() {
                CONFIRMATION_MESSAGE.to_string()
            } else {
                message
            };
            Ok(SubmitOutcome::Sent { message })
        }
        Err(err) if !err.is_unavailable() => {
            warn!(%err, subject = %submission.subject, "contact submission rejected");
            Err(SubmitError::Rejected(err))
        }
        Err(err) => {
            let reference = Uuid::new_v4().to_string();
            warn!(%err, %reference, "contact backend unavailable; queueing submission");
            db::enqueue_submission(pool, &reference, &submission)
                .await
                .map_err(SubmitError::Queue)?;
            Ok(SubmitOutcome::Queued {
                reference,
                message: CONFIRMATION_MESSAGE.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPage {
    pub info: ContactInfo,
    pub social: SocialMedia,
}

/// Info and social profiles, fetched together and falling back together.
pub async fn contact_page(service: &dyn ContentService, catalog: &Catalog) -> Fetched<ContactPage> {
    let (info, social) = futures::join!(
        content::contact_info(service, catalog),
        content::social_media(service, catalog)
    );
    if info.is_fallback() || social.is_fallback() {
        Fetched::Fallback(ContactPage {
            info: catalog.contact_info().clone(),
            social: catalog.social_media().clone(),
        })
    } else {
        Fetched::Live(ContactPage {
            info: info.into_inner(),
            social: social.into_inner(),
        })
    }
}
