//! Validated leads and the notification text staff receive for them.

use crate::api::models::leads::{LeadSubmission, MIN_PHONE_CHARS, TrackingParams};
use crate::errors::Error;

/// Rendered in place of any optional field the visitor left empty.
pub const PLACEHOLDER: &str = "—";

pub const VALIDATION_MESSAGE: &str = "Телефон и симптомы обязательны.";

const HEADER: &str = "🛠️ Новая заявка (лендинг)";

/// A lead that passed validation. All text fields are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    pub phone: String,
    pub car: String,
    pub problem: String,
    pub preferred_time: String,
    pub utm: TrackingParams,
    pub page_url: String,
}

fn trimmed(field: Option<String>) -> String {
    field.as_deref().unwrap_or_default().trim().to_string()
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() { PLACEHOLDER } else { value }
}

impl Lead {
    /// Trims every field and checks the two required ones.
    ///
    /// The honeypot is not looked at here; spam is filtered before validation.
    pub fn from_submission(submission: LeadSubmission) -> Result<Self, Error> {
        let lead = Self {
            name: trimmed(submission.name),
            phone: trimmed(submission.phone),
            car: trimmed(submission.car),
            problem: trimmed(submission.problem),
            preferred_time: trimmed(submission.preferred_time),
            utm: submission.utm,
            page_url: trimmed(submission.page_url),
        };

        if lead.phone.chars().count() < MIN_PHONE_CHARS || lead.problem.is_empty() {
            return Err(Error::Validation {
                message: VALIDATION_MESSAGE.to_string(),
            });
        }

        Ok(lead)
    }

    /// Plain-text notification with labelled fields in a fixed order.
    pub fn notification_text(&self) -> String {
        let utm = if self.utm.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            self.utm
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "{HEADER}\n\n\
             Имя: {name}\n\
             Телефон: {phone}\n\
             Авто: {car}\n\
             Симптомы: {problem}\n\
             Когда удобно: {preferred_time}\n\n\
             UTM:\n{utm}\n\n\
             Страница: {page_url}",
            name = or_placeholder(&self.name),
            phone = self.phone,
            car = or_placeholder(&self.car),
            problem = self.problem,
            preferred_time = or_placeholder(&self.preferred_time),
            page_url = or_placeholder(&self.page_url),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::leads::TrackingKey;

    fn submission(phone: &str, problem: &str) -> LeadSubmission {
        LeadSubmission {
            phone: Some(phone.to_string()),
            problem: Some(problem.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_fields_are_trimmed() {
        let lead = Lead::from_submission(LeadSubmission {
            name: Some("  Иван ".to_string()),
            car: Some("\tKia Rio\n".to_string()),
            ..submission("  +79991234567  ", " стук ")
        })
        .unwrap();

        assert_eq!(lead.name, "Иван");
        assert_eq!(lead.phone, "+79991234567");
        assert_eq!(lead.car, "Kia Rio");
        assert_eq!(lead.problem, "стук");
    }

    #[test]
    fn test_phone_length_is_checked_after_trimming() {
        assert!(Lead::from_submission(submission("   1234567   ", "стук")).is_err());
        assert!(Lead::from_submission(submission("12345678", "стук")).is_ok());
    }

    #[test]
    fn test_phone_length_counts_characters_not_bytes() {
        // Eight Cyrillic letters are 16 bytes but still exactly eight characters
        assert!(Lead::from_submission(submission("восемьчс", "стук")).is_ok());
        assert!(Lead::from_submission(submission("семьчсл", "стук")).is_err());
    }

    #[test]
    fn test_missing_required_fields() {
        for lead in [
            LeadSubmission::default(),
            submission("", "стук"),
            submission("+79991234567", ""),
            submission("+79991234567", "   "),
            submission("123", "стук"),
        ] {
            let err = Lead::from_submission(lead).unwrap_err();
            assert!(matches!(err, Error::Validation { .. }));
            assert_eq!(err.to_string(), VALIDATION_MESSAGE);
        }
    }

    #[test]
    fn test_notification_with_only_required_fields() {
        let lead = Lead::from_submission(submission("+79991234567", "стук")).unwrap();

        assert_eq!(
            lead.notification_text(),
            "🛠️ Новая заявка (лендинг)\n\n\
             Имя: —\n\
             Телефон: +79991234567\n\
             Авто: —\n\
             Симптомы: стук\n\
             Когда удобно: —\n\n\
             UTM:\n—\n\n\
             Страница: —"
        );
    }

    #[test]
    fn test_notification_with_every_field() {
        let utm = [
            (TrackingKey::Term, "ремонт".to_string()),
            (TrackingKey::Source, "yandex".to_string()),
        ]
        .into_iter()
        .collect();

        let lead = Lead::from_submission(LeadSubmission {
            name: Some("Иван".to_string()),
            car: Some("Kia Rio 1.6, 2016".to_string()),
            preferred_time: Some("завтра утром".to_string()),
            utm,
            page_url: Some("https://example.com/?utm_source=yandex&utm_term=ремонт".to_string()),
            ..submission("+79991234567", "жрёт масло")
        })
        .unwrap();

        let text = lead.notification_text();

        assert!(text.contains("Имя: Иван\n"));
        assert!(text.contains("Авто: Kia Rio 1.6, 2016\n"));
        assert!(text.contains("Симптомы: жрёт масло\n"));
        assert!(text.contains("Когда удобно: завтра утром\n"));
        // Canonical key order, not insertion order
        assert!(text.contains("UTM:\nutm_source: yandex\nutm_term: ремонт\n\n"));
        assert!(text.ends_with("Страница: https://example.com/?utm_source=yandex&utm_term=ремонт"));
        assert!(!text.contains(PLACEHOLDER));
    }
}
