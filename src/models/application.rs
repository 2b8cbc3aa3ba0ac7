use serde::{Deserialize, Serialize};
use std::fmt;

/// Review state of an application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome an admin can assign to a pending application.
///
/// Kept separate from [`ApplicationStatus`] so that moving a record back to
/// `pending` cannot be expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

impl From<Verdict> for ApplicationStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => ApplicationStatus::Accepted,
            Verdict::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// User-supplied part of an application
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationFields {
    pub why: String,
    pub experience: String,
    /// Free text; never checked to be numeric
    pub age: String,
    pub mc_username: String,
}

impl ApplicationFields {
    /// Name of the first empty field, in form order
    pub fn first_missing(&self) -> Option<&'static str> {
        [
            ("why", &self.why),
            ("experience", &self.experience),
            ("age", &self.age),
            ("mcUsername", &self.mc_username),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
    }
}

/// A staff application, persisted as one element of the `applications` slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Owner's username, as held in the session at submission time
    pub username: String,
    pub why: String,
    pub experience: String,
    pub age: String,
    pub mc_username: String,
    pub status: ApplicationStatus,
    pub submitted_at: String,
}

impl Application {
    pub fn new(username: String, fields: ApplicationFields, submitted_at: String) -> Self {
        Self {
            username,
            why: fields.why,
            experience: fields.experience,
            age: fields.age,
            mc_username: fields.mc_username,
            status: ApplicationStatus::Pending,
            submitted_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ApplicationFields {
        ApplicationFields {
            why: "fun".into(),
            experience: "none".into(),
            age: "20".into(),
            mc_username: "SteveMC".into(),
        }
    }

    #[test]
    fn test_new_application_is_pending() {
        let app = Application::new("Steve".into(), fields(), "1/2/2024, 3:04:05 PM".into());
        assert!(app.is_pending());
        assert_eq!(app.mc_username, "SteveMC");
    }

    #[test]
    fn test_application_json_uses_camel_case() {
        let app = Application::new("Steve".into(), fields(), "now".into());
        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value["mcUsername"], "SteveMC");
        assert_eq!(value["submittedAt"], "now");
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn test_application_parses_browser_layout() {
        let json = r#"{"username":"alex","why":"w","experience":"e","age":"17",
            "mcUsername":"Alex_","status":"rejected","submittedAt":"5/6/2024, 9:00:00 AM"}"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.status, ApplicationStatus::Rejected);
        assert_eq!(app.submitted_at, "5/6/2024, 9:00:00 AM");
    }

    #[test]
    fn test_first_missing_reports_form_order() {
        let mut f = fields();
        assert_eq!(f.first_missing(), None);

        f.age.clear();
        f.mc_username.clear();
        assert_eq!(f.first_missing(), Some("age"));
    }

    #[test]
    fn test_verdict_maps_to_status() {
        assert_eq!(ApplicationStatus::from(Verdict::Accept), ApplicationStatus::Accepted);
        assert_eq!(ApplicationStatus::from(Verdict::Reject).to_string(), "rejected");
    }
}
