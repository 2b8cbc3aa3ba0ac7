use crate::models::application::{Application, ApplicationFields};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    /// Trim text inputs; the password is taken as typed
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationForm {
    pub why: String,
    pub experience: String,
    pub age: String,
    #[serde(alias = "mcUsername")]
    pub mc_username: String,
}

impl From<ApplicationForm> for ApplicationFields {
    // age is a number input and is kept untrimmed
    fn from(form: ApplicationForm) -> Self {
        Self {
            why: form.why.trim().to_string(),
            experience: form.experience.trim().to_string(),
            age: form.age,
            mc_username: form.mc_username.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub logged_in: bool,
    pub username: Option<String>,
    pub admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationEntry {
    /// Position used by the review endpoints
    pub index: usize,
    #[serde(flatten)]
    pub application: Application,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub success: bool,
    pub applications: Vec<ApplicationEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub success: bool,
    pub message: String,
    pub application: Application,
}
