use alpha_vault_session::SessionError;
use snafu::Snafu;

use crate::auth::RegistrationError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("Invalid request URL"))]
    Url { source: url::ParseError },
    #[snafu(display("HTTP request failed"))]
    Request { source: reqwest::Error },
    #[snafu(display("Not authorized (HTTP {status}), session cleared"))]
    Unauthorized { status: u16 },
    #[snafu(display("Backend returned HTTP {status}: {body}"))]
    Status { status: u16, body: String },
    #[snafu(display("Login rejected (HTTP {status})"))]
    LoginRejected { status: u16, body: String },
    #[snafu(display("No identity: log in before using the {service} service"))]
    MissingIdentity { service: &'static str },
    #[snafu(display("Backend response carried no usable credentials"))]
    MissingCredentials,
    #[snafu(display("Registration form incomplete"))]
    InvalidRegistration { source: RegistrationError },
    #[snafu(transparent)]
    Session { source: SessionError },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
