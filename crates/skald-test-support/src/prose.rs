//! Test prose generators.

use async_trait::async_trait;
use skald_core::service::{ProseGenerator, ProseRequest, ServiceError};

/// Writes the request's beats back as prose, prefixed with the style name.
#[derive(Debug, Default)]
pub struct EchoProseGenerator;

#[async_trait]
impl ProseGenerator for EchoProseGenerator {
    async fn generate(&self, request: &ProseRequest) -> Result<String, ServiceError> {
        Ok(format!("[{}] {}", request.style, request.beats.join(" ")))
    }
}

/// Always fails as if the service were down.
#[derive(Debug, Default)]
pub struct FailingProseGenerator;

#[async_trait]
impl ProseGenerator for FailingProseGenerator {
    async fn generate(&self, _request: &ProseRequest) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("connection refused".into()))
    }
}

/// Answers with prose that names nobody.
#[derive(Debug, Default)]
pub struct NamelessProseGenerator;

#[async_trait]
impl ProseGenerator for NamelessProseGenerator {
    async fn generate(&self, _request: &ProseRequest) -> Result<String, ServiceError> {
        Ok("Someone did something somewhere.".to_owned())
    }
}
