//! Network client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum NetworkClientError {
    /// Kubernetes API error not covered by a more specific variant
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The object to create already exists (HTTP 409)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The API server rejected the request
    #[error("API error: {0}")]
    Api(String),

    /// The requested object does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),
}

impl NetworkClientError {
    /// Classifies a kube error for the object `namespace/name`.
    pub fn from_kube(error: kube::Error, namespace: &str, name: &str) -> Self {
        match error {
            kube::Error::Api(ae) if ae.code == 409 => {
                Self::AlreadyExists(format!("{}/{}", namespace, name))
            }
            kube::Error::Api(ae) if ae.code == 404 => {
                Self::NotFound(format!("{}/{}", namespace, name))
            }
            kube::Error::Api(ae) => {
                Self::Api(format!("{}/{}: {} ({})", namespace, name, ae.message, ae.code))
            }
            other => Self::Kube(other),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}
