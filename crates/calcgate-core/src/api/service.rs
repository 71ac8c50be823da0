use anyhow::Result;
use async_trait::async_trait;

use crate::auth::SessionRecord;
use crate::calculator::OperationRequest;
use crate::validation::Credentials;

/// Everything the client asks of the calculator gateway.
///
/// `ApiClient` is the HTTP implementation; tests substitute their own.
#[async_trait]
pub trait CalculatorService: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<()>;

    async fn login(&self, credentials: &Credentials) -> Result<SessionRecord>;

    /// Evaluate an expression; returns the new display value
    async fn execute_operation(&self, request: &OperationRequest) -> Result<String>;

    async fn random_string(&self, user_id: i64) -> Result<String>;

    async fn balance(&self, user_id: i64) -> Result<f64>;
}
