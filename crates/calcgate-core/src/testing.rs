//! Scripted `CalculatorService` for unit tests.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::api::CalculatorService;
use crate::auth::SessionRecord;
use crate::calculator::OperationRequest;
use crate::validation::Credentials;

type Scripted<T> = Option<std::result::Result<T, String>>;

#[derive(Default)]
struct Calls {
    register: usize,
    login: usize,
    operations: Vec<OperationRequest>,
    random: usize,
    balance: usize,
}

#[derive(Default)]
pub struct MockService {
    register: Scripted<()>,
    login: Scripted<SessionRecord>,
    operation: Scripted<String>,
    random: Scripted<String>,
    balance: Scripted<f64>,
    calls: Mutex<Calls>,
}

fn script<T>(result: Result<T>) -> Scripted<T> {
    Some(result.map_err(|e| e.to_string()))
}

fn replay<T: Clone>(scripted: &Scripted<T>) -> Result<T> {
    match scripted {
        Some(Ok(value)) => Ok(value.clone()),
        Some(Err(message)) => Err(anyhow::anyhow!("{}", message)),
        None => Err(anyhow::anyhow!("no scripted response")),
    }
}

impl MockService {
    pub fn with_register_result(mut self, result: Result<()>) -> Self {
        self.register = script(result);
        self
    }

    pub fn with_login_result(mut self, result: Result<SessionRecord>) -> Self {
        self.login = script(result);
        self
    }

    pub fn with_operation_result(mut self, result: Result<String>) -> Self {
        self.operation = script(result);
        self
    }

    pub fn with_random_result(mut self, result: Result<String>) -> Self {
        self.random = script(result);
        self
    }

    pub fn with_balance_result(mut self, result: Result<f64>) -> Self {
        self.balance = script(result);
        self
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }

    pub fn register_calls(&self) -> usize {
        self.calls().register
    }

    pub fn login_calls(&self) -> usize {
        self.calls().login
    }

    pub fn operation_calls(&self) -> usize {
        self.calls().operations.len()
    }

    pub fn last_operation(&self) -> Option<OperationRequest> {
        self.calls().operations.last().cloned()
    }

    pub fn random_calls(&self) -> usize {
        self.calls().random
    }

    pub fn balance_calls(&self) -> usize {
        self.calls().balance
    }
}

#[async_trait]
impl CalculatorService for MockService {
    async fn register(&self, _credentials: &Credentials) -> Result<()> {
        self.calls().register += 1;
        replay(&self.register)
    }

    async fn login(&self, _credentials: &Credentials) -> Result<SessionRecord> {
        self.calls().login += 1;
        replay(&self.login)
    }

    async fn execute_operation(&self, request: &OperationRequest) -> Result<String> {
        self.calls().operations.push(request.clone());
        replay(&self.operation)
    }

    async fn random_string(&self, _user_id: i64) -> Result<String> {
        self.calls().random += 1;
        replay(&self.random)
    }

    async fn balance(&self, _user_id: i64) -> Result<f64> {
        self.calls().balance += 1;
        replay(&self.balance)
    }
}
