//! Inbound registry events.

mod sqs;

pub use sqs::{SqsQueue, parse_receive};

use crate::error::QueueError;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: String,
    /// Raw body; for SQS this is the CloudWatch event envelope.
    pub body: String,
    pub receipt_handle: String,
}

pub trait Queue: Send + Sync {
    fn name(&self) -> &str;

    /// Long-poll for the next batch; an empty batch is normal.
    fn poll<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<QueueMessage>, QueueError>> + Send + 'a>>;

    fn acknowledge<'a>(
        &'a self,
        message: &'a QueueMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>>;
}
