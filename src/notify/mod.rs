//! Delivery of items to a chat destination
//!
//! This module provides:
//! - A trait for delivery backends
//! - A webhook backend posting `{"content": ...}` JSON
//! - Content truncation to the transport's message limit

mod webhook;

pub use webhook::*;

use crate::error::Result;
use async_trait::async_trait;

/// Characters kept before the ellipsis when a message is too long
pub const MAX_CONTENT_CHARS: usize = 1990;

/// Marker appended to truncated messages
pub const ELLIPSIS: &str = "...";

/// Trait for delivery backends
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. An error means the message was not accepted,
    /// after whatever retry budget the backend applies internally.
    async fn notify(&self, text: &str) -> Result<()>;
}

/// Cut `text` to [`MAX_CONTENT_CHARS`] characters plus [`ELLIPSIS`] when longer
pub fn truncate_content(text: &str) -> String {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
