mod http;

use std::sync::Arc;

pub use http::*;

use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> BackendBox {
        return Arc::new(ChatBackend::default());
    }
}
