//! HTTP handlers for the directory API

pub mod companies;
pub mod employees;
pub mod exceptions;

use std::sync::Arc;

use crate::directory::DirectoryService;

/// Shared handler state
#[derive(Clone, Default)]
pub struct AppState {
    pub directory: Arc<DirectoryService>,
}

impl AppState {
    pub fn new(directory: DirectoryService) -> Self {
        Self {
            directory: Arc::new(directory),
        }
    }
}
