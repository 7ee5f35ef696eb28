use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::Response;

/// Buffer of fetched responses waiting for the next database run
#[derive(Debug, Default)]
pub struct ResponseList {
    responses: Mutex<Vec<Response>>,
}

impl ResponseList {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Response>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, response: Response) {
        self.lock().push(response);
    }

    /// Takes every buffered response, in arrival order
    pub fn drain(&self) -> Vec<Response> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
