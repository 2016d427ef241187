use std::sync::Arc;

use crate::usecase::connect::ConnectUseCase;

#[derive(Clone)]
pub struct ConnectState {
    pub connect: Arc<dyn ConnectUseCase>,
}

impl ConnectState {
    pub fn new(connect: Arc<dyn ConnectUseCase>) -> Self {
        Self { connect }
    }
}
