use crate::view::PopupView;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub view: Arc<PopupView>,
}

impl AppState {
    pub fn new(view: PopupView) -> Self {
        Self {
            view: Arc::new(view),
        }
    }
}
