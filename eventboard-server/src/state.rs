use eventboard_core::EventStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: EventStore,
    pub page_size: u32,
}

impl AppState {
    pub fn new(store: EventStore, page_size: u32) -> Self {
        AppState { store, page_size }
    }
}
