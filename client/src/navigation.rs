use crate::upload::ObjectUrl;
use shared::PredictionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Upload,
    Results,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Upload => "/upload",
            Route::Results => "/results",
        }
    }
}

// Carried across exactly one navigation. Both halves are optional because a view can
// be reached by a stale or bookmarked entry that never had them.
#[derive(Debug, Clone, Default)]
pub struct ViewTransferState {
    pub prediction: Option<PredictionResult>,
    pub original_image: Option<ObjectUrl>,
}

impl ViewTransferState {
    pub fn new(prediction: PredictionResult, original_image: ObjectUrl) -> Self {
        Self {
            prediction: Some(prediction),
            original_image: Some(original_image),
        }
    }
}

pub struct Navigator {
    current: Route,
    pending: Option<ViewTransferState>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: Route::Upload,
            pending: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    // Any state left over from an earlier navigation is discarded.
    pub fn navigate(&mut self, route: Route, state: Option<ViewTransferState>) {
        log::info!("Navigating {} -> {}", self.current.path(), route.path());
        self.current = route;
        self.pending = state;
    }

    pub fn redirect(&mut self, route: Route) {
        self.navigate(route, None);
    }

    // First read wins; later reads see nothing.
    pub fn take_state(&mut self) -> Option<ViewTransferState> {
        self.pending.take()
    }
}
