use std::sync::Arc;

use judge::dispatcher::Dispatcher;
use judge::problems::ProblemProvider;
use judge::store::SubmissionStore;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<dyn SubmissionStore>,
    pub problems: Arc<dyn ProblemProvider>,
}
