use rageval::EvaluationConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Applied when a request leaves cutoffs, metrics or policy unset
    pub defaults: Arc<EvaluationConfig>,
}
