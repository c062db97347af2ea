pub mod alert_store;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod store;
pub mod triggered_log;

pub use alert_store::AlertStore;
pub use error::AlertError;
pub use evaluator::AlertEvaluator;
pub use model::{Alert, AlertId, Direction, TriggeredAlert, parse_target_price};
pub use triggered_log::TriggeredAlertLog;
