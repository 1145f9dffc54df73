pub mod chart;
pub mod clients;
pub mod error;
pub mod filter;
mod keys;
mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod settings;
pub mod tracing_setup;
pub mod view_state;

pub use chart::{ChartType, ChartTypeOverrides};
pub use error::{ExplorerError, TransportError};
pub use keys::{Key, KeyAction};
pub use orchestrator::{QueryOrchestrator, RunOutcome};
pub use registry::{DateConstraint, ExplorerDefinition, ExplorerRegistry, FilterOption};
pub use settings::Settings;
pub use view_state::{PayloadError, ResultPayload, ViewState};
