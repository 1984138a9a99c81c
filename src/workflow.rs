//! Generation workflow: per-run state, quality scoring, final assembly, and
//! the orchestrator that sequences them.

pub mod assembly;
pub mod orchestrator;
pub mod quality;
pub mod state;

pub use assembly::{ArtifactWriter, FinalWebsite};
pub use orchestrator::{PipelinePolicies, WorkflowOrchestrator};
pub use quality::{QualityReport, QualityScorer, StandardScorer};
pub use state::{GenerationState, Phase};
