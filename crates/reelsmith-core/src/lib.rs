#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Core long-running-operation workflow for prompt-to-video generation.
//!
//! Layout: `model.rs` (requests, handles, payloads, assets), `service.rs`
//! (collaborator traits), `poller.rs` (operation state machine), `extract.rs`
//! (terminal payload decoding), `stage.rs` (scoped temporary files),
//! `workflow.rs` (orchestration), `error.rs` (error taxonomy).

pub mod error;
pub mod extract;
pub mod model;
pub mod poller;
pub mod service;
pub mod stage;
pub mod workflow;

pub use error::{
    BoxError, CredentialError, ExtractError, PollError, PublishError, StagingError,
    SubmissionError, ValidationError, WorkflowError, WorkflowResult,
};
pub use extract::extract_asset;
pub use model::{
    AccessToken, DEFAULT_ASPECT_RATIO, DEFAULT_DURATION_SECONDS, GeneratedAsset, GeneratedVideo,
    GenerationDraft, GenerationRequest, GenerationResponse, MediaType, OperationFailure,
    OperationHandle, OperationPayload, PollResult, PublishedAsset, UploadOptions,
};
pub use poller::{OperationPoller, PollOutcome, PollPolicy, PollState};
pub use service::{CredentialProvider, GenerationProvider, Sleeper, StoragePublisher, TokioSleeper};
pub use stage::{AssetStager, StagedFile};
pub use workflow::{GenerationWorkflow, WorkflowDependencies, WorkflowSettings};
