//! Client for the external generation service boundary.
//!
//! Every machine-learning-backed operation the pipeline consumes — script
//! generation, reference vision analysis, cinematic critique, video/voice
//! generation, visual debugging, export — lives behind the
//! [`GenerationService`] trait. The HTTP implementation talks to a gateway
//! exposing one endpoint per operation.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{GenClientConfig, HttpGenerationService};
pub use error::{GenError, GenResult};
pub use service::GenerationService;
pub use types::{
    CritiqueRequest, CritiqueResponse, DebugRequest, DebugResponse, ExportRequest,
    ExportResponse, ScriptRequest, ScriptResponse, VideoGenRequest, VideoGenResponse,
    VisionRequest, VisionResponse, VoiceRequest, VoiceResponse,
};
