//! Request/response boundary for the tessellation pipeline.
//!
//! A [`TessellationService`] owns a pool of worker threads fed over
//! channels. Each request is one synchronous, CPU-bound computation;
//! responses come back in completion order carrying the request id, and
//! every buffer crossing the boundary is moved, never copied.

mod service;
mod wire;

pub use service::TessellationService;
pub use wire::{
    BoundingSpherePayload, ExtentParameters, GeometryPayload, TessellationParameters,
    TessellationRequest, TessellationResponse, VertexFormatFlags, WireAttribute, WireBuffer,
    WirePrimitiveTopology,
};
