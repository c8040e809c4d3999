//! Composition backend adapters.
//!
//! - **HttpCompositionApi** - JSON over HTTP via `reqwest`
//! - **InMemoryCompositionApi** - in-process backend (testing/development)

mod http_composition_api;
mod in_memory_composition_api;

pub use http_composition_api::{HttpCompositionApi, HttpCompositionConfig};
pub use in_memory_composition_api::InMemoryCompositionApi;
