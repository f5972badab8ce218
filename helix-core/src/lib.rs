//! Helix Core - Entity Types
//!
//! Data types shared by the engine and its hosts: identifiers, genomes,
//! runs, workflows, configuration, errors and the LLM provider seam.

mod config;
mod entities;
mod error;
mod identity;
mod llm;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use identity::*;
pub use llm::*;
