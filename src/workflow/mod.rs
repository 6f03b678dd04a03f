//! Workflow catalogue
//!
//! Each workflow is a fixed stage chain ending in the output stage:
//!
//! | workflow    | stages                                         |
//! |-------------|------------------------------------------------|
//! | research    | researcher → analyzer → writer → output        |
//! | image       | prompt_enhancer → image_generator → output     |
//! | summary     | summarizer → output                            |
//! | code        | code_explainer → output                        |
//! | translation | translator → output                            |
//! | grammar     | grammar_checker → output                       |

mod kind;
mod registry;

pub use kind::WorkflowKind;
pub use registry::{build_pipeline, WorkflowRegistry};
