//! Tool-calling agent for the state graph.
//!
//! The router asks the model whether the question needs a textbook lookup;
//! the retriever tool carries out the lookups it requests.

mod router;
mod tools;

pub use router::{AgentRoute, AgentRouter};
pub use tools::{RetrieveArgs, RetrieverTool};
