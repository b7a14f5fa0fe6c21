//! Element location - Multi-strategy resolution with ordered fallback
//!
//! A [`SelectorSpec`](soultest_core_types::SelectorSpec) names a primary
//! strategy and any number of fallbacks. The resolver:
//! - maps each strategy (CSS, XPath, text, placeholder, label, role,
//!   test id) to a concrete [`ElementQuery`]
//! - runs every query against an [`ElementLookup`] backend, bounded by a
//!   per-attempt wait
//! - falls through to the next entry in the chain on miss, timeout or
//!   ambiguity, and reports every attempt when the chain is exhausted

pub mod errors;
pub mod lookup;
pub mod page;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use lookup::*;
pub use page::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
