//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (method, template, handler)
//!     → pattern.rs (compile template, inline constraints)
//!     → router.rs (append to table, RouteHandle::constrain)
//!     → dispatch.rs (freeze table inside Dispatcher)
//!
//! Incoming Request (method, path)
//!     → dispatch.rs
//!     → matcher.rs (first matching route + ordered params)
//!     → invoke handler, or Outcome::RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Registration order is the only tie-break (first match wins)
//! - Deterministic: same input always matches same route
//! - Handlers are opaque to the engine (generic `H`)

pub mod dispatch;
pub mod matcher;
pub mod pattern;
pub mod router;

pub use dispatch::{DispatchError, Dispatcher, Outcome};
pub use matcher::{MatchResult, Params};
pub use pattern::{Constraint, Pattern, PatternError, Segment};
pub use router::{MethodFilter, Route, RouteHandle, RouteTable};
