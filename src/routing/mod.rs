//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → path.rs (resolve dot segments; unclean paths are redirected)
//!     → router.rs (route lookup)
//!     → route.rs (segment-boundary prefix match, prefix stripping)
//!     → Return: matched Route + remaining path, or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → normalize trailing separators
//!     → sort longest prefix first
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod path;
pub mod route;
pub mod router;

pub use path::clean_path;
pub use route::Route;
pub use router::{RouteMatch, RouteTable};
