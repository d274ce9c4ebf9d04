//! # gatecheck-cli - Offline Bundle Tooling
//!
//! Provides the `gatecheck` command-line interface for route authors.
//!
//! ## Subcommands
//!
//! - `gatecheck validate` - run a request snapshot through a bundle.
//! - `gatecheck inspect` - compile a bundle and list its segments.
//!
//! ```bash
//! gatecheck validate --bundle routes/create-user.yaml samples/empty-body.json
//! gatecheck inspect routes/create-user.yaml
//! ```

pub mod inspect;
pub mod validate;
