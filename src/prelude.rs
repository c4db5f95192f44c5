pub use std::result::Result as StdResult;
pub use std::sync::Arc;
pub use std::time::Instant;

pub use ahash::{AHashMap, AHashSet};
pub use anyhow::{anyhow, bail, Context};
pub use tracing::{debug, info, instrument, warn};

pub use crate::rating::{ItemId, UserId};

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
