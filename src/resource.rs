//! ResourceArc Wrappers
//!
//! Compiled wildcard patterns and in-memory databases held by the BEAM.

use crate::config::StatsConfig;
use crate::data::MemData;
use crate::wildcard::Wildcard;
use rustler::ResourceArc;
use std::sync::{Arc, Mutex};

/// Compiled wildcard pattern; immutable, so no lock
pub struct PatternResource {
    pub pattern: Arc<Wildcard>,
}

impl PatternResource {
    pub fn new(pattern: Arc<Wildcard>) -> Self {
        PatternResource { pattern }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for PatternResource {}

/// Type alias for pattern ResourceArc
pub type PatternRef = ResourceArc<PatternResource>;

/// In-memory database with the settings it was created with
pub struct DatabaseResource {
    data: Mutex<MemData>,
    pub config: StatsConfig,
}

impl DatabaseResource {
    pub fn new(data: MemData, config: StatsConfig) -> Self {
        DatabaseResource {
            data: Mutex::new(data),
            config,
        }
    }

    /// Run `f` with exclusive access to the database.
    /// Concurrent rebuilds of the same database are serialized here.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if an earlier call panicked while holding
    /// the lock.
    pub fn with_data<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut MemData) -> R,
    {
        let mut guard = self.data.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&mut guard))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DatabaseResource {}

/// Type alias for database ResourceArc
pub type DatabaseRef = ResourceArc<DatabaseResource>;
