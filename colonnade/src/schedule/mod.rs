//! A sequential system scheduler.
//!
//! A schedule is an ordered list of fallible system functions over the
//! world. [`run`](Schedule::run) invokes them in insertion order; the first
//! error stops the run and is surfaced to the caller with the failing
//! system's name attached. There is no parallelism and no implicit ordering
//! beyond insertion: the world is mutated exclusively by the system
//! currently executing.

use thiserror::Error;

use crate::world::World;

/// The error a system reports to stop the schedule.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SystemError {
    message: String,
}

impl SystemError {
    /// Create a system error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a system returns.
pub type SystemResult = Result<(), SystemError>;

/// The error surfaced by [`Schedule::run`]: which system failed, and why.
#[derive(Debug, Error)]
#[error("system `{system}` failed: {source}")]
pub struct ScheduleError {
    /// Name of the failing system.
    pub system: String,

    /// The error the system reported.
    #[source]
    pub source: SystemError,
}

/// One registered system.
struct System<R> {
    name: String,
    run: Box<dyn FnMut(&mut World<R>) -> SystemResult>,
}

/// An ordered list of systems run against a [`World`].
pub struct Schedule<R = ()> {
    systems: Vec<System<R>>,
}

impl<R: 'static> Default for Schedule<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> Schedule<R> {
    /// Create an empty schedule.
    #[inline]
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Append a system. Systems run in the order they were added.
    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        system: impl FnMut(&mut World<R>) -> SystemResult + 'static,
    ) -> &mut Self {
        self.systems.push(System {
            name: name.into(),
            run: Box::new(system),
        });
        self
    }

    /// Run every system in insertion order. Stops at the first error and
    /// reports it; systems after the failing one do not run.
    pub fn run(&mut self, world: &mut World<R>) -> Result<(), ScheduleError> {
        for system in self.systems.iter_mut() {
            log::trace!("running system `{}`", system.name);
            (system.run)(world).map_err(|source| ScheduleError {
                system: system.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Number of registered systems.
    #[inline]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether the schedule holds no systems.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
