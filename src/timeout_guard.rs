//! A "scope guard" that will reset a channel's timeout when it is goes out of scope.

use crate::{
    backend::Backend,
    channel::Channel,
    error::{SyncError, TransportError},
};
use std::{io, time::Duration};

/// A "scope guard" that will update the channel's timeout and then reset it
/// when it goes out of scope.
///
/// To create a guard, use the channel's [`timeout_guard`](Channel::timeout_guard) method.
///
/// While the guard is in scope, the channel can only be accessed through the guard.
/// However, because the guard implements [`Deref`](std::ops::Deref) and
/// [`DerefMut`](std::ops::DerefMut) callers can treat the guard as the channel.
#[derive(Debug)]
pub struct TimeoutGuard<'c, 'a, B: Backend> {
    /// The underlying channel.
    channel: &'c mut Channel<'a, B>,
    /// The original timeout that will be restored when the guard is dropped.
    original_timeout: Option<Duration>,
}

impl<'c, 'a, B: Backend> TimeoutGuard<'c, 'a, B> {
    /// Update the channel's timeout and return a [`TimeoutGuard`] wrapping it.
    ///
    /// If the timeout cannot be changed the channel is faulted.
    pub(crate) fn new(channel: &'c mut Channel<'a, B>, timeout: Duration) -> Result<Self, SyncError> {
        let result = match channel.backend_slot() {
            Some(backend) => backend
                .read_timeout()
                .and_then(|original| backend.set_read_timeout(Some(timeout)).map(|()| original)),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "the channel has been released",
            )),
        };
        match result {
            Ok(original_timeout) => Ok(TimeoutGuard {
                channel,
                original_timeout,
            }),
            Err(e) => Err(channel.fault_with(TransportError::from(e)).into()),
        }
    }
}

impl<'c, 'a, B: Backend> std::ops::Deref for TimeoutGuard<'c, 'a, B> {
    type Target = Channel<'a, B>;
    /// Get a shared reference to the underlying channel.
    fn deref(&self) -> &Self::Target {
        self.channel
    }
}

impl<'c, 'a, B: Backend> std::ops::DerefMut for TimeoutGuard<'c, 'a, B> {
    /// Get an exclusive reference to the underlying channel.
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.channel
    }
}

impl<'c, 'a, B: Backend> std::ops::Drop for TimeoutGuard<'c, 'a, B> {
    fn drop(&mut self) {
        let Some(backend) = self.channel.backend_slot() else {
            return;
        };
        if let Err(err) = backend.set_read_timeout(self.original_timeout) {
            let reason = if let Some(timeout) = self.original_timeout {
                format!("failed to reset timeout to {timeout:?}: {err}")
            } else {
                format!("failed to reset to an infinite timeout: {err}")
            };
            self.channel.fault_with(TransportError::from(io::Error::new(
                io::ErrorKind::Other,
                reason,
            )));
        }
    }
}
