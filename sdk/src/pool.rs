use {
    crate::{error::Error, unit::ExecutionUnit},
    partcrypt_protocol::{FailureKind, PartRequest, PartResponse},
    std::sync::Arc,
    tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError, oneshot},
    tracing::debug,
};

/// A bounded set of execution units.
///
/// At most `capacity` parts are in flight at once. Each accepted request is
/// answered on its own channel; dropping the [`PartHandle`] abandons the result.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    unit: ExecutionUnit,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// `capacity` is clamped to at least one unit.
    #[must_use]
    #[inline]
    pub fn new(unit: ExecutionUnit, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            unit,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of units currently free.
    #[must_use]
    #[inline]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Starts `request` if a unit is free, and rejects it otherwise.
    #[inline]
    pub fn try_submit(&self, request: PartRequest) -> Result<PartHandle, Error> {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => Ok(self.spawn(permit, request)),
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => {
                Err(Error::PoolSaturated {
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Starts `request` as soon as a unit is free.
    #[inline]
    pub async fn submit(&self, request: PartRequest) -> PartHandle {
        let part_index = request.part_index();
        match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => self.spawn(permit, request),
            // The semaphore is never closed, but a handle is still owed.
            Err(_closed) => PartHandle::stopped(part_index),
        }
    }

    fn spawn(&self, permit: OwnedSemaphorePermit, request: PartRequest) -> PartHandle {
        let part_index = request.part_index();
        let (sender, receiver) = oneshot::channel();
        let unit = self.unit.clone();
        debug!(part_index, "starting part");
        tokio::spawn(async move {
            let response = unit.handle(request).await;
            drop(permit);
            // The receiver may be gone if the caller lost interest.
            let _ = sender.send(response);
        });
        PartHandle {
            part_index,
            receiver,
        }
    }
}

/// Pending response for one submitted part.
#[derive(Debug)]
pub struct PartHandle {
    part_index: u64,
    receiver: oneshot::Receiver<PartResponse>,
}

impl PartHandle {
    fn stopped(part_index: u64) -> Self {
        let (_, receiver) = oneshot::channel();
        Self {
            part_index,
            receiver,
        }
    }

    #[must_use]
    #[inline]
    pub const fn part_index(&self) -> u64 {
        self.part_index
    }

    /// Waits for the part to finish.
    #[inline]
    pub async fn response(self) -> PartResponse {
        self.receiver.await.unwrap_or_else(|_| {
            PartResponse::failed(
                Some(self.part_index),
                FailureKind::UnitStopped,
                "execution unit stopped before responding",
            )
        })
    }
}
