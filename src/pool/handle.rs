use std::ops::{Deref, DerefMut};

use derive_where::derive_where;

use crate::driver::{ClusterConnection, ClusterDriver};

/// The handle type issued by connections of the driver `D`.
pub(crate) type HandleOf<D> =
    <<D as ClusterDriver>::Connection as ClusterConnection>::Handle;

/// A driver handle checked out of a [`Pool`](crate::Pool).
///
/// The caller owns the handle exclusively between check-out and check-in and
/// must return it with [`Pool::check_in`](crate::Pool::check_in) once the
/// request completes; the shutdown drain waits for every outstanding handle to
/// come back. This type derefs to the driver handle, so driver operations can
/// be invoked on it directly.
#[derive_where(Debug)]
pub struct PooledHandle<D: ClusterDriver> {
    #[derive_where(skip)]
    handle: HandleOf<D>,

    /// Pool-assigned identifier, unique among live handles.
    id: u32,

    /// The teardown epoch this handle was issued under. A handle returned
    /// after the pool has been torn down in the meantime is destroyed instead
    /// of pooled.
    generation: u32,
}

impl<D: ClusterDriver> PooledHandle<D> {
    pub(super) fn new(handle: HandleOf<D>, id: u32, generation: u32) -> Self {
        Self {
            handle,
            id,
            generation,
        }
    }

    /// The pool-assigned identifier of this handle.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub(super) fn generation(&self) -> u32 {
        self.generation
    }
}

impl<D: ClusterDriver> Deref for PooledHandle<D> {
    type Target = HandleOf<D>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<D: ClusterDriver> DerefMut for PooledHandle<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}
