//! Low-level filesystem helpers shared by the copy engine and the migrator.

mod atomic;
mod helpers;
mod io_copy;
mod lock;
mod space;
mod util;

pub use helpers::{describe_io_error, is_access_problem};
pub use lock::{InstanceLock, try_acquire_instance_lock};

pub(crate) use atomic::replace_file;
pub(crate) use io_copy::copy_streaming;
pub(crate) use space::ensure_space_for_copy;
pub(crate) use util::{TEMP_PREFIX, nearest_existing_ancestor, remove_link, unique_temp_path};
