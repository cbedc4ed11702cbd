mod schema;
mod settings;
mod storage;

use std::path::PathBuf;
use std::{env, io};

pub use schema::SchemaManager;
pub use settings::{Database, Hardware, Logger, SensorMode, Settings, Station};
pub use storage::Storage;

/// Resolves relative paths against the working directory.
pub(crate) fn normalize_path(path: &str) -> io::Result<PathBuf> {
    let path_buf = PathBuf::from(path);

    Ok(if path_buf.is_absolute() {
        path_buf
    } else {
        env::current_dir()?.join(path_buf)
    })
}
