/*!
# Build Index

Reads the log store manifest that the build tool keeps next to its activity
logs and resolves the most recently finished build or compile record.

The manifest is a property list whose top-level `logs` dictionary maps an
entry key to the fields of one recorded invocation. Each key doubles as the
file stem of the gzip-compressed activity log written for that invocation.

## Example

```rust,no_run
use buildtime_build_index::{BuildIndexReader, IndexConfig};
use std::path::Path;

let reader = BuildIndexReader::new(IndexConfig::default());
if let Some(entry) = reader.read_log_folder(Path::new("/tmp/DerivedData/App-abc/Logs/Build")) {
    println!("{} ({}) -> {}", entry.title, entry.scheme_name, entry.log_path().display());
}
```
*/

mod config;
mod entry;
mod error;
mod reader;

pub use config::IndexConfig;
pub use entry::BuildEntry;
pub use entry::format_build_duration;
pub use error::BuildIndexError;
pub use error::Result;
pub use reader::BuildIndexReader;
