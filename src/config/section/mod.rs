//! Configuration section definitions.
//!
//! Each module corresponds to a section in `statik.toml`:
//!
//! | Module    | TOML Section   | Purpose                              |
//! |-----------|----------------|--------------------------------------|
//! | `publish` | `[publish]`    | Asset root, engine, bucket, filters  |
//! | `upload`  | `[upload]`     | Timeout and retry policy             |
//! | `storage` | `[storage.*]`  | Backend-specific settings            |

mod publish;
mod storage;
mod upload;

pub use publish::{MANIFEST_BUILD_STORAGE, PublishConfig};
pub use storage::{S3Config, StorageSectionConfig};
pub use upload::UploadConfig;
