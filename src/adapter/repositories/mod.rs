//! Repository Implementations
//!
//! Domain層のVideoBackendトレイトの実装（HTTP実装は `adapter::http`）

pub mod local_video_backend;

pub use local_video_backend::LocalVideoBackend;
