// ─── Downloaders ───
// Event-driven workers that materialize the runtime and the application
// dependencies on disk, honoring prior results recorded in the cache.

pub mod dependency;
pub mod runtime;
