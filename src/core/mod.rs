// ─── Springboard Core ───
// Event-driven bootstrap engine: fetch a runtime and an application's
// dependencies, then hand off to the application process.
//
// Architecture:
//   core/
//     events/       — Progress event set, reentrancy-safe bus, replay catalog
//     settings/     — Read-only run configuration + derived paths
//     cache/        — Disk-backed record of prior download/unzip results
//     transfer/     — HTTP fetch, zip extraction, disk-space preflight
//     downloader/   — Runtime + dependency workers driven by request events
//     runner/       — Command assembly, version matching, launch strategies
//     orchestrator/ — Replay sequencing and full pipeline wiring

pub mod cache;
pub mod downloader;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod runner;
pub mod settings;
pub mod transfer;
