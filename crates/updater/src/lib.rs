//! Refit 업데이터 -- 이미지 업데이트 판단 및 컨테이너 교체
//!
//! 실행 중인 컨테이너마다 설정된 이미지 참조를 다시 pull하고, 이미지 ID가
//! 바뀌었으면 기존 설정을 그대로 유지한 새 컨테이너로 교체합니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`UpdaterError`, `EngineStep`)
//! - [`config`]: Updater configuration (`UpdaterConfig`, builder)
//! - [`types`]: Container snapshots and pull credentials
//! - [`engine`]: Engine API abstraction (`ContainerEngine` trait, `BollardEngine`)
//! - [`filter`]: Monitor/ignore scope resolution (`FilterSpec`, `resolve_scope`)
//! - [`image`]: Update detection (`ImageDescriptor`, `is_updated`)
//! - [`rebuild`]: Replacement container spec (`ContainerSpec`, `rebuild_spec`)
//! - [`lifecycle`]: Stop/remove/create/start transition (`LifecycleManager`)
//! - [`results`]: Per-host counters and replacement records (`ResultStore`)
//! - [`notify`]: Pass report delivery (`Notifier`, `LogNotifier`, `ChannelNotifier`)
//! - [`updater`]: Main orchestrator (`Updater`, `UpdaterBuilder`)
//!
//! # Architecture
//!
//! ```text
//! Updater.run_pass()
//!     |
//!     +--> ContainerEngine.list_running()
//!     +--> resolve_scope()
//!     +--> per container: inspect -> pull -> is_updated -> LifecycleManager.replace()
//!     |
//!     +--> ResultStore.merge() --> Notifier.notify(PassReport)
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod image;
pub mod lifecycle;
pub mod notify;
pub mod rebuild;
pub mod results;
pub mod types;
pub mod updater;

// --- Public API Re-exports ---

// Updater (main orchestrator)
pub use updater::{Updater, UpdaterBuilder};

// Configuration
pub use config::{UpdaterConfig, UpdaterConfigBuilder};

// Error
pub use error::{EngineStep, UpdaterError};

// Engine API
pub use engine::{BollardEngine, ContainerEngine, EngineEndpoint};

// Domain types
pub use filter::{FilterSpec, resolve_scope};
pub use image::{ImageDescriptor, is_updated};
pub use lifecycle::{LifecycleManager, LifecycleState, ReplacementOutcome, StepFailure};
pub use rebuild::{ContainerSpec, rebuild_spec};
pub use results::{HostCounters, PassReport, PassResult, ReplacementRecord, ResultStore};
pub use types::{ContainerSnapshot, PullCredentials};

// Notification
pub use notify::{ChannelNotifier, LogNotifier, Notifier};
