//! Declarative reconciliation of local resource manifests with remote systems.
//!
//! Resources are parsed from YAML streams or evaluated templates, routed to
//! the [`Handler`] registered for their kind, and reconciled against the
//! remote through the [`Reconciler`]. Two long-running loops keep both sides
//! in step: [`SourceWatcher`] pushes local edits, [`listen::listen`] pulls
//! remote saves back into a local file.

pub mod config;
pub mod error;
pub mod handler;
pub mod listen;
pub mod logging;
pub mod notifier;
pub mod parser;
pub mod reconciler;
pub mod registry;
pub mod resource;
pub mod shutdown;
pub mod watch;

pub use config::{Config, LocalLock, ParseOptions, WatchOptions};
pub use error::{GrizzlyError, Result};
pub use handler::{
    Handler, ListenHandler, Preview, PreviewHandler, PreviewOpts, PushPayload, Subscription,
    SubscriptionEvent, UnsupportedPolicy,
};
pub use listen::{listen, ChannelSubscription};
pub use notifier::{LogNotifier, Notifier};
pub use parser::evaluator::{EvalRequest, Evaluator, JsonEvaluator};
pub use parser::native::NativeFunctions;
pub use parser::{parse, Parser, PathParser};
pub use reconciler::{ListEntry, Reconciler, ShowItem};
pub use registry::{parse_uid, validate_id, ParsedUid, Registry};
pub use resource::{Manifest, Resource, ResourceList};
pub use shutdown::ShutdownSignal;
pub use watch::SourceWatcher;
