//! Arbor action replay.
//!
//! Runs a textual action script through the construction engine with the
//! reference builder and renders what ends up in the root slots.
//!
//! # Tracing
//!
//! - `RUST_LOG=arbor_construct=debug`: reductions and pool growth.
//! - `RUST_LOG=arbor_construct=trace`: every applied action.
//!
//! Pass `tree = true` to [`init_tracing`] for indented, span-nested output.

mod error;
mod script;

use std::path::Path;
use std::sync::Once;

use arbor_construct::reference::ArenaBuilder;
use arbor_construct::{ConstructConfig, Constructor};

pub use error::ReplayError;
pub use script::{Script, Step};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing once per process, and only when `RUST_LOG` is set.
pub fn init_tracing(tree: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let (flat, nested) = if tree {
                let layer = tracing_tree::HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true);
                (None, Some(layer))
            } else {
                let layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true);
                (Some(layer), None)
            };
            tracing_subscriber::registry()
                .with(flat)
                .with(nested)
                .with(filter)
                .init();
        }
    });
}

/// Read and parse a script file.
pub fn load(path: &Path) -> Result<Script, ReplayError> {
    let source = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Script::parse(&source)
}

/// Replay `script` and render every non-empty root slot, one per line, as
/// `slot N: tree`.
#[tracing::instrument(level = "debug", skip_all, fields(steps = script.steps.len()))]
pub fn replay(script: &Script) -> Result<String, ReplayError> {
    let config = match script.slot_count {
        Some(slot_count) => ConstructConfig::with_slot_count(slot_count),
        None => ConstructConfig::default(),
    };
    let builder = ArenaBuilder::new(script.table.clone());
    let mut constructor = Constructor::with_config(builder, 0, config);

    for step in &script.steps {
        let _line = tracing::trace_span!("line", number = step.line).entered();
        if let Some(text) = &step.token {
            constructor.builder_mut().push_token(text.clone());
        }
        constructor
            .apply(step.action)
            .map_err(|source| ReplayError::Action {
                line: step.line,
                source,
            })?;
    }

    let stats = constructor.stats();
    tracing::debug!(
        node_capacity = stats.nodes.capacity,
        expression_capacity = stats.expressions.capacity,
        "replay finished"
    );
    let (builder, slots) = constructor.finish()?;
    let lines: Vec<String> = slots
        .iter()
        .enumerate()
        .filter(|(_, head)| head.is_some())
        .map(|(slot, head)| format!("slot {slot}: {}", builder.render_chain(*head)))
        .collect();
    Ok(lines.join("\n"))
}
