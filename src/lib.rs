pub mod channel;
pub mod commit;
mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod logging;
pub mod navigation;
pub mod overlay;
pub mod path;
pub mod session;
pub mod state;
pub use config::EditorConfig;
pub use error::{VisualEditorError, VisualEditorResult};
pub use session::{PointerSample, VisualEditor};

use std::rc::Rc;

use channel::{ChannelRegistry, MessageTarget};
use dom::Page;
use futures::task::LocalSpawn;

/// Entrypoint used by the page bootstrap script.
///
/// `host` is the parent or opener window when the page runs inside the
/// editor; `options` is the raw JSON the embedder was configured with.
pub fn start(
    page: Rc<dyn Page>,
    host: Option<&Rc<dyn MessageTarget>>,
    spawner: Rc<dyn LocalSpawn>,
    options: &str,
) -> VisualEditor {
    logging::init();
    let config = EditorConfig::from_json(options);
    tracing::info!("starting visual builder");

    let channel = ChannelRegistry::global().acquire(&config.channel_id, host);
    if channel.is_none() {
        tracing::info!("no host window reachable; editing disabled");
    }
    VisualEditor::new(page, channel, spawner, config)
}
