//! The command dispatch table: maps a protocol command name to its
//! server-handler entry (a `get` responder, a `post` receiver, or both).
//! Built once at node construction and handed to [`crate::peers::Peers`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::peer::Peer;
use crate::types::Envelope;

/// A `get` handler: receives the command's parameters and returns the
/// response envelope the framework sends back.
pub type GetHandler = Arc<dyn Fn(Value) -> Envelope + Send + Sync>;

/// A `post` handler: receives the originating peer plus parameters and may
/// return `None` (no reply) or a response envelope.
pub type PostHandler = Arc<dyn Fn(Arc<Peer>, Value) -> Option<Envelope> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CommandEntry {
    pub get: Option<GetHandler>,
    pub post: Option<PostHandler>,
}

/// A name-keyed table of command handlers.
#[derive(Clone, Default)]
pub struct CommandTable(HashMap<String, CommandEntry>);

impl CommandTable {
    pub fn new() -> Self {
        CommandTable(HashMap::new())
    }

    pub fn on_get(&mut self, command: impl Into<String>, handler: impl Fn(Value) -> Envelope + Send + Sync + 'static) -> &mut Self {
        self.0.entry(command.into()).or_default().get = Some(Arc::new(handler));
        self
    }

    pub fn on_post(
        &mut self,
        command: impl Into<String>,
        handler: impl Fn(Arc<Peer>, Value) -> Option<Envelope> + Send + Sync + 'static,
    ) -> &mut Self {
        self.0.entry(command.into()).or_default().post = Some(Arc::new(handler));
        self
    }

    pub fn entry(&self, command: &str) -> Option<&CommandEntry> {
        self.0.get(command)
    }
}

/// Declaratively registers a batch of commands into a [`CommandTable`],
/// e.g.:
/// ```ignore
/// command_table!(table, {
///     "get_height" => get: |_params| Envelope::okay("get_height", json!({ "height": 0 })),
///     "post_block" => post: |_peer, params| None,
/// });
/// ```
#[macro_export]
macro_rules! command_table {
    ($table:expr, { $( $name:literal => $role:ident : $handler:expr ),+ $(,)? }) => {
        $(
            $crate::command_table!(@register $table, $name, $role, $handler);
        )+
    };
    (@register $table:expr, $name:literal, get, $handler:expr) => {
        $table.on_get($name, $handler);
    };
    (@register $table:expr, $name:literal, post, $handler:expr) => {
        $table.on_post($name, $handler);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn macro_registers_get_and_post_handlers() {
        let mut table = CommandTable::new();
        command_table!(table, {
            "get_height" => get: |_params: Value| Envelope::okay("get_height", json!({ "height": 3 })),
            "post_block" => post: |_peer: Arc<Peer>, _params: Value| None,
        });
        assert!(table.entry("get_height").unwrap().get.is_some());
        assert!(table.entry("post_block").unwrap().post.is_some());
        assert!(table.entry("missing").is_none());
    }
}
