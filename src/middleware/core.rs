use crate::dispatcher::HandlerRequest;
use crate::reply::{Reply, ReplyPayload};

/// One link of a route's middleware chain, executed in declaration order
/// before the handler.
///
/// `Ok(None)` continues the chain; `Ok(Some(payload))` short-circuits with an
/// early reply; `Err` aborts the chain and reaches the global error handler.
/// In the last two cases neither the remaining middlewares nor the handler
/// run.
pub trait Middleware: Send + Sync {
    fn call(&self, req: &HandlerRequest, reply: &Reply) -> anyhow::Result<Option<ReplyPayload>>;
}
