//! Host adapter abstraction.
//!
//! One pipeline, several hosts: each host turns a [`Reply`] into its own
//! response shape. Failures go through the same path, so every host emits its
//! 500 with the same machinery it uses for success.

use crate::error::ProxyResult;
use crate::pipeline::Reply;

/// Serializes pipeline output into a host's response shape.
pub trait HostAdapter: Sized {
    type Output;

    /// Emit a finished reply.
    fn reply(self, reply: Reply) -> Self::Output;

    /// Emit the pipeline result, mapping any failure to a 500 whose body is
    /// the error message.
    fn emit(self, result: ProxyResult<Reply>) -> Self::Output {
        match result {
            Ok(reply) => self.reply(reply),
            Err(e) => {
                tracing::error!(error = %e, "Request failed");
                self.reply(Reply::error(&e))
            }
        }
    }
}
