// Resume analysis API: the per-request pipeline and its HTTP handlers.
// Handlers own input cleaning and capping; the pipeline only ever sees prepared text.

pub mod handlers;
pub mod pipeline;
