pub(crate) mod correction;
pub(crate) mod pipeline;
pub(crate) mod streaming;
pub(crate) mod text;
