pub(crate) mod health;
pub(crate) mod store;
pub(crate) mod submissions;
pub(crate) mod usage;
