mod broadcaster;
mod event;
mod hub;

pub(crate) use event::SubmissionEvent;
pub(crate) use hub::{StreamHub, Subscription};
