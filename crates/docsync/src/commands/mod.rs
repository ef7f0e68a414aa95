//! CLI command implementations.

pub(crate) mod nav;
pub(crate) mod publish;

pub(crate) use nav::NavArgs;
pub(crate) use publish::PublishArgs;
