pub(crate) mod items;
pub(crate) mod message;
