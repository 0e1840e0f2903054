pub(crate) mod helpers;
pub(crate) mod list;
pub(crate) mod run;
