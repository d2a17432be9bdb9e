// Interview definitions: the recruiter-authored job + question package shared with candidates.

pub mod handlers;
pub mod store;
