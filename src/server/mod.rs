//! Static site server used to host the pages under test.

mod static_files;

pub use static_files::{SiteState, StaticServer, router};
