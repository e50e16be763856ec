pub mod notified;
pub mod policy;
pub mod post;

pub use notified::{NotifiedEntry, NotifiedSet};
pub use policy::RecencyPolicy;
pub use post::RawPost;
