pub mod documents;
pub mod profile;
pub mod store;

pub use documents::{IndexDocument, build_documents, chunk_text};
pub use profile::{ProfileError, TenantProfile};
pub use store::{QdrantStore, Snippet};
