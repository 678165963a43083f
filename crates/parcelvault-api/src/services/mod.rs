pub mod access_policy;
pub mod document_resolver;
pub mod email;
pub mod release;
pub mod whatsapp;

pub use access_policy::{AccessPolicyEngine, OwnerParcels};
pub use document_resolver::{DocumentResolver, DocumentSource, ResolvedDocument, SourceKind};
pub use email::{EmailService, Mailer, OutgoingDocument};
pub use release::{DocumentInfo, ReleaseAction, ReleaseService, ReleasedDocument};
