//! # formcraft-registry
//!
//! The form collection and the publication registry.
//!
//! ## Modules
//!
//! - [`repository`] - `FormRepository`: create, update, delete, publish, and file storage
//! - [`publication`] - `PublicationRegistry`: form id to published id, and back

pub mod publication;
pub mod repository;

pub use publication::PublicationRegistry;
pub use repository::FormRepository;
