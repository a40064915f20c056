//! Pipeline stages for turning camera captures into a stored PDF.
//!
//! Each submodule implements exactly one step and can be used on its own;
//! [`crate::scanner::Scanner`] strings them together.
//!
//! ## Data Flow
//!
//! ```text
//! capture ──▶ normalize ──▶ assemble ──▶ store
//! (camera)    (JPEG 800px)  (lopdf)      (storage root)
//! ```
//!
//! 1. [`capture`]   — camera permission, the ordered page sequence
//! 2. [`normalize`] — decode, downscale, re-encode as JPEG; CPU-bound
//! 3. [`assemble`]  — compose the titled, paginated PDF into a temp file;
//!    [`heading`] picks the title font and wraps long titles
//! 4. [`store`]     — resolve the file name, guard collisions, write durably,
//!    list stored documents

pub mod assemble;
pub mod capture;
pub mod heading;
pub mod normalize;
pub mod store;
