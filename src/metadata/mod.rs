/*!
 * File metadata capture and reapplication
 *
 * A [`MetadataSnapshot`] is taken before a transfer and written back onto
 * the destination afterwards.
 */

mod apply;
mod capture;
mod snapshot;
pub mod windows;

pub use apply::{apply_file_metadata, apply_with_report};
pub use capture::collect_file_metadata;
pub use snapshot::{ApplyReport, FieldOutcome, MetadataSnapshot, PlatformExtra, Timestamps};
