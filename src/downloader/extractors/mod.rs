// Extractor module - where metadata and raw streams come from
//
// The MediaSource trait is the seam; YtDlpSource drives the yt-dlp binary.
// Diagnostics only classify failures for the server log.

mod cli;
mod diagnostics;
mod traits;

pub use cli::YtDlpSource;
pub use diagnostics::{classify_failure, FailureCause};
pub use traits::{ExtractorConfig, MediaSource};
