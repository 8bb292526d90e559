//! Detection collaborators for Socio.
//!
//! Both implementations only produce raw signals; the policy resolvers
//! decide what to do with them.
//!
//! - [`LexiconDetector`]: word lists and regular expressions, no network
//! - [`GoogleVisionAnalyzer`]: Google Cloud Vision `images:annotate`

pub mod google_vision;
pub mod lexicon;

pub use google_vision::GoogleVisionAnalyzer;
pub use lexicon::LexiconDetector;
