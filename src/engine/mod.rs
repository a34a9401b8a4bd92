//! Rule engine
//!
//! The pieces that turn one normalized word into phonetic codes:
//!
//! 1. **Language guesser** (`detect`) - narrows a variant's languages from spelling
//! 2. **Rule matcher** (`rule`) - first applicable context rule at a position
//! 3. **Branch resolver** (`branch`) - language-filtered alternation expansion
//! 4. **Cascade** (`cascade`) - main, common and final stages with candidate caps

pub mod branch;
pub mod cascade;
pub mod detect;
pub mod rule;


pub use branch::{Alternative, BranchPattern};
pub use cascade::{Cascade, WordEncoding};
pub use detect::{DetectionRule, LanguageDetectionTable};
pub use rule::{Rule, RuleTable, Step};
