//! Yearly gift-exchange draw.
//!
//! Every participant draws one other participant. Nobody draws themselves, a spouse or
//! family member, or anyone they drew in the last few years. Results are saved as
//! `<file_stem>_<YYYY>.txt` and read back in later years as history.

pub mod cli;
pub mod driver;
pub mod exclusion;
pub mod history;
pub mod matcher;
pub mod roster;
pub mod writer;

pub use driver::{DrawConfig, DrawError, DrawReport};
pub use exclusion::ExclusionSet;
pub use matcher::{Assignment, DrawOutcome, DrawSource, MatchError, MatchParams, Matcher};
pub use roster::{Participant, Roster, RosterError, StaticRule, Wildcard};
