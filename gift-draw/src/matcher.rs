//! Randomized constrained permutation.
//!
//! Each pass walks the roster in order. Every giver gets a few uniform draws over the whole
//! roster to find an unclaimed recipient it is allowed to draw. One failed giver throws away
//! the whole pass and the search starts over from the first giver.
//!
//! With a dense exclusion set the restart loop may never finish. `MatchParams::max_restarts`
//! bounds it; the default is unbounded.

use crate::exclusion::ExclusionSet;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_DRAWS: usize = 4;

/// How often the unbounded search reports that it is still going.
const PROGRESS_EVERY: u64 = 10_000;

/// Source of uniform indices in `0..upper`.
pub trait DrawSource {
    fn draw(&mut self, upper: usize) -> usize;
}

impl<R: Rng> DrawSource for R {
    fn draw(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchParams {
    /// Draws allowed per giver before the pass is abandoned.
    pub max_draws: usize,
    /// `None` keeps restarting until a valid permutation turns up.
    pub max_restarts: Option<u64>,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            max_draws: DEFAULT_MAX_DRAWS,
            max_restarts: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("roster is empty")]
    EmptyRoster,
    #[error("max_draws must be at least 1")]
    NoDraws,
    #[error("no valid assignment after {restarts} restarts")]
    RestartLimit { restarts: u64 },
}

/// Final giver → recipient mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    picks: BTreeMap<String, String>,
}

impl Assignment {
    pub fn recipient_of(&self, giver: &str) -> Option<&str> {
        self.picks.get(giver).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.picks.iter().map(|(g, r)| (g.as_str(), r.as_str()))
    }
}

impl FromIterator<(String, String)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            picks: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    pub assignment: Assignment,
    pub restarts: u64,
}

/// Result of one giver's bounded draws.
#[derive(Debug, PartialEq, Eq)]
enum Draw {
    Committed(usize),
    Failed,
}

#[derive(Debug)]
enum RestartReason {
    DrawsExhausted { giver: usize },
    WildcardUnclaimed,
    WildcardCompression { picker: usize, recipient: usize },
}

enum Pass {
    Complete(Assignment),
    Restart(RestartReason),
}

pub struct Matcher<'a> {
    names: &'a [String],
    exclusions: &'a ExclusionSet,
    /// Index of the wildcard when single mode is on.
    wildcard: Option<usize>,
    params: MatchParams,
}

impl<'a> Matcher<'a> {
    pub fn new(names: &'a [String], exclusions: &'a ExclusionSet, params: MatchParams) -> Self {
        Self {
            names,
            exclusions,
            wildcard: None,
            params,
        }
    }

    /// Exempts `wildcard` from receiving: whoever drew it is handed the wildcard's own draw.
    /// Unknown names are ignored.
    pub fn with_wildcard(mut self, wildcard: &str) -> Self {
        self.wildcard = self.names.iter().position(|n| n == wildcard);
        self
    }

    fn allowed(&self, giver: usize, recipient: usize) -> bool {
        giver != recipient
            && !self
                .exclusions
                .is_excluded(&self.names[giver], &self.names[recipient])
    }

    /// Logs every giver that has nobody left to draw even before anyone is claimed.
    pub fn warn_infeasible(&self) -> usize {
        let mut stuck = 0;
        for giver in 0..self.names.len() {
            if Some(giver) == self.wildcard {
                continue;
            }
            let open = (0..self.names.len())
                .filter(|&r| Some(r) != self.wildcard && self.allowed(giver, r))
                .count();
            if open == 0 {
                warn!(
                    giver = %self.names[giver],
                    "no admissible recipient; the draw cannot finish"
                );
                stuck += 1;
            }
        }
        stuck
    }

    pub fn run<D: DrawSource + ?Sized>(&self, source: &mut D) -> Result<DrawOutcome, MatchError> {
        if self.names.is_empty() {
            return Err(MatchError::EmptyRoster);
        }
        if self.params.max_draws == 0 {
            return Err(MatchError::NoDraws);
        }

        let mut restarts = 0u64;
        loop {
            match self.pass(source) {
                Pass::Complete(assignment) => {
                    debug!(restarts, "assignment complete");
                    return Ok(DrawOutcome {
                        assignment,
                        restarts,
                    });
                }
                Pass::Restart(reason) => {
                    self.log_restart(&reason);
                    restarts += 1;
                    if let Some(limit) = self.params.max_restarts {
                        if restarts > limit {
                            return Err(MatchError::RestartLimit { restarts });
                        }
                    } else if restarts % PROGRESS_EVERY == 0 {
                        warn!(restarts, "still searching for a valid assignment");
                    }
                }
            }
        }
    }

    fn log_restart(&self, reason: &RestartReason) {
        match *reason {
            RestartReason::DrawsExhausted { giver } => {
                debug!(giver = %self.names[giver], "out of draws, trying again")
            }
            RestartReason::WildcardUnclaimed => {
                info!("nobody drew the wildcard yet, trying again")
            }
            RestartReason::WildcardCompression { picker, recipient } => info!(
                "bad wildcard compression: {} --> {}, trying again",
                self.names[picker], self.names[recipient]
            ),
        }
    }

    fn draw_for<D: DrawSource + ?Sized>(
        &self,
        giver: usize,
        claimed: &HashMap<usize, usize>,
        source: &mut D,
    ) -> Draw {
        for _ in 0..self.params.max_draws {
            let pick = source.draw(self.names.len());
            if !claimed.contains_key(&pick) && self.allowed(giver, pick) {
                return Draw::Committed(pick);
            }
        }
        Draw::Failed
    }

    fn pass<D: DrawSource + ?Sized>(&self, source: &mut D) -> Pass {
        // recipient -> giver
        let mut claimed: HashMap<usize, usize> = HashMap::with_capacity(self.names.len());
        let mut picks: BTreeMap<usize, usize> = BTreeMap::new();

        for giver in 0..self.names.len() {
            let pick = match self.draw_for(giver, &claimed, source) {
                Draw::Committed(pick) => pick,
                Draw::Failed => return Pass::Restart(RestartReason::DrawsExhausted { giver }),
            };

            if Some(giver) != self.wildcard {
                picks.insert(giver, pick);
                claimed.insert(pick, giver);
                continue;
            }

            // Whoever drew the wildcard takes the wildcard's recipient instead. The wildcard
            // stays claimed so nobody later draws it.
            let Some(&picker) = claimed.get(&giver) else {
                return Pass::Restart(RestartReason::WildcardUnclaimed);
            };
            if !self.allowed(picker, pick) {
                return Pass::Restart(RestartReason::WildcardCompression {
                    picker,
                    recipient: pick,
                });
            }
            info!(
                "compressing wildcard: {} --> {}",
                self.names[picker], self.names[pick]
            );
            picks.insert(picker, pick);
            claimed.insert(pick, picker);
        }

        Pass::Complete(
            picks
                .into_iter()
                .map(|(g, r)| (self.names[g].clone(), self.names[r].clone()))
                .collect(),
        )
    }
}
