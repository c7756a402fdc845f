/*!
 * Ordered fallback chains
 *
 * A chain tries its strategies in a fixed order, each at most once. A
 * strategy either succeeds (the chain stops), declines (the next one is
 * tried), or fails fatally (the chain stops without trying the rest).
 * Unavailable strategies are skipped without being attempted.
 */

use std::fmt;

/// Result of a single strategy attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The operation is done
    Succeeded,
    /// Could not do it; try the next strategy
    Declined(String),
    /// Stop the chain
    Fatal(String),
}

/// One way of performing an operation on `I`
pub trait Strategy<I: ?Sized> {
    /// Short name used in logs and outcomes
    fn name(&self) -> &'static str;

    /// Whether this strategy can run in the current environment
    fn is_available(&self) -> bool {
        true
    }

    fn attempt(&self, input: &I) -> Attempt;
}

/// What happened at one step of a chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRecord {
    Skipped,
    Declined(String),
    Succeeded,
    Fatal(String),
}

/// Per-step record of a chain run, in attempt order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainOutcome {
    pub steps: Vec<(&'static str, StepRecord)>,
}

impl ChainOutcome {
    pub fn succeeded(&self) -> bool {
        self.winner().is_some()
    }

    /// Name of the strategy that succeeded
    pub fn winner(&self) -> Option<&'static str> {
        self.steps
            .iter()
            .find(|(_, record)| *record == StepRecord::Succeeded)
            .map(|(name, _)| *name)
    }

    /// Reason of the fatal failure, if the chain was cut short
    pub fn fatal(&self) -> Option<&str> {
        self.steps.iter().find_map(|(_, record)| match record {
            StepRecord::Fatal(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    /// Names of the strategies that were actually attempted
    pub fn attempted(&self) -> Vec<&'static str> {
        self.steps
            .iter()
            .filter(|(_, record)| *record != StepRecord::Skipped)
            .map(|(name, _)| *name)
            .collect()
    }
}

impl fmt::Display for ChainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .steps
            .iter()
            .map(|(name, record)| match record {
                StepRecord::Skipped => format!("{}: unavailable", name),
                StepRecord::Declined(reason) => format!("{}: {}", name, reason),
                StepRecord::Succeeded => format!("{}: ok", name),
                StepRecord::Fatal(reason) => format!("{}: fatal: {}", name, reason),
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Boxed strategy usable from any thread
pub type BoxedStrategy<I> = Box<dyn Strategy<I> + Send + Sync>;

/// An ordered list of strategies
pub struct Chain<I: ?Sized> {
    strategies: Vec<BoxedStrategy<I>>,
}

impl<I: ?Sized> Default for Chain<I> {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }
}

impl<I: ?Sized> Chain<I> {
    pub fn new(strategies: Vec<BoxedStrategy<I>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy at the lowest precedence
    pub fn push(&mut self, strategy: BoxedStrategy<I>) {
        self.strategies.push(strategy);
    }

    /// Strategy names in precedence order
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each strategy once, in order
    pub fn run(&self, input: &I) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();

        for strategy in &self.strategies {
            let name = strategy.name();

            if !strategy.is_available() {
                tracing::debug!("{} unavailable, skipping", name);
                outcome.steps.push((name, StepRecord::Skipped));
                continue;
            }

            match strategy.attempt(input) {
                Attempt::Succeeded => {
                    tracing::debug!("{} succeeded", name);
                    outcome.steps.push((name, StepRecord::Succeeded));
                    break;
                }
                Attempt::Declined(reason) => {
                    tracing::debug!("{} declined: {}", name, reason);
                    outcome.steps.push((name, StepRecord::Declined(reason)));
                }
                Attempt::Fatal(reason) => {
                    tracing::debug!("{} failed fatally: {}", name, reason);
                    outcome.steps.push((name, StepRecord::Fatal(reason)));
                    break;
                }
            }
        }

        outcome
    }
}
