//! Scan aggregator
//!
//! Runs every applicable rule on every element of a snapshot and rolls the verdicts
//! up the tree. Elements are visited in post-order, so a parent's aggregate is built
//! from the already complete aggregates of its children.
//!
//! A rule that panics or returns an error is recorded as
//! [`EvaluationCode::Error`] for that element; the scan carries on. Panics are
//! caught with `catch_unwind`, so the process panic hook still runs for each of
//! them. Hosts that want quiet scans install their own hook with
//! [`std::panic::set_hook`]; every fault is also logged at `warn` level.

use crate::config::Config;
use crate::diagnostics::{merge_timings, Timing, TimingTable};
use crate::element::{Element, ElementId, ElementTree};
use crate::registry::RuleRegistry;
use crate::rule::{EvaluationCode, Rule};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag shared between a scan and its caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; scans stop before the next element
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Verdict of one rule on one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    pub element_id: ElementId,
    pub rule_id: String,
    pub code: EvaluationCode,
    /// Fault text for `Error` results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Number of results per evaluation code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts {
    counts: BTreeMap<EvaluationCode, usize>,
}

impl StatusCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, code: EvaluationCode) {
        *self.counts.entry(code).or_insert(0) += 1;
    }

    /// Add every count of `other` into this one
    pub fn merge(&mut self, other: &StatusCounts) {
        for (code, count) in &other.counts {
            *self.counts.entry(*code).or_insert(0) += count;
        }
    }

    pub fn get(&self, code: EvaluationCode) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Highest-priority code present, if any
    pub fn worst(&self) -> Option<EvaluationCode> {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(code, _)| *code)
            .max_by_key(|code| code.priority())
    }

    pub fn iter(&self) -> impl Iterator<Item = (EvaluationCode, usize)> + '_ {
        self.counts.iter().map(|(code, count)| (*code, *count))
    }
}

impl FromIterator<EvaluationCode> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = EvaluationCode>>(iter: I) -> Self {
        let mut counts = StatusCounts::new();
        for code in iter {
            counts.add(code);
        }
        counts
    }
}

/// Ordered (element, rule, code) triples of one scan.
///
/// Ordered by post-order element traversal, then registry order within an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    entries: Vec<RuleResult>,
}

impl ScanResult {
    pub fn entries(&self) -> &[RuleResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleResult> {
        self.entries.iter()
    }

    /// Results recorded for one element
    pub fn for_element(&self, id: ElementId) -> impl Iterator<Item = &RuleResult> {
        self.entries.iter().filter(move |r| r.element_id == id)
    }

    /// Results recorded by one rule
    pub fn for_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a RuleResult> {
        self.entries.iter().filter(move |r| r.rule_id == rule_id)
    }

    /// Lookup of a single (element, rule) verdict
    pub fn code(&self, id: ElementId, rule_id: &str) -> Option<EvaluationCode> {
        self.entries
            .iter()
            .find(|r| r.element_id == id && r.rule_id == rule_id)
            .map(|r| r.code)
    }

    pub fn count(&self, code: EvaluationCode) -> usize {
        self.entries.iter().filter(|r| r.code == code).count()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.entries.iter().map(|r| r.code).collect()
    }

    /// Elements with at least one `Fail`, in result order
    pub fn failing_elements(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = Vec::new();
        for result in &self.entries {
            if result.code == EvaluationCode::Fail && !ids.contains(&result.element_id) {
                ids.push(result.element_id);
            }
        }
        ids
    }

    fn extend(&mut self, results: Vec<RuleResult>) {
        self.entries.extend(results);
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Per (element, rule) verdicts
    pub results: ScanResult,

    /// Subtree totals, one per element whose whole subtree was evaluated
    pub aggregates: BTreeMap<ElementId, StatusCounts>,

    /// Root of the scanned snapshot
    pub root_id: Option<ElementId>,

    /// `false` when the scan was cancelled
    pub completed: bool,

    /// Elements whose rules were evaluated
    pub elements_scanned: usize,

    /// Processing duration
    pub duration: Duration,

    /// Per-rule timing statistics (empty unless enabled)
    pub rule_timings: TimingTable,
}

impl ScanReport {
    /// Root aggregate; `None` when the scan was cancelled before the root finished
    pub fn summary(&self) -> Option<&StatusCounts> {
        self.root_id.and_then(|id| self.aggregates.get(&id))
    }

    pub fn aggregate(&self, id: ElementId) -> Option<&StatusCounts> {
        self.aggregates.get(&id)
    }

    /// Check if any rule failed or faulted
    pub fn has_failures(&self) -> bool {
        self.results.count(EvaluationCode::Fail) > 0
            || self.results.count(EvaluationCode::Error) > 0
    }
}

/// Own results of one element
#[derive(Debug, Default)]
struct ElementOutcome {
    results: Vec<RuleResult>,
    timings: TimingTable,
}

impl ElementOutcome {
    fn push(&mut self, element: Element<'_>, rule: &Rule, verdict: Verdict) {
        let (code, message) = verdict;
        if code == EvaluationCode::Error {
            log::warn!(
                "Rule '{}' faulted on element {}: {}",
                rule.id,
                element,
                message.as_deref().unwrap_or("unknown error")
            );
        }

        self.results.push(RuleResult {
            element_id: element.id(),
            rule_id: rule.id.clone(),
            code,
            message,
        });
    }
}

/// Code plus fault text
type Verdict = (EvaluationCode, Option<String>);

/// Folds element outcomes, in post-order, into a report
struct Aggregator {
    subtree: Vec<Option<StatusCounts>>,
    report: ScanReport,
}

impl Aggregator {
    fn new(tree: &ElementTree) -> Self {
        Self {
            subtree: vec![None; tree.len()],
            report: ScanReport {
                root_id: (!tree.is_empty()).then(|| tree.root().id()),
                completed: true,
                ..ScanReport::default()
            },
        }
    }

    /// Add one element; all its children must have been pushed (or skipped) before
    fn push(&mut self, element: Element<'_>, outcome: ElementOutcome) {
        let mut counts: StatusCounts = outcome.results.iter().map(|r| r.code).collect();
        let mut complete = true;
        for child in element.children() {
            match &self.subtree[child.index()] {
                Some(child_counts) => counts.merge(child_counts),
                None => complete = false,
            }
        }

        self.report.results.extend(outcome.results);
        merge_timings(&mut self.report.rule_timings, &outcome.timings);
        self.report.elements_scanned += 1;

        if complete {
            self.report.aggregates.insert(element.id(), counts.clone());
            self.subtree[element.index()] = Some(counts);
        }
    }

    fn finish(mut self, completed: bool, duration: Duration) -> ScanReport {
        self.report.completed = completed;
        self.report.duration = duration;
        self.report
    }
}

/// Evaluates a registry over element trees
pub struct Scanner<'r> {
    registry: &'r RuleRegistry,
    config: Config,
}

impl Scanner<'static> {
    /// Scanner over the built-in rules with default configuration
    pub fn with_builtin_rules() -> Self {
        Scanner::new(RuleRegistry::global(), Config::default())
    }
}

impl<'r> Scanner<'r> {
    pub fn new(registry: &'r RuleRegistry, config: Config) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    /// Scan a whole tree.
    ///
    /// Panicking rules are contained, but the panic hook still reports each one
    /// (the default hook prints to stderr).
    pub fn scan(&self, tree: &ElementTree) -> ScanReport {
        self.scan_with_cancellation(tree, &CancellationToken::new())
    }

    /// Scan a tree, stopping early once `token` is cancelled.
    ///
    /// Results of elements evaluated before cancellation are kept. Aggregates are
    /// only reported for elements whose whole subtree was evaluated.
    pub fn scan_with_cancellation(
        &self,
        tree: &ElementTree,
        token: &CancellationToken,
    ) -> ScanReport {
        let start = Instant::now();

        let enabled = self
            .registry
            .iter()
            .filter(|entry| self.config.is_rule_enabled(&entry.rule.id))
            .count();

        log::debug!(
            "Scanning {} elements with {} of {} rules ({})",
            tree.len(),
            enabled,
            self.registry.len(),
            if self.config.engine.parallel {
                "parallel"
            } else {
                "sequential"
            }
        );

        let order = tree.post_order();
        let mut aggregator = Aggregator::new(tree);

        let pool = if self.config.engine.parallel {
            self.build_pool()
        } else {
            None
        };

        let completed = match pool {
            Some(pool) => {
                let outcomes: Vec<Option<ElementOutcome>> = pool.install(|| {
                    order
                        .par_iter()
                        .map(|element| {
                            if token.is_cancelled() {
                                None
                            } else {
                                Some(self.evaluate_element(*element))
                            }
                        })
                        .collect()
                });

                let mut completed = true;
                for (element, outcome) in order.iter().zip(outcomes) {
                    match outcome {
                        Some(outcome) => aggregator.push(*element, outcome),
                        None => completed = false,
                    }
                }
                completed
            }
            None => {
                let mut completed = true;
                for element in &order {
                    if token.is_cancelled() {
                        completed = false;
                        break;
                    }
                    let outcome = self.evaluate_element(*element);
                    aggregator.push(*element, outcome);
                }
                completed
            }
        };

        let report = aggregator.finish(completed, start.elapsed());

        if completed {
            log::debug!(
                "Scan finished in {:?}: {} results over {} elements",
                report.duration,
                report.results.len(),
                report.elements_scanned
            );
        } else {
            log::debug!(
                "Scan cancelled after {:?}: {} of {} elements evaluated",
                report.duration,
                report.elements_scanned,
                tree.len()
            );
        }

        report
    }

    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.engine.effective_jobs())
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("Failed to build thread pool, scanning sequentially: {}", e);
                None
            }
        }
    }

    /// Run every enabled, applicable rule on one element
    fn evaluate_element(&self, element: Element<'_>) -> ElementOutcome {
        let enabled = |rule: &Rule| self.config.is_rule_enabled(&rule.id);
        let mut outcome = ElementOutcome::default();

        let lookup = panic::catch_unwind(AssertUnwindSafe(|| {
            self.registry.rules_for_where(element, enabled)
        }));

        match lookup {
            Ok(rules) => {
                for rule in rules {
                    let verdict = self.evaluate_rule(rule, element, &mut outcome.timings);
                    outcome.push(element, rule, verdict);
                }
            }
            // An applicability condition panicked; check rule by rule to blame it
            Err(_) => {
                for entry in self.registry.iter().filter(|entry| enabled(entry.rule.as_ref())) {
                    let rule = entry.rule.as_ref();
                    let applies = panic::catch_unwind(AssertUnwindSafe(|| {
                        entry.applicability.matches(element)
                    }));
                    let verdict = match applies {
                        Ok(false) => continue,
                        Ok(true) => self.evaluate_rule(rule, element, &mut outcome.timings),
                        Err(payload) => (
                            EvaluationCode::Error,
                            Some(format!(
                                "applicability check panicked: {}",
                                panic_message(payload.as_ref())
                            )),
                        ),
                    };
                    outcome.push(element, rule, verdict);
                }
            }
        }

        outcome
    }

    fn evaluate_rule(
        &self,
        rule: &Rule,
        element: Element<'_>,
        timings: &mut TimingTable,
    ) -> Verdict {
        let track_time = self.config.diagnostics.rule_timings
            || self.config.diagnostics.slow_rule_threshold_ms > 0;
        let started = track_time.then(Instant::now);

        let verdict = evaluate_contained(rule, element);
        if let Some(started) = started {
            self.record_timing(timings, rule, element, started.elapsed(), verdict.0);
        }
        verdict
    }

    fn record_timing(
        &self,
        timings: &mut TimingTable,
        rule: &Rule,
        element: Element<'_>,
        elapsed: Duration,
        code: EvaluationCode,
    ) {
        let threshold = self.config.diagnostics.slow_rule_threshold_ms;
        if threshold > 0 && elapsed >= Duration::from_millis(threshold) {
            log::warn!(
                "Slow rule '{}' on element {}: {:?} (threshold {}ms)",
                rule.id,
                element,
                elapsed,
                threshold
            );
        }

        if self.config.diagnostics.rule_timings {
            timings
                .entry(rule.id.clone())
                .or_insert_with(|| Timing::new(&rule.id))
                .add(elapsed, code == EvaluationCode::Pass);
        }
    }
}

/// Evaluate one rule, turning errors and panics into `Error` verdicts
fn evaluate_contained(rule: &Rule, element: Element<'_>) -> Verdict {
    match panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(Some(element)))) {
        Ok(Ok(code)) => (code, None),
        Ok(Err(e)) => (EvaluationCode::Error, Some(e.to_string())),
        Err(payload) => (
            EvaluationCode::Error,
            Some(format!("rule panicked: {}", panic_message(payload.as_ref()))),
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
