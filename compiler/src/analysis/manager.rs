//! Analysis result cache.
//!
//! Results of program-wide analyses are stored in an [`AnalysisManager`],
//! keyed by the [`Pass::ID`] of the pass that produced them. Consumers fetch
//! them back with the pass type, so the stored type is always the pass's
//! declared [`Pass::Result`].

use fxhash::FxHashMap;
use std::any::Any;

/// An analysis pass whose result can be cached.
pub trait Pass {
    /// Globally unique pass identifier
    const ID: &'static str;

    /// Type of the cached result
    type Result: Any + Send + Sync;
}

/// Cache of analysis results keyed by pass identity
#[derive(Default)]
pub struct AnalysisManager {
    results: FxHashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl AnalysisManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the result of pass `P`, replacing any previous one.
    pub fn put_pass_result<P: Pass>(&mut self, result: P::Result) {
        if self.results.insert(P::ID, Box::new(result)).is_some() {
            log::debug!("analysis manager: replaced result of {}", P::ID);
        }
    }

    /// Cached result of pass `P`, if any.
    pub fn get_pass_result<P: Pass>(&self) -> Option<&P::Result> {
        self.results.get(P::ID)?.downcast_ref::<P::Result>()
    }

    /// Cached result of pass `P`, computing and storing it first if missing.
    ///
    /// A failed computation stores nothing.
    pub fn get_or_compute<P, E, F>(&mut self, compute: F) -> Result<&P::Result, E>
    where
        P: Pass,
        F: FnOnce() -> Result<P::Result, E>,
    {
        if !self.results.contains_key(P::ID) {
            let result = compute()?;
            self.results.insert(P::ID, Box::new(result));
        }
        // Present and of type P::Result: inserted above or by put_pass_result::<P>
        match self.results.get(P::ID).and_then(|r| r.downcast_ref::<P::Result>()) {
            Some(result) => Ok(result),
            None => unreachable!("result of {} has the wrong type", P::ID),
        }
    }

    /// Drop the cached result of pass `P`. Returns whether one was present.
    pub fn invalidate<P: Pass>(&mut self) -> bool {
        self.results.remove(P::ID).is_some()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl std::fmt::Debug for AnalysisManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.results.keys().collect();
        ids.sort();
        f.debug_struct("AnalysisManager").field("passes", &ids).finish()
    }
}
