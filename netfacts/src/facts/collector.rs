//! Runs category command sets against a command source.

use futures_util::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use super::registry::{CommandRegistry, CommandSet, extract};
use super::{FactCategory, FactReport};
use crate::session::CommandSource;

/// Merged facts of several categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    /// Top-level fact keys of every collected category.
    pub facts: Map<String, Value>,
    /// Warnings of every category, in collection order.
    pub warnings: Vec<String>,
    /// Categories that were collected.
    pub categories: Vec<FactCategory>,
}

impl Collection {
    /// Merge reports in the order given.
    pub fn from_reports(reports: impl IntoIterator<Item = FactReport>) -> Self {
        let mut collection = Self::default();
        for report in reports {
            collection.facts.extend(report.to_map());
            collection.warnings.extend(report.warnings);
            collection.categories.push(report.category);
        }
        collection
    }
}

/// Collects fact categories using a [`CommandRegistry`].
#[derive(Debug, Clone, Default)]
pub struct Collector {
    registry: CommandRegistry,
}

impl Collector {
    pub fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Fetch the command set of `category` from `source` and extract its
    /// facts. A category with no registered commands yields default facts
    /// and a warning.
    pub async fn collect<S: CommandSource>(&self, source: &mut S, category: FactCategory) -> FactReport {
        let Some(set) = self.registry.get(category) else {
            warn!("{}: no commands registered", category);
            let mut report = extract(category, &CommandSet::new(category), &[]);
            report
                .warnings
                .push(format!("No commands registered for category '{}'", category));
            return report;
        };

        let commands = set.commands();
        debug!("{}: running {} commands", category, commands.len());
        let results = source.fetch(&commands).await;
        let report = extract(category, set, &results);
        info!(
            "{}: collected with {} warnings",
            category,
            report.warnings.len()
        );
        report
    }

    /// Collect several categories concurrently, each with its own clone of
    /// `source`. The result keeps the order of `categories`.
    pub async fn collect_all<S>(&self, source: &S, categories: &[FactCategory]) -> Collection
    where
        S: CommandSource + Clone,
    {
        let pending = categories.iter().map(|&category| {
            let mut source = source.clone();
            async move { self.collect(&mut source, category).await }
        });
        Collection::from_reports(join_all(pending).await)
    }
}
