//! Host-side state for one documentation build.
//!
//! The build environment hands out target serial numbers, tracks which
//! document owns each label, and keeps the registry of generated nodes so a
//! rebuilt or removed document can be purged.

use crate::config::Config;
use crate::error::DirectiveError;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static RE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\.\. _([^:`]+):\s*$").expect("regex for rst labels"));

/// Anchor placed in front of a generated fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
}

/// Markup produced from a generated line sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub rawsource: String,
    pub lines: Vec<String>,
    /// Explicit `.. _label:` targets declared inside the fragment.
    pub labels: Vec<String>,
    /// Source line the fragment is attributed to.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Target(Target),
    Fragment(Fragment),
}

/// Turns generated lines into a fragment owned by the host.
pub trait MarkupParser {
    fn nested_parse(
        &self,
        env: &mut BuildEnv,
        lines: &[String],
        offset: usize,
    ) -> Result<Fragment, DirectiveError>;
}

/// Minimal reStructuredText parser: keeps the lines and claims every explicit
/// target so labels stay unique across the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct RstParser;

impl MarkupParser for RstParser {
    fn nested_parse(
        &self,
        env: &mut BuildEnv,
        lines: &[String],
        offset: usize,
    ) -> Result<Fragment, DirectiveError> {
        let labels: Vec<String> = lines
            .iter()
            .filter_map(|line| RE_LABEL.captures(line))
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect();
        env.claim_labels(&labels)?;
        Ok(Fragment {
            rawsource: lines.join("\n"),
            lines: lines.to_vec(),
            labels,
            offset,
        })
    }
}

/// A generated fragment paired with its target, owned by one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredNode {
    pub docname: String,
    pub lineno: usize,
    pub target: Target,
    pub fragment: Fragment,
}

/// Registry of generated nodes, purged per document on rebuild.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Vec<RegisteredNode>,
}

impl NodeRegistry {
    pub fn add_node(&mut self, docname: &str, lineno: usize, target: Target, fragment: Fragment) {
        self.nodes.push(RegisteredNode {
            docname: docname.to_string(),
            lineno,
            target,
            fragment,
        });
    }

    /// Drop every node registered by `docname`, returning how many were removed.
    pub fn purge_doc(&mut self, docname: &str) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.docname != docname);
        before - self.nodes.len()
    }

    pub fn nodes_for<'a>(&'a self, docname: &'a str) -> impl Iterator<Item = &'a RegisteredNode> {
        self.nodes.iter().filter(move |node| node.docname == docname)
    }

    /// Keep the first `len` nodes, returning how many were dropped.
    fn truncate(&mut self, len: usize) -> usize {
        let dropped = self.nodes.len().saturating_sub(len);
        self.nodes.truncate(len);
        dropped
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Mutable state of one documentation build.
#[derive(Debug, Clone, Default)]
pub struct BuildEnv {
    pub config: Config,
    pub registry: NodeRegistry,
    docname: String,
    serials: BTreeMap<String, usize>,
    labels: BTreeMap<String, String>,
    /// Labels claimed in the current document, in claim order.
    claimed: Vec<String>,
    warnings: Vec<String>,
}

/// Registry and label state captured before a directive runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    nodes: usize,
    claimed: usize,
}

impl BuildEnv {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn docname(&self) -> &str {
        &self.docname
    }

    /// Start processing a document; serial numbers restart per document.
    pub fn begin_document(&mut self, docname: &str) {
        self.docname = docname.to_string();
        self.serials.clear();
        self.claimed.clear();
    }

    /// Next serial number for `category` within the current document.
    pub fn new_serialno(&mut self, category: &str) -> usize {
        let counter = self.serials.entry(category.to_string()).or_insert(0);
        let value = *counter;
        *counter += 1;
        value
    }

    /// Claim a label for the current document.
    pub fn claim_label(&mut self, label: &str) -> Result<(), DirectiveError> {
        self.claim_labels(&[label.to_string()])
    }

    /// Claim all of `labels` for the current document, or none of them.
    ///
    /// A label repeated within `labels` clashes with itself.
    pub fn claim_labels(&mut self, labels: &[String]) -> Result<(), DirectiveError> {
        let mut pending = BTreeSet::new();
        for label in labels {
            if let Some(owner) = self.labels.get(label) {
                return Err(DirectiveError::DuplicateTarget {
                    label: label.clone(),
                    docname: owner.clone(),
                });
            }
            if !pending.insert(label.as_str()) {
                return Err(DirectiveError::DuplicateTarget {
                    label: label.clone(),
                    docname: self.docname.clone(),
                });
            }
        }
        for label in labels {
            self.labels.insert(label.clone(), self.docname.clone());
            self.claimed.push(label.clone());
        }
        Ok(())
    }

    /// Mark the current registry and label state so a failed directive can be
    /// undone with [`BuildEnv::rollback`].
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.registry.len(),
            claimed: self.claimed.len(),
        }
    }

    /// Drop nodes registered and labels claimed since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let nodes = self.registry.truncate(checkpoint.nodes);
        let start = checkpoint.claimed.min(self.claimed.len());
        let released: Vec<String> = self.claimed.drain(start..).collect();
        for label in &released {
            self.labels.remove(label);
        }
        if nodes > 0 || !released.is_empty() {
            tracing::debug!(
                docname = %self.docname,
                nodes,
                labels = released.len(),
                "rolled back failed directive"
            );
        }
    }

    /// Forget everything `docname` contributed, ahead of a rebuild or removal.
    pub fn purge_document(&mut self, docname: &str) -> usize {
        self.labels.retain(|_, owner| owner != docname);
        let purged = self.registry.purge_doc(docname);
        if purged > 0 {
            tracing::debug!(docname, purged, "purged generated nodes");
        }
        purged
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(docname = %self.docname, "{message}");
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
